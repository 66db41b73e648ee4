//! Wire types for the Convertorio API.
//!
//! Field names mirror the JSON the server sends (`snake_case`). Every
//! endpoint wraps its payload in an envelope carrying `success: bool`;
//! when `success` is false the envelope's `error` string is the
//! authoritative failure signal regardless of HTTP status.

use crate::error::{ConvertorioError, Step};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a server-side conversion job.
///
/// The server may grow new in-progress states at any time; anything the
/// client does not recognise deserialises as [`JobStatus::Other`] and is
/// treated as "still running" by the poller. Only `completed`, `failed`
/// and `expired` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Expired,
    /// An unrecognised, non-terminal status.
    Other(String),
}

impl JobStatus {
    /// True if no further status transition will occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Expired
        )
    }

    /// The raw status string as the server reports it.
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Expired => "expired",
            JobStatus::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "expired" => JobStatus::Expired,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(s: JobStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read-only snapshot of a server-side conversion job.
///
/// The client never mutates a job; it re-fetches a fresh snapshot on
/// every poll. `download_url` is populated only once the job is
/// `completed`; `error_message` only once it is `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub source_format: Option<String>,
    #[serde(default)]
    pub target_format: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    // Timestamps are passed through as the server's ISO-8601 strings;
    // the SDK never interprets them.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Account details from GET `/v1/account`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub daily_conversions_remaining: Option<i64>,
    #[serde(default)]
    pub total_conversions: Option<i64>,
}

// ── Response envelopes ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct UploadUrlResponse {
    pub success: bool,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadUrlResponse {
    /// Unwrap into `(job_id, upload_url)` or the protocol error.
    pub fn into_parts(self) -> Result<(String, String), ConvertorioError> {
        check_success(Step::UploadUrl, self.success, self.error, "Failed to get upload URL")?;
        match (self.job_id, self.upload_url) {
            (Some(job_id), Some(upload_url)) => Ok((job_id, upload_url)),
            _ => Err(ConvertorioError::Api {
                step: Step::UploadUrl,
                message: "upload-url response is missing job_id or upload_url".into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmResponse {
    pub success: bool,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobResponse {
    pub success: bool,
    #[serde(default)]
    pub job: Option<Job>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobResponse {
    pub fn into_job(self) -> Result<Job, ConvertorioError> {
        check_success(Step::JobStatus, self.success, self.error, "Failed to get job status")?;
        self.job.ok_or_else(|| ConvertorioError::Api {
            step: Step::JobStatus,
            message: "job response is missing the job object".into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobListResponse {
    pub success: bool,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountResponse {
    pub success: bool,
    #[serde(default)]
    pub account: Option<Account>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Map a `success: false` envelope to a protocol error, preferring the
/// server's `error` string over the generic per-step fallback.
pub(crate) fn check_success(
    step: Step,
    success: bool,
    error: Option<String>,
    fallback: &str,
) -> Result<(), ConvertorioError> {
    if success {
        return Ok(());
    }
    Err(ConvertorioError::Api {
        step,
        message: error.unwrap_or_else(|| fallback.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_and_unknown_values() {
        assert_eq!(JobStatus::from("queued".to_string()), JobStatus::Queued);
        assert_eq!(JobStatus::from("expired".to_string()), JobStatus::Expired);
        let other = JobStatus::from("optimizing".to_string());
        assert_eq!(other, JobStatus::Other("optimizing".into()));
        assert!(!other.is_terminal());
        assert_eq!(other.as_str(), "optimizing");
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Expired.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn job_deserialises_minimal_body() {
        let job: Job = serde_json::from_str(r#"{"id":"j1","status":"processing"}"#).unwrap();
        assert_eq!(job.id, "j1");
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.download_url.is_none());
        assert!(job.error_message.is_none());
    }

    #[test]
    fn upload_url_failure_prefers_server_message() {
        let resp: UploadUrlResponse =
            serde_json::from_str(r#"{"success":false,"error":"unsupported format"}"#).unwrap();
        let err = resp.into_parts().unwrap_err();
        assert_eq!(err.to_string(), "unsupported format");
    }

    #[test]
    fn upload_url_failure_without_message_uses_fallback() {
        let resp: UploadUrlResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        let err = resp.into_parts().unwrap_err();
        assert_eq!(err.to_string(), "Failed to get upload URL");
    }

    #[test]
    fn confirm_response_carries_initial_status() {
        let resp: ConfirmResponse =
            serde_json::from_str(r#"{"success":true,"status":"queued"}"#).unwrap();
        assert_eq!(resp.status, Some(JobStatus::Queued));
    }
}
