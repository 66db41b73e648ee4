//! Error types for the convertorio SDK.
//!
//! One enum, four families, matching how failures actually behave:
//!
//! * **Configuration** — missing API key, missing request fields, missing
//!   local input file. Detected before any network call and never retried.
//!   These do *not* pass through the `error` event: the workflow has not
//!   started, so there is nothing for an observer to tear down.
//!
//! * **Protocol** — the server answered HTTP 2xx but set `success: false`
//!   in the JSON envelope. The server's `error` string is authoritative
//!   and supersedes the HTTP status.
//!
//! * **Transport** — non-2xx status or a network/IO failure mid-call.
//!   Wrapped with the [`Step`] it happened in so a log line alone is
//!   enough to diagnose which of the five workflow calls broke.
//!
//! * **Job lifecycle** — the job itself reached `failed` or `expired`, or
//!   the polling budget ran out. Each carries a distinct user-facing
//!   message.
//!
//! All families except configuration are reported through the `error`
//! event before propagating to the caller.

use crate::transport::TransportError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which workflow call an error belongs to.
///
/// Display strings match the endpoint names used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// POST `/v1/convert/upload-url`
    UploadUrl,
    /// PUT to the server-supplied object-storage URL
    Upload,
    /// POST `/v1/convert/confirm`
    Confirm,
    /// GET `/v1/jobs/{id}` during polling
    JobStatus,
    /// GET of the job's `download_url`
    Download,
    /// GET `/v1/account`
    Account,
    /// GET `/v1/jobs`
    ListJobs,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::UploadUrl => "upload-url",
            Step::Upload => "upload",
            Step::Confirm => "confirm",
            Step::JobStatus => "job-status",
            Step::Download => "download",
            Step::Account => "account",
            Step::ListJobs => "list-jobs",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors returned by the convertorio SDK.
#[derive(Debug, Error)]
pub enum ConvertorioError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key was supplied at construction time.
    #[error("API key is required. Get yours at https://convertorio.com/account")]
    MissingApiKey,

    /// The conversion request has an empty input path.
    #[error("input path is required")]
    MissingInputPath,

    /// The conversion request has an empty target format.
    #[error("target format is required")]
    MissingTargetFormat,

    /// The input path does not refer to an existing local file.
    #[error("input file not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Protocol errors ───────────────────────────────────────────────────
    /// The server reported `success: false` for a step.
    ///
    /// `message` is the server's `error` field when present, otherwise a
    /// generic per-step fallback.
    #[error("{message}")]
    Api { step: Step, message: String },

    // ── Transport errors ──────────────────────────────────────────────────
    /// A call returned a non-2xx HTTP status.
    #[error("{step} failed with HTTP {status}: {body}")]
    Http { step: Step, status: u16, body: String },

    /// The request never completed (connect, timeout, body read, decode).
    #[error("{step} request failed: {source}")]
    Request {
        step: Step,
        #[source]
        source: reqwest::Error,
    },

    // ── Job lifecycle errors ──────────────────────────────────────────────
    /// The job reached the `failed` terminal status.
    #[error("{message}")]
    JobFailed { message: String },

    /// The job reached the `expired` terminal status.
    #[error("Job expired")]
    JobExpired,

    /// The polling budget ran out before the job reached a terminal status.
    #[error("Conversion timeout - job did not complete in time")]
    PollTimeout { attempts: u32 },

    // ── Local I/O errors ──────────────────────────────────────────────────
    /// Could not read the input file for upload.
    #[error("failed to read input file '{path}': {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the downloaded output file.
    #[error("failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertorioError {
    /// True for errors detected locally before the workflow starts.
    ///
    /// These never trigger the `error` event and are never preceded by a
    /// network call.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ConvertorioError::MissingApiKey
                | ConvertorioError::MissingInputPath
                | ConvertorioError::MissingTargetFormat
                | ConvertorioError::InputNotFound { .. }
                | ConvertorioError::InvalidConfig(_)
        )
    }

    /// Attach step context to a raw transport failure.
    pub(crate) fn from_transport(step: Step, err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body } => {
                ConvertorioError::Http { step, status, body }
            }
            TransportError::Request(source) => ConvertorioError::Request { step, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_display_matches_endpoint_names() {
        assert_eq!(Step::UploadUrl.to_string(), "upload-url");
        assert_eq!(Step::Download.to_string(), "download");
    }

    #[test]
    fn api_error_surfaces_server_message_verbatim() {
        let e = ConvertorioError::Api {
            step: Step::Confirm,
            message: "upload was never completed".into(),
        };
        assert_eq!(e.to_string(), "upload was never completed");
    }

    #[test]
    fn http_error_names_step_and_status() {
        let e = ConvertorioError::Http {
            step: Step::Upload,
            status: 403,
            body: "Forbidden".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("upload"), "got: {msg}");
        assert!(msg.contains("403"), "got: {msg}");
    }

    #[test]
    fn config_error_classification() {
        assert!(ConvertorioError::MissingApiKey.is_config_error());
        assert!(ConvertorioError::MissingInputPath.is_config_error());
        assert!(!ConvertorioError::JobExpired.is_config_error());
        assert!(!ConvertorioError::PollTimeout { attempts: 60 }.is_config_error());
    }
}
