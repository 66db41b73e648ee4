//! The Convertorio API client.
//!
//! One [`ConvertorioClient`] owns an immutable [`ClientConfig`], a
//! [`Transport`] and a per-client event registry. Conversions run
//! through [`ConvertorioClient::convert`] (see [`crate::convert`]); the
//! simple request/response endpoints (account, job lookup, job listing)
//! live here because they have no state machine of their own.
//!
//! The client is `Send + Sync`; concurrent conversions through a shared
//! client are independent apart from the shared event handlers.

use crate::api::{Account, AccountResponse, Job, JobListResponse, JobResponse, JobStatus};
use crate::config::ClientConfig;
use crate::error::{ConvertorioError, Step};
use crate::event::{Event, EventBus, EventKind};
use crate::transport::{HttpTransport, Transport};
use serde_json::from_value;
use std::sync::Arc;
use tracing::debug;

/// Client for the Convertorio image-conversion API.
///
/// # Example
/// ```rust,no_run
/// use convertorio::{ClientConfig, ConvertorioClient, ConversionRequest, Event, EventKind};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder()
///     .api_key(std::env::var("CONVERTORIO_API_KEY")?)
///     .build()?;
/// let client = ConvertorioClient::new(config)?;
///
/// client.on(EventKind::Status, |event| {
///     if let Event::Status { attempt, max_attempts, status, .. } = event {
///         eprintln!("poll {attempt}/{max_attempts}: {status}");
///     }
/// });
///
/// let result = client
///     .convert(&ConversionRequest::new("photo.png", "webp"))
///     .await?;
/// println!("written: {}", result.output_path.display());
/// # Ok(())
/// # }
/// ```
pub struct ConvertorioClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    events: EventBus,
}

impl ConvertorioClient {
    /// Build a client over the production HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self, ConvertorioError> {
        let transport = HttpTransport::new(
            &config.api_key,
            &config.base_url,
            config.connect_timeout,
            config.timeout,
        )
        .map_err(|e| ConvertorioError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over a caller-supplied transport.
    ///
    /// This is the seam the integration tests use to script server
    /// behaviour; it also admits middleware transports (caching,
    /// request capture) without touching the orchestration logic.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        ConvertorioClient {
            config,
            transport,
            events: EventBus::new(),
        }
    }

    /// Register `handler` for one event kind, replacing any previous
    /// handler for that kind. Handlers run synchronously on the task
    /// driving the conversion; see [`crate::event`] for the semantics.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(kind, handler);
    }

    // ── Simple endpoints ─────────────────────────────────────────────────

    /// Fetch a single job snapshot.
    pub async fn get_job(&self, job_id: &str) -> Result<Job, ConvertorioError> {
        let body = self
            .transport
            .get_json(&format!("/v1/jobs/{job_id}"))
            .await
            .map_err(|e| ConvertorioError::from_transport(Step::JobStatus, e))?;
        let response: JobResponse = from_value(body).map_err(|e| ConvertorioError::Api {
            step: Step::JobStatus,
            message: format!("malformed job response: {e}"),
        })?;
        response.into_job()
    }

    /// Fetch account details and usage counters.
    pub async fn get_account(&self) -> Result<Account, ConvertorioError> {
        let body = self
            .transport
            .get_json("/v1/account")
            .await
            .map_err(|e| ConvertorioError::from_transport(Step::Account, e))?;
        let response: AccountResponse = from_value(body).map_err(|e| ConvertorioError::Api {
            step: Step::Account,
            message: format!("malformed account response: {e}"),
        })?;
        crate::api::check_success(
            Step::Account,
            response.success,
            response.error,
            "Failed to get account info",
        )?;
        response.account.ok_or_else(|| ConvertorioError::Api {
            step: Step::Account,
            message: "account response is missing the account object".into(),
        })
    }

    /// List past and in-flight jobs, newest first.
    pub async fn list_jobs(&self, query: &ListJobsQuery) -> Result<Vec<Job>, ConvertorioError> {
        let path = query.to_path();
        debug!("listing jobs: {}", path);
        let body = self
            .transport
            .get_json(&path)
            .await
            .map_err(|e| ConvertorioError::from_transport(Step::ListJobs, e))?;
        let response: JobListResponse = from_value(body).map_err(|e| ConvertorioError::Api {
            step: Step::ListJobs,
            message: format!("malformed jobs response: {e}"),
        })?;
        crate::api::check_success(
            Step::ListJobs,
            response.success,
            response.error,
            "Failed to list jobs",
        )?;
        Ok(response.jobs)
    }

    // ── Internal accessors used by the orchestrator and poller ───────────

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Pagination and filtering for [`ConvertorioClient::list_jobs`].
#[derive(Debug, Clone, Default)]
pub struct ListJobsQuery {
    /// Page size; server default when `None` (50).
    pub limit: Option<u32>,
    /// Pagination offset; server default when `None` (0).
    pub offset: Option<u32>,
    /// Only return jobs in this status.
    pub status: Option<JobStatus>,
}

impl ListJobsQuery {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn to_path(&self) -> String {
        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(format!("limit={limit}"));
        }
        if let Some(offset) = self.offset {
            params.push(format!("offset={offset}"));
        }
        if let Some(status) = &self.status {
            params.push(format!("status={status}"));
        }
        if params.is_empty() {
            "/v1/jobs".to_string()
        } else {
            format!("/v1/jobs?{}", params.join("&"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_jobs_query_paths() {
        assert_eq!(ListJobsQuery::default().to_path(), "/v1/jobs");
        assert_eq!(
            ListJobsQuery::default().limit(10).offset(20).to_path(),
            "/v1/jobs?limit=10&offset=20"
        );
        assert_eq!(
            ListJobsQuery::default()
                .status(JobStatus::Completed)
                .to_path(),
            "/v1/jobs?status=completed"
        );
    }
}
