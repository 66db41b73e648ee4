//! The conversion orchestrator: one file in, one converted file out.
//!
//! A conversion is a five-call protocol against the API, sequenced
//! strictly and failed fast — no step runs after a prior one fails, and
//! there is no resumption from an intermediate step:
//!
//! ```text
//! convert(request)
//!  │
//!  ├─ 1. validate     local checks, no events, no network
//!  ├─ 2. upload-url   POST /v1/convert/upload-url → job_id + presigned URL
//!  ├─ 3. upload       PUT file bytes to object storage
//!  ├─ 4. confirm      POST /v1/convert/confirm → conversion queued
//!  ├─ 5. poll         GET /v1/jobs/{id} until terminal  (src/poll.rs)
//!  └─ 6. download     GET download_url → write output file
//! ```
//!
//! Each step announces itself through the event bus before running, and
//! any failure in steps 2–6 emits one `error` event before propagating.
//! Validation failures skip the event channel entirely: the workflow
//! never started.
//!
//! The downloaded artifact is buffered fully in memory and written in
//! one `fs::write`, so a failed download leaves no output file behind —
//! partial-file cleanup is a non-problem by construction.

use crate::api::{ConfirmResponse, JobStatus, UploadUrlResponse};
use crate::client::ConvertorioClient;
use crate::error::{ConvertorioError, Step};
use crate::event::{Event, ProgressStep};
use crate::output::ConversionResult;
use crate::poll::JobPoller;
use futures::stream::{self, StreamExt};
use serde_json::{json, Map, Value};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for one conversion. Immutable once handed to
/// [`ConvertorioClient::convert`]; caller-owned.
///
/// # Example
/// ```rust
/// use convertorio::ConversionRequest;
///
/// let request = ConversionRequest::new("photo.png", "webp")
///     .output_path("out/photo.webp")
///     .option("quality", 85);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    /// Path to the local input file.
    pub input_path: PathBuf,
    /// Target format, e.g. `"jpg"`, `"webp"`, `"avif"`. Case-insensitive.
    pub target_format: String,
    /// Where to write the converted file. Defaults to the input's
    /// directory and base name with the target format as extension.
    pub output_path: Option<PathBuf>,
    /// Free-form conversion options passed to the server verbatim.
    /// Known keys include `quality` (1–100, for JPG/WebP/AVIF),
    /// `aspect_ratio`, `crop_strategy`, and `icon_size` (for ICO).
    pub conversion_metadata: Option<Map<String, Value>>,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, target_format: impl Into<String>) -> Self {
        ConversionRequest {
            input_path: input_path.into(),
            target_format: target_format.into(),
            output_path: None,
            conversion_metadata: None,
        }
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Replace the whole conversion-metadata map.
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.conversion_metadata = Some(metadata);
        self
    }

    /// Set a single conversion-metadata option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conversion_metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Validated local facts about the input, gathered before any event or
/// network call.
struct ValidatedInput {
    file_name: String,
    source_format: String,
    file_size: u64,
}

impl ConvertorioClient {
    /// Run one conversion end-to-end and report the outcome.
    ///
    /// Emits `start`, five `progress` events, zero or more `status`
    /// events, and either `complete` or `error` — see [`crate::event`].
    ///
    /// # Errors
    /// Configuration errors (empty input path or target format, missing
    /// local file) are returned before the workflow starts and without
    /// any event. Everything else — protocol, transport, job lifecycle,
    /// output I/O — emits one `error` event and then propagates.
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConvertorioError> {
        let input = self.validate(request).await?;
        info!(
            "converting {} ({} → {})",
            input.file_name, input.source_format, request.target_format
        );

        self.events().emit(&Event::Start {
            file_name: input.file_name.clone(),
            source_format: input.source_format.clone(),
            target_format: request.target_format.clone(),
            file_size: input.file_size,
        });

        match self.run_workflow(request, &input).await {
            Ok(result) => {
                self.events().emit(&Event::Complete(result.clone()));
                Ok(result)
            }
            Err(err) => {
                self.events().emit(&Event::Error {
                    message: err.to_string(),
                    input_path: request.input_path.clone(),
                    target_format: request.target_format.clone(),
                });
                Err(err)
            }
        }
    }

    /// Run several independent conversions with bounded concurrency.
    ///
    /// Results are returned in request order. Conversions share this
    /// client's event handlers; use the `job_id` in event payloads to
    /// tell them apart.
    pub async fn convert_all(
        &self,
        requests: &[ConversionRequest],
        concurrency: usize,
    ) -> Vec<Result<ConversionResult, ConvertorioError>> {
        stream::iter(requests.iter().map(|request| self.convert(request)))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn validate(
        &self,
        request: &ConversionRequest,
    ) -> Result<ValidatedInput, ConvertorioError> {
        if request.input_path.as_os_str().is_empty() {
            return Err(ConvertorioError::MissingInputPath);
        }
        if request.target_format.trim().is_empty() {
            return Err(ConvertorioError::MissingTargetFormat);
        }

        let metadata = tokio::fs::metadata(&request.input_path)
            .await
            .map_err(|_| ConvertorioError::InputNotFound {
                path: request.input_path.clone(),
            })?;
        if !metadata.is_file() {
            return Err(ConvertorioError::InputNotFound {
                path: request.input_path.clone(),
            });
        }

        let file_name = request
            .input_path
            .file_name()
            .unwrap_or_else(|| OsStr::new(""))
            .to_string_lossy()
            .into_owned();

        Ok(ValidatedInput {
            file_name,
            source_format: source_format(&request.input_path),
            file_size: metadata.len(),
        })
    }

    async fn run_workflow(
        &self,
        request: &ConversionRequest,
        input: &ValidatedInput,
    ) -> Result<ConversionResult, ConvertorioError> {
        let target_format = request.target_format.to_lowercase();

        // ── Step 2: request an upload slot ───────────────────────────────
        self.events().emit(&Event::Progress {
            step: ProgressStep::RequestingUploadUrl,
            job_id: None,
            status: None,
        });

        let mut body = json!({
            "filename": input.file_name,
            "source_format": input.source_format,
            "target_format": target_format,
            "file_size": input.file_size,
        });
        if let Some(metadata) = &request.conversion_metadata {
            if !metadata.is_empty() {
                body["conversion_metadata"] = Value::Object(metadata.clone());
            }
        }

        let response = self
            .transport()
            .post_json("/v1/convert/upload-url", body)
            .await
            .map_err(|e| ConvertorioError::from_transport(Step::UploadUrl, e))?;
        let response: UploadUrlResponse = decode(Step::UploadUrl, response)?;
        let (job_id, upload_url) = response.into_parts()?;
        debug!("job {} assigned, uploading to object storage", job_id);

        // ── Step 3: upload the file ──────────────────────────────────────
        self.events().emit(&Event::Progress {
            step: ProgressStep::Uploading,
            job_id: Some(job_id.clone()),
            status: None,
        });

        let bytes = tokio::fs::read(&request.input_path).await.map_err(|e| {
            ConvertorioError::InputRead {
                path: request.input_path.clone(),
                source: e,
            }
        })?;
        self.transport()
            .put_bytes(
                &upload_url,
                bytes,
                &format!("image/{}", input.source_format),
            )
            .await
            .map_err(|e| ConvertorioError::from_transport(Step::Upload, e))?;

        // ── Step 4: confirm and queue the conversion ─────────────────────
        self.events().emit(&Event::Progress {
            step: ProgressStep::Confirming,
            job_id: Some(job_id.clone()),
            status: None,
        });

        let response = self
            .transport()
            .post_json("/v1/convert/confirm", json!({ "job_id": job_id }))
            .await
            .map_err(|e| ConvertorioError::from_transport(Step::Confirm, e))?;
        let confirm: ConfirmResponse = decode(Step::Confirm, response)?;
        crate::api::check_success(
            Step::Confirm,
            confirm.success,
            confirm.error,
            "Failed to confirm upload",
        )?;

        // ── Step 5: poll until terminal ──────────────────────────────────
        self.events().emit(&Event::Progress {
            step: ProgressStep::Converting,
            job_id: Some(job_id.clone()),
            status: Some(confirm.status.unwrap_or(JobStatus::Queued)),
        });

        let poller = JobPoller {
            transport: self.transport(),
            events: self.events(),
            max_attempts: self.config().max_attempts,
            interval: self.config().poll_interval,
        };
        let job = poller.poll(&job_id).await?;

        // ── Step 6: download the artifact ────────────────────────────────
        self.events().emit(&Event::Progress {
            step: ProgressStep::Downloading,
            job_id: Some(job_id.clone()),
            status: None,
        });

        let download_url = job.download_url.clone().ok_or_else(|| ConvertorioError::Api {
            step: Step::Download,
            message: "completed job is missing a download URL".into(),
        })?;
        let artifact = self
            .transport()
            .get_bytes(&download_url)
            .await
            .map_err(|e| ConvertorioError::from_transport(Step::Download, e))?;

        let output_path = request
            .output_path
            .clone()
            .unwrap_or_else(|| default_output_path(&request.input_path, &target_format));
        write_output(&output_path, &artifact).await?;

        let file_size = tokio::fs::metadata(&output_path)
            .await
            .map(|m| m.len())
            .unwrap_or(artifact.len() as u64);
        info!(
            "job {} complete: {} bytes written to '{}'",
            job_id,
            file_size,
            output_path.display()
        );

        // ── Step 7: assemble the result ──────────────────────────────────
        Ok(ConversionResult {
            success: true,
            job_id,
            input_path: request.input_path.clone(),
            output_path,
            source_format: input.source_format.clone(),
            target_format,
            file_size,
            processing_time_ms: job.processing_time_ms,
            download_url,
            tokens_used: job.tokens_used,
        })
    }
}

/// Lower-cased extension of the input file; empty if it has none.
fn source_format(input: &Path) -> String {
    input
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Input directory + base name (extension stripped) + target format.
fn default_output_path(input: &Path, target_format: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_else(|| OsStr::new("output"));
    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(target_format);
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), ConvertorioError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ConvertorioError::OutputWrite {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ConvertorioError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })
}

fn decode<T: serde::de::DeserializeOwned>(
    step: Step,
    body: Value,
) -> Result<T, ConvertorioError> {
    serde_json::from_value(body).map_err(|e| ConvertorioError::Api {
        step,
        message: format!("malformed {step} response: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_format_is_lowercased_extension() {
        assert_eq!(source_format(Path::new("./photo.PNG")), "png");
        assert_eq!(source_format(Path::new("/a/b/scan.jpeg")), "jpeg");
        assert_eq!(source_format(Path::new("noext")), "");
    }

    #[test]
    fn default_output_path_swaps_extension() {
        assert_eq!(
            default_output_path(Path::new("./photo.PNG"), "jpg"),
            PathBuf::from("./photo.jpg")
        );
        assert_eq!(
            default_output_path(Path::new("/data/in/scan.tiff"), "webp"),
            PathBuf::from("/data/in/scan.webp")
        );
    }

    #[test]
    fn default_output_path_for_bare_file_name() {
        assert_eq!(
            default_output_path(Path::new("photo.png"), "avif"),
            PathBuf::from("photo.avif")
        );
    }

    #[test]
    fn request_option_builds_metadata_map() {
        let request = ConversionRequest::new("in.png", "jpg")
            .option("quality", 85)
            .option("crop_strategy", "crop-center");
        let metadata = request.conversion_metadata.unwrap();
        assert_eq!(metadata["quality"], 85);
        assert_eq!(metadata["crop_strategy"], "crop-center");
    }
}
