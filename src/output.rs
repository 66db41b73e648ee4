//! Result type for a finished conversion.

use serde::Serialize;
use std::path::PathBuf;

/// The immutable summary of one successful conversion run.
///
/// Constructed exactly once, after the job reached `completed` and the
/// artifact was written to `output_path`. A failed conversion never
/// produces a partial result; it surfaces as a
/// [`ConvertorioError`](crate::ConvertorioError) instead.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    /// Always `true`; kept for parity with the wire format the other
    /// Convertorio SDKs expose.
    pub success: bool,
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub source_format: String,
    pub target_format: String,
    /// Byte size of the file actually written to `output_path`.
    pub file_size: u64,
    /// Server-side processing duration, when reported.
    pub processing_time_ms: Option<u64>,
    pub download_url: String,
    /// Usage-metering count for this conversion, when reported.
    pub tokens_used: Option<u64>,
}
