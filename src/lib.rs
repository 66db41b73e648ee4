//! # convertorio
//!
//! Rust SDK for the [Convertorio](https://convertorio.com) image-conversion
//! API.
//!
//! ## How a conversion works
//!
//! Conversion happens server-side; this crate never interprets image
//! content. One call to [`ConvertorioClient::convert`] drives the
//! service's asynchronous job protocol end-to-end:
//!
//! ```text
//! photo.png
//!  │
//!  ├─ 1. upload-url   request an upload slot (job id + presigned URL)
//!  ├─ 2. upload       PUT the file bytes to object storage
//!  ├─ 3. confirm      confirm the upload, conversion is queued
//!  ├─ 4. poll         fetch job status at a fixed cadence until terminal
//!  └─ 5. download     fetch the artifact, write it next to the input
//! ```
//!
//! Every step reports through a per-client event bus (`start`,
//! `progress`, `status`, `complete`, `error`) so callers can wire up
//! progress bars, logs, or metrics without touching the workflow.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use convertorio::{ClientConfig, ConvertorioClient, ConversionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .api_key(std::env::var("CONVERTORIO_API_KEY")?)
//!         .build()?;
//!     let client = ConvertorioClient::new(config)?;
//!
//!     let result = client
//!         .convert(&ConversionRequest::new("photo.png", "webp").option("quality", 85))
//!         .await?;
//!     println!("{} bytes → {}", result.file_size, result.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `convertorio` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! convertorio = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod event;
pub mod output;
pub mod transport;

mod poll;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{Account, Job, JobStatus};
pub use client::{ConvertorioClient, ListJobsQuery};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use convert::ConversionRequest;
pub use error::{ConvertorioError, Step};
pub use event::{Event, EventKind, ProgressStep};
pub use output::ConversionResult;
pub use transport::{HttpTransport, Transport, TransportError};
