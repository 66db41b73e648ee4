//! The wire seam: authenticated JSON calls and raw byte PUT/GET.
//!
//! The orchestrator never talks to reqwest directly. It goes through the
//! object-safe [`Transport`] trait so integration tests can script an
//! entire conversion — responses, failures, call counts — without a live
//! server or an HTTP mock layer. [`HttpTransport`] is the production
//! implementation.
//!
//! Errors at this layer are deliberately step-agnostic: the transport
//! does not know whether a `PUT` is an upload or something else. The
//! caller attaches the [`crate::error::Step`] via
//! [`ConvertorioError::from_transport`](crate::error::ConvertorioError::from_transport).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// A transport-level failure, before step context is attached.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-2xx HTTP status. `body` is the server's `error` field when the
    /// response body parses as a JSON envelope, else the raw body text.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed: connect failure, timeout, or a body
    /// that could not be read or decoded.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Issues authenticated API requests and raw byte transfers.
///
/// `post_json`/`get_json` address paths relative to the configured base
/// URL and carry the bearer credential. `put_bytes`/`get_bytes` address
/// absolute, server-supplied URLs (object storage) and carry no
/// credential.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, path: &str, body: Value) -> Result<Value, TransportError>;
    async fn get_json(&self, path: &str) -> Result<Value, TransportError>;
    async fn put_bytes(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError>;
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Production [`Transport`] backed by two shared [`reqwest::Client`]s.
///
/// Two clients because the credential must never leak onto presigned
/// object-storage URLs: an extra `Authorization` header makes S3-style
/// signature validation reject the request outright.
pub struct HttpTransport {
    /// Carries the bearer credential as a default header.
    api: reqwest::Client,
    /// No default headers; used for raw PUT/GET to server-supplied URLs.
    raw: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(
        api_key: &str,
        base_url: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .unwrap_or_else(|_| HeaderValue::from_static(""));
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let api = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        let raw = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;

        Ok(HttpTransport {
            api,
            raw,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into a [`TransportError::Status`],
    /// preferring the envelope's `error` string over the raw body.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(raw);
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        debug!("POST {}", path);
        let response = self
            .api
            .post(self.api_url(path))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        debug!("GET {}", path);
        let response = self.api.get(self.api_url(path)).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn put_bytes(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError> {
        debug!("PUT {} ({} bytes, {})", url, body.len(), content_type);
        let response = self
            .raw
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        debug!("GET {}", url);
        let response = self.raw.get(url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
