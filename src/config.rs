//! Client configuration.
//!
//! Every knob lives in [`ClientConfig`], built via
//! [`ClientConfigBuilder`] and frozen once the client is constructed.
//! Keeping the whole surface in one immutable struct means concurrent
//! conversions through one client can never race on configuration.
//!
//! # Design choice: builder over constructor
//! Only the API key is mandatory; everything else has a sensible
//! default. The builder lets callers set exactly what they care about
//! and validates the credential up front, before any network call.

use crate::error::ConvertorioError;
use std::time::Duration;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.convertorio.com";

/// Default polling attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Default delay between polling attempts, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Configuration for a [`ConvertorioClient`](crate::ConvertorioClient).
///
/// # Example
/// ```rust
/// use convertorio::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_key("ck_live_...")
///     .poll_interval_ms(1000)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer credential for all API calls. Required; an empty key fails
    /// at build time with zero network calls made.
    pub api_key: String,

    /// API root. Default: [`DEFAULT_BASE_URL`]. Override for staging or
    /// self-hosted deployments.
    pub base_url: String,

    /// TCP connect timeout. Default: 30s.
    pub connect_timeout: Duration,

    /// Overall per-request timeout (covers reading and writing the body).
    /// Default: 30s.
    pub timeout: Duration,

    /// Maximum polling attempts before giving up. Default: 60.
    ///
    /// Together with `poll_interval` this bounds the worst-case wall
    /// clock of a conversion: ≈ `max_attempts × poll_interval`, two
    /// minutes at the defaults. The interval is constant by design, not
    /// exponential — conversions finish in a predictable, narrow window,
    /// so constant polling trades a little bandwidth for a hard bound.
    pub max_attempts: u32,

    /// Fixed delay between polling attempts. Default: 2000 ms. Skipped
    /// before the first attempt.
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                api_key: String::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
                connect_timeout: Duration::from_secs(30),
                timeout: Duration::from_secs(30),
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            },
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval = Duration::from_millis(ms);
        self
    }

    /// Build the configuration, validating the credential.
    pub fn build(self) -> Result<ClientConfig, ConvertorioError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ConvertorioError::MissingApiKey);
        }
        if self.config.base_url.trim().is_empty() {
            return Err(ConvertorioError::InvalidConfig(
                "base URL must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::builder().api_key("k").build().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_attempts, 60);
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = ClientConfig::builder().build().unwrap_err();
        assert!(err.is_config_error());
        assert!(matches!(err, ConvertorioError::MissingApiKey));
    }

    #[test]
    fn blank_api_key_is_fatal() {
        let err = ClientConfig::builder().api_key("   ").build().unwrap_err();
        assert!(matches!(err, ConvertorioError::MissingApiKey));
    }

    #[test]
    fn max_attempts_floor_is_one() {
        let config = ClientConfig::builder()
            .api_key("k")
            .max_attempts(0)
            .build()
            .unwrap();
        assert_eq!(config.max_attempts, 1);
    }
}
