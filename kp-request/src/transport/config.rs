//! HTTP transport configuration.
//!
//! Deserialized from the `[transport]` table of the settings file. Every
//! field has a default, so the table may be omitted entirely.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Tuning for [`HttpTransport`](super::HttpTransport).
///
/// The request timeout is the only timeout applied to a Klarna call; request
/// kinds cannot override it.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Maximum idle connections kept per host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,

    /// Total request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// HTTP version preference.
    #[serde(default)]
    pub http_version: HttpVersion,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_max_idle(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            http_version: HttpVersion::default(),
        }
    }
}

impl HttpConfig {
    /// Validates timeouts are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if:
    /// - `timeout_secs` is outside 1-120 seconds
    /// - `connect_timeout_secs` is outside 1-60 seconds or exceeds `timeout_secs`
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ClientError::InvalidConfig(
                "transport.timeout_secs must be between 1 and 120".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(ClientError::InvalidConfig(
                "transport.connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        if self.connect_timeout_secs > self.timeout_secs {
            return Err(ClientError::InvalidConfig(
                "transport.connect_timeout_secs must not exceed timeout_secs".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// HTTP version preference.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 with prior knowledge.
    Http2,
    /// Negotiate via ALPN, falling back to HTTP/1.1.
    #[default]
    Auto,
}

fn default_pool_max_idle() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}
