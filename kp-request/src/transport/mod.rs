//! HTTP transport abstraction.
//!
//! A [`Transport`] performs exactly one HTTP exchange per call and reports
//! either the raw response (whatever its status) or a [`TransportError`].
//! Interpreting the status is left to [`interpret_response`]; the transport
//! never turns a non-2xx status into an error.
//!
//! [`HttpTransport`] is the `reqwest`-backed default. Hosts that already own
//! an HTTP stack can implement the trait themselves.
//!
//! # Examples
//!
//! ```rust,no_run
//! use kp_request::transport::{HttpMethod, HttpTransport, OutboundRequest, Transport};
//!
//! # async fn example() -> kp_request::error::Result<()> {
//! let transport = HttpTransport::new()?;
//! let request = OutboundRequest::new(
//!     HttpMethod::Get,
//!     "https://api.playground.klarna.com/payments/v1/sessions/abc",
//! );
//!
//! let response = transport.send(&request).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```
//!
//! [`interpret_response`]: crate::request::interpret_response

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TransportError;

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// Placeholder written in place of credential header values.
pub const REDACTED: &str = "[REDACTED]";

/// HTTP methods used against the Klarna Payments API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled request, built fresh for each call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers in sending order.
    pub headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: Option<String>,
    /// JSON body, if the request carries one.
    pub body: Option<Value>,
}

impl OutboundRequest {
    /// Creates a request without headers or body.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), user_agent: None, body: None }
    }

    /// Returns the value of a header, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the request arguments as JSON with credentials redacted.
    ///
    /// This is the form written to logs and to [`ApiError`] context; the
    /// `Authorization` header value never leaves the process through it.
    ///
    /// [`ApiError`]: crate::error::ApiError
    pub fn redacted_args(&self) -> Value {
        let headers: Map<String, Value> = self
            .headers
            .iter()
            .map(|(key, value)| {
                let value = if key.eq_ignore_ascii_case("authorization") {
                    REDACTED.to_owned()
                } else {
                    value.clone()
                };
                (key.clone(), Value::String(value))
            })
            .collect();

        let mut args = Map::new();
        args.insert("method".to_owned(), Value::String(self.method.as_str().to_owned()));
        args.insert("headers".to_owned(), Value::Object(headers));
        if let Some(user_agent) = &self.user_agent {
            args.insert("user-agent".to_owned(), Value::String(user_agent.clone()));
        }
        if let Some(body) = &self.body {
            args.insert("body".to_owned(), body.clone());
        }
        Value::Object(args)
    }
}

/// Raw response from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// Returns true for statuses in `200..=299`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Returns the canonical reason phrase for the status, or `""` if unknown.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or_default()
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A single-exchange HTTP transport.
///
/// Implementations must send the request exactly as given: no retries, no
/// extra timeouts, no rewriting of headers or body.
pub trait Transport: Send + Sync {
    /// Sends one request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no complete HTTP response was
    /// received. A body that fails to arrive after the status line counts as
    /// no response, so its status is not reported.
    fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}
