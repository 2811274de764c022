//! Exchange logging.
//!
//! Every request produces exactly one [`ExchangeLog`], whether it succeeded,
//! failed at the provider, or never reached it. The record is handed to an
//! [`ExchangeLogger`]; the default [`TracingLogger`] emits it as a structured
//! `tracing` event with target `kp_request::exchange` for easy routing.
//!
//! Request arguments in the record are already redacted: the `Authorization`
//! header never appears in a log line.

use std::{fmt, time::Duration};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::transport::HttpMethod;

/// Tracing target for exchange records.
pub const EXCHANGE_TARGET: &str = "kp_request::exchange";

/// Outcome class of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeOutcome {
    /// 2xx response.
    Success,
    /// Non-2xx response from Klarna.
    ApiError,
    /// No response received.
    TransportError,
}

/// One logged request/response exchange.
///
/// # Examples
///
/// ```
/// use kp_request::audit::{ExchangeLog, ExchangeOutcome};
/// use kp_request::transport::HttpMethod;
///
/// let log = ExchangeLog::new(
///     HttpMethod::Post,
///     "Create session",
///     "https://api.klarna.com/payments/v1/sessions",
/// );
/// assert_eq!(log.title, "Create session (https://api.klarna.com/payments/v1/sessions)");
/// assert_eq!(log.outcome, ExchangeOutcome::Success);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeLog {
    /// Correlation id for this exchange.
    pub request_id: Uuid,
    /// Outcome class.
    pub outcome: ExchangeOutcome,
    /// Order id, when the response exposes one under `OrderID`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// `{request label} ({url})`.
    pub title: String,
    /// Redacted request arguments.
    pub request_args: Value,
    /// Raw response: `{status, body}` or the transport error text.
    pub response: Value,
    /// HTTP status code, absent on transport failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Request URL.
    pub url: String,
    /// Wall time of the exchange in milliseconds.
    pub duration_ms: u64,
}

impl ExchangeLog {
    /// Creates a record with an empty response.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(method: HttpMethod, label: &str, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            request_id: Uuid::new_v4(),
            outcome: ExchangeOutcome::Success,
            order_id: None,
            method,
            title: format!("{label} ({url})"),
            request_args: Value::Null,
            response: Value::Null,
            status_code: None,
            url,
            duration_ms: 0,
        }
    }

    /// Sets the redacted request arguments.
    #[must_use]
    pub fn with_request_args(mut self, args: Value) -> Self {
        self.request_args = args;
        self
    }

    /// Records a received HTTP response.
    ///
    /// The body is stored as JSON when it parses, as text otherwise. The
    /// order id is taken from a top-level `OrderID` key if present.
    #[must_use]
    pub fn with_http_response(mut self, status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        self.order_id = parsed.as_ref().and_then(extract_order_id);
        let body = parsed.unwrap_or_else(|| Value::String(String::from_utf8_lossy(body).into_owned()));

        self.outcome = if (200..=299).contains(&status) {
            ExchangeOutcome::Success
        } else {
            ExchangeOutcome::ApiError
        };
        self.status_code = Some(status);
        self.response = serde_json::json!({ "status": status, "body": body });
        self
    }

    /// Records a transport failure.
    #[must_use]
    pub fn with_transport_error(mut self, error: &dyn fmt::Display) -> Self {
        self.outcome = ExchangeOutcome::TransportError;
        self.status_code = None;
        self.response = Value::String(error.to_string());
        self
    }

    /// Sets the duration.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "duration in ms fits u64 for practical values"
    )]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }
}

/// Reads `OrderID` from a decoded response, accepting strings and numbers.
fn extract_order_id(body: &Value) -> Option<String> {
    match body.get("OrderID")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Sink for exchange records.
///
/// Implementations must not panic; a logger failing to write has no effect on
/// the request outcome.
pub trait ExchangeLogger: Send + Sync + fmt::Debug {
    /// Writes one record.
    fn log(&self, record: &ExchangeLog);
}

/// Default logger emitting `tracing` events.
///
/// Successful exchanges log at `info`, failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ExchangeLogger for TracingLogger {
    fn log(&self, record: &ExchangeLog) {
        let request_args = record.request_args.to_string();
        let response = record.response.to_string();
        match record.outcome {
            ExchangeOutcome::Success => tracing::info!(
                target: EXCHANGE_TARGET,
                request_id = %record.request_id,
                order_id = ?record.order_id,
                method = %record.method,
                status_code = ?record.status_code,
                url = %record.url,
                duration_ms = record.duration_ms,
                request_args = %request_args,
                response = %response,
                "{}",
                record.title
            ),
            ExchangeOutcome::ApiError | ExchangeOutcome::TransportError => tracing::warn!(
                target: EXCHANGE_TARGET,
                request_id = %record.request_id,
                outcome = ?record.outcome,
                order_id = ?record.order_id,
                method = %record.method,
                status_code = ?record.status_code,
                url = %record.url,
                duration_ms = record.duration_ms,
                request_args = %request_args,
                response = %response,
                "{}",
                record.title
            ),
        }
    }
}
