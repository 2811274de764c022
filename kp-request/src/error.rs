//! Error types for Klarna Payments requests.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! type is [`ClientError`]. Errors are plain values: nothing in the request
//! path panics, and the caller decides how to react to a failed call.
//!
//! # Error Categories
//!
//! - **Transport failures** ([`ClientError::Transport`]): the HTTP exchange never
//!   produced a response. The underlying [`TransportError`] is passed through
//!   exactly as the transport returned it.
//! - **Provider errors** ([`ClientError::Api`]): Klarna answered with a status
//!   outside `200..=299`. Normalized into an [`ApiError`].
//! - **Configuration errors** ([`ClientError::Misconfigured`],
//!   [`ClientError::InvalidConfig`]): credentials or settings are unusable.
//! - **Request errors** ([`ClientError::InvalidRequest`]): the outgoing request
//!   could not be assembled.
//!
//! # Examples
//!
//! ```
//! use kp_request::error::{ApiError, ClientError};
//!
//! let err = ClientError::Api(ApiError {
//!     code: 402,
//!     message: "insufficient_funds".to_owned(),
//!     context: "URL: https://api.klarna.com/payments/v1/sessions - {}".to_owned(),
//! });
//! assert_eq!(err.status_code(), Some(402));
//! ```

use thiserror::Error;

/// Result type alias for request operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while building, sending or interpreting a request.
///
/// This type implements `#[must_use]` to ensure errors are not silently ignored.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport failed before a response was received.
    ///
    /// Network failures, DNS errors and timeouts end up here. The wrapped
    /// error is never enriched or downgraded.
    ///
    /// # Recovery
    ///
    /// This layer never retries. Callers that want retries decide so themselves.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Klarna returned a non-success HTTP status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Merchant credentials could not be resolved.
    ///
    /// Only raised when `strict_credentials` is enabled in the settings;
    /// otherwise missing credentials degrade to empty strings.
    ///
    /// # Recovery
    ///
    /// Configure `merchant_id_{country}` and `shared_secret_{country}` (prefixed
    /// with `test_` in test mode) for the purchase country.
    #[error("Klarna credentials are not configured: {0}")]
    Misconfigured(String),

    /// Settings could not be loaded or failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The outgoing request could not be assembled.
    ///
    /// Covers unusable path identifiers and payload build or serialization
    /// failures. Such a request is never sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Returns the HTTP status code carried by this error, if any.
    ///
    /// Only provider errors carry a status; transport failures never reached
    /// the point of receiving one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(api) => Some(api.code),
            _ => None,
        }
    }
}

/// Normalized error returned by Klarna for a non-2xx response.
///
/// `message` is built from the provider's `error_messages` list when present,
/// otherwise from the HTTP reason phrase. `context` records the URL and the
/// (redacted) request arguments for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Klarna API error {code}: {message}")]
pub struct ApiError {
    /// HTTP status code returned by Klarna.
    pub code: u16,
    /// Human-readable failure reason.
    pub message: String,
    /// `URL: {url} - {request args}`.
    pub context: String,
}

/// Failure of the HTTP transport itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The `reqwest` client failed to complete the exchange.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A transport could not reach the provider for a reason of its own.
    ///
    /// Intended for custom [`Transport`](crate::transport::Transport)
    /// implementations that do not sit on top of `reqwest`.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}
