//! Request lifecycle.
//!
//! A [`PaymentsClient`] owns the derived [`RequestContext`], a [`Transport`]
//! and the hooks. Each call to [`PaymentsClient::request`] takes a
//! [`RequestSpec`] (the request kind, which supplies the path and body),
//! performs exactly one HTTP exchange, logs it, and returns either the
//! decoded JSON body or a [`ClientError`].
//!
//! ```text
//! settings + args ──► RequestContext (base URL, credentials, user agent)
//!                          │
//!      RequestSpec ──► OutboundRequest ──► Transport::send ──► process_response
//!                                                                 │
//!                                                    ExchangeLogger + Result
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use kp_request::{
//!     config::Settings,
//!     context::RequestArguments,
//!     request::{PaymentsClient, kinds::CancelAuthorization},
//! };
//!
//! # async fn example() -> kp_request::error::Result<()> {
//! let settings = Settings::from_file("kp-settings.toml")?;
//! let client = PaymentsClient::from_settings(&settings, RequestArguments::for_country("SE"))?;
//!
//! let cancel = CancelAuthorization::new("b4bd3423-24e3");
//! let outcome = client.request(&cancel).await?;
//! assert!(outcome.is_none()); // 204 No Content
//! # Ok(())
//! # }
//! ```

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::Value;
use tracing::instrument;

use crate::{
    audit::{ExchangeLog, ExchangeLogger, TracingLogger},
    config::Settings,
    context::{RequestArguments, RequestContext, UserAgentFilter},
    error::{ClientError, Result, TransportError},
    policy::{ProductUrlPolicy, UrlPolicy},
    transport::{HttpMethod, HttpTransport, OutboundRequest, Transport, TransportResponse},
};

pub mod kinds;
mod response;

pub use response::{error_message, interpret_response};

/// A concrete Klarna request kind.
///
/// Implementors supply what differs between requests; the client supplies
/// everything else (base URL, credentials, headers, logging).
pub trait RequestSpec: Send + Sync {
    /// Human-readable label used in log titles, e.g. `"Create session"`.
    fn label(&self) -> &'static str;

    /// HTTP method.
    fn method(&self) -> HttpMethod;

    /// Path relative to the API base URL, e.g. `payments/v1/sessions`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if an identifier is unusable.
    fn path(&self) -> Result<String>;

    /// JSON body, or `None` for body-less requests.
    ///
    /// Product URLs must be passed through `policy` before being embedded.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the body cannot be built.
    fn body(&self, policy: &dyn UrlPolicy) -> Result<Option<Value>>;
}

/// Pluggable collaborators of a [`PaymentsClient`].
#[derive(Clone, Default)]
pub struct ClientHooks {
    /// URL exposure policy; defaults to [`ProductUrlPolicy`] from settings.
    pub url_policy: Option<Arc<dyn UrlPolicy>>,
    /// User agent override.
    pub user_agent_filter: Option<UserAgentFilter>,
    /// Exchange log sink; defaults to [`TracingLogger`].
    pub logger: Option<Arc<dyn ExchangeLogger>>,
}

impl fmt::Debug for ClientHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHooks")
            .field("url_policy", &self.url_policy)
            .field("user_agent_filter", &self.user_agent_filter.as_ref().map(|_| "<fn>"))
            .field("logger", &self.logger)
            .finish()
    }
}

/// Klarna Payments client for one merchant and purchase country.
#[derive(Debug)]
pub struct PaymentsClient<T = HttpTransport> {
    context: RequestContext,
    transport: T,
    url_policy: Arc<dyn UrlPolicy>,
    logger: Arc<dyn ExchangeLogger>,
}

impl PaymentsClient<HttpTransport> {
    /// Creates a client with an [`HttpTransport`] built from
    /// `settings.transport` and default hooks.
    ///
    /// # Errors
    ///
    /// Returns error if the transport cannot be built or, in strict mode,
    /// credentials are missing.
    pub fn from_settings(settings: &Settings, args: RequestArguments) -> Result<Self> {
        let transport = HttpTransport::with_config(&settings.transport)?;
        Self::new(settings, &args, transport, ClientHooks::default())
    }
}

impl<T: Transport> PaymentsClient<T> {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Misconfigured`] in strict mode when credentials
    /// cannot be resolved.
    pub fn new(
        settings: &Settings,
        args: &RequestArguments,
        transport: T,
        hooks: ClientHooks,
    ) -> Result<Self> {
        let context = RequestContext::new(settings, args, hooks.user_agent_filter.as_ref())?;
        let url_policy = hooks
            .url_policy
            .unwrap_or_else(|| Arc::new(ProductUrlPolicy::new(settings.send_product_urls)));
        let logger = hooks.logger.unwrap_or_else(|| Arc::new(TracingLogger));

        tracing::debug!(
            base_url = context.base_url(),
            country = ?context.country(),
            protocol = transport.protocol_name(),
            "Klarna client configured"
        );

        Ok(Self { context, transport, url_policy, logger })
    }

    /// Returns the derived request context.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Assembles the outgoing request for a request kind.
    ///
    /// # Errors
    ///
    /// Returns error if the request kind cannot produce its path or body.
    pub fn build_request<S: RequestSpec + ?Sized>(&self, spec: &S) -> Result<OutboundRequest> {
        let url = self.context.url_for(&spec.path()?);
        let body = spec.body(self.url_policy.as_ref())?;

        Ok(OutboundRequest {
            method: spec.method(),
            url,
            headers: vec![
                ("Content-Type".to_owned(), "application/json".to_owned()),
                ("Authorization".to_owned(), self.context.authorization()),
            ],
            user_agent: Some(self.context.user_agent().to_owned()),
            body,
        })
    }

    /// Sends one request and interprets the response.
    ///
    /// Returns `Ok(Some(json))` for a 2xx response with a JSON body and
    /// `Ok(None)` for a 2xx response without one. Nothing is retried.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] if no response was received
    /// - [`ClientError::Api`] for non-2xx responses
    /// - [`ClientError::InvalidRequest`] if the request could not be built
    #[instrument(skip(self, spec), fields(label = spec.label(), method = %spec.method()))]
    pub async fn request<S: RequestSpec + ?Sized>(&self, spec: &S) -> Result<Option<Value>> {
        let request = self.build_request(spec)?;

        let started = Instant::now();
        let outcome = self.transport.send(&request).await;

        self.process_response(spec.label(), &request, outcome, started.elapsed())
    }

    /// Logs an exchange and turns the transport outcome into the call result.
    ///
    /// Transport failures are returned unchanged. The log write cannot alter
    /// the returned value.
    ///
    /// # Errors
    ///
    /// See [`interpret_response`].
    pub fn process_response(
        &self,
        label: &str,
        request: &OutboundRequest,
        outcome: std::result::Result<TransportResponse, TransportError>,
        elapsed: Duration,
    ) -> Result<Option<Value>> {
        let record = ExchangeLog::new(request.method, label, request.url.as_str())
            .with_request_args(request.redacted_args())
            .with_duration(elapsed);

        match outcome {
            Err(error) => {
                self.logger.log(&record.with_transport_error(&error));
                Err(ClientError::Transport(error))
            }
            Ok(response) => {
                self.logger.log(&record.with_http_response(response.status, &response.body));
                interpret_response(request, &response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::audit::ExchangeOutcome;

    #[derive(Debug, Default)]
    struct RecordingLogger(Mutex<Vec<ExchangeLog>>);

    impl ExchangeLogger for RecordingLogger {
        fn log(&self, record: &ExchangeLog) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    #[derive(Debug)]
    struct NoTransport;

    impl Transport for NoTransport {
        async fn send<'a>(
            &'a self,
            _request: &'a OutboundRequest,
        ) -> std::result::Result<TransportResponse, TransportError> {
            Err(TransportError::Unavailable("offline".to_owned()))
        }

        fn protocol_name(&self) -> &'static str {
            "none"
        }
    }

    struct Ping;

    impl RequestSpec for Ping {
        fn label(&self) -> &'static str {
            "Ping"
        }

        fn method(&self) -> HttpMethod {
            HttpMethod::Post
        }

        fn path(&self) -> Result<String> {
            Ok("payments/v1/ping".to_owned())
        }

        fn body(&self, _policy: &dyn UrlPolicy) -> Result<Option<Value>> {
            Ok(Some(json!({"ping": true})))
        }
    }

    fn client(logger: Arc<RecordingLogger>) -> PaymentsClient<NoTransport> {
        let mut settings = Settings::default();
        settings.credentials.insert("merchant_id_se".to_owned(), "K1".to_owned());
        settings.credentials.insert("shared_secret_se".to_owned(), "s&amp;s".to_owned());
        let hooks = ClientHooks { logger: Some(logger), ..ClientHooks::default() };
        PaymentsClient::new(&settings, &RequestArguments::for_country("SE"), NoTransport, hooks)
            .unwrap()
    }

    #[test]
    fn test_build_request_headers_and_url() {
        let client = client(Arc::default());
        let request = client.build_request(&Ping).unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.klarna.com/payments/v1/ping");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("Authorization"), Some(crate::context::basic_auth("K1", "s&s").as_str()));
        assert_eq!(request.body, Some(json!({"ping": true})));
        assert!(request.user_agent.as_deref().is_some_and(|ua| ua.contains("KP: ")));
    }

    #[test]
    fn test_process_response_success_logs_once() {
        let logger = Arc::new(RecordingLogger::default());
        let client = client(Arc::clone(&logger));
        let request = client.build_request(&Ping).unwrap();
        let response = TransportResponse {
            status: 200,
            body: br#"{"order_id":"abc"}"#.to_vec(),
            headers: vec![],
        };

        let result = client.process_response("Ping", &request, Ok(response), Duration::ZERO);
        assert_eq!(result.unwrap(), Some(json!({"order_id": "abc"})));

        let records = logger.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, ExchangeOutcome::Success);
        assert_eq!(records[0].status_code, Some(200));
        assert_eq!(records[0].title, "Ping (https://api.klarna.com/payments/v1/ping)");
        assert!(!records[0].request_args.to_string().contains("Basic "));
    }

    #[test]
    fn test_process_response_passes_transport_error_through() {
        let logger = Arc::new(RecordingLogger::default());
        let client = client(Arc::clone(&logger));
        let request = client.build_request(&Ping).unwrap();

        let outcome = Err(TransportError::Unavailable("dns lookup failed".to_owned()));
        let result = client.process_response("Ping", &request, outcome, Duration::ZERO);

        match result {
            Err(ClientError::Transport(TransportError::Unavailable(msg))) => {
                assert_eq!(msg, "dns lookup failed");
            }
            other => panic!("expected transport error, got {other:?}"),
        }

        let records = logger.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, ExchangeOutcome::TransportError);
        assert_eq!(records[0].status_code, None);
    }

    #[tokio::test]
    async fn test_request_with_failing_transport() {
        let logger = Arc::new(RecordingLogger::default());
        let client = client(Arc::clone(&logger));

        let result = client.request(&Ping).await;
        assert!(matches!(result, Err(ClientError::Transport(TransportError::Unavailable(_)))));
        assert_eq!(logger.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_hooks_debug_hides_closure() {
        let hooks = ClientHooks {
            user_agent_filter: Some(Arc::new(|ua| ua)),
            ..ClientHooks::default()
        };
        assert!(format!("{hooks:?}").contains("<fn>"));
    }
}
