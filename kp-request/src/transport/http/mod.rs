//! `reqwest`-backed transport.

use reqwest::{Client, Method, header::HeaderMap};
use tracing::instrument;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{ClientError, Result, TransportError},
    transport::{HttpMethod, OutboundRequest, Transport, TransportResponse},
};

/// Rejects header names and values carrying control characters.
fn validate_header(name: &str, value: &str) -> std::result::Result<(), TransportError> {
    let invalid = |s: &str| s.contains('\r') || s.contains('\n') || s.contains('\0');
    if invalid(name) {
        return Err(TransportError::Unavailable(format!(
            "invalid header name {name:?}: control characters not allowed"
        )));
    }
    if invalid(value) {
        return Err(TransportError::Unavailable(format!(
            "invalid value for header {name}: control characters not allowed"
        )));
    }
    Ok(())
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Copies response headers, keeping non-UTF-8 values as lossy text.
fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (name.to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect()
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// # Examples
///
/// ```
/// use kp_request::transport::{HttpConfig, HttpTransport, HttpVersion, Transport};
///
/// let config = HttpConfig { http_version: HttpVersion::Http1, ..Default::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// assert_eq!(transport.protocol_name(), "http/1.1");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
}

impl HttpTransport {
    /// Creates a transport with the default [`HttpConfig`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if the configuration is out of
    /// bounds, or a transport error if the client cannot be built.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build().map_err(|e| ClientError::Transport(e.into()))?;

        Ok(Self { client, http_version: config.http_version })
    }

    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(
        &self,
        request: &OutboundRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        for (name, value) in &request.headers {
            validate_header(name, value)?;
        }

        let mut builder = self.client.request(reqwest_method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(user_agent) = &request.user_agent {
            validate_header("User-Agent", user_agent)?;
            builder = builder.header(reqwest::header::USER_AGENT, user_agent.as_str());
        }

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                TransportError::Unavailable(format!("request body serialization failed: {e}"))
            })?;
            builder = builder.body(bytes);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());

        // A body read failure drops the status: no complete response arrived.
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status, body_len = body.len(), "received response");

        Ok(TransportResponse { status, body, headers })
    }
}

impl Transport for HttpTransport {
    async fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        self.execute(request).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}
