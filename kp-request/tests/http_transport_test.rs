//! Integration tests for `HttpTransport` against a local mock server.
//!
//! Requests are built by a real `PaymentsClient` for `https://api.klarna.com/`
//! and redirected to the mock server by a thin rebasing transport.

use base64::{Engine, engine::general_purpose::STANDARD};
use kp_request::{
    ClientError, ClientHooks, PaymentsClient, TransportError,
    config::Settings,
    context::RequestArguments,
    models::{LineItem, LineKind, Purchase},
    request::kinds::{CancelAuthorization, CreateSession, GetSession},
    transport::{
        HttpConfig, HttpTransport, HttpVersion, OutboundRequest, Transport, TransportResponse,
    },
};
use mockito::Matcher;
use rust_decimal::Decimal;
use serde_json::json;

const LIVE_BASE: &str = "https://api.klarna.com/";

#[derive(Debug)]
struct Rebased {
    inner: HttpTransport,
    base: String,
}

impl Transport for Rebased {
    async fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut rebased = request.clone();
        rebased.url = request.url.replacen(LIVE_BASE, &self.base, 1);
        self.inner.send(&rebased).await
    }

    fn protocol_name(&self) -> &'static str {
        self.inner.protocol_name()
    }
}

fn client(server: &mockito::Server) -> PaymentsClient<Rebased> {
    client_at(format!("{}/", server.url()))
}

fn client_at(base: String) -> PaymentsClient<Rebased> {
    let settings = Settings::from_toml(
        r#"
        [host]
        platform_version = "6.4"
        site_url = "https://shop.example.com"
        commerce_version = "8.2"

        [credentials]
        merchant_id_se = "K123456_live"
        shared_secret_se = "top&amp;secret"
        "#,
    )
    .expect("should parse settings");

    let config = HttpConfig { http_version: HttpVersion::Http1, ..HttpConfig::default() };
    let transport = Rebased {
        inner: HttpTransport::with_config(&config).expect("should build transport"),
        base,
    };

    PaymentsClient::new(
        &settings,
        &RequestArguments::for_country("se"),
        transport,
        ClientHooks::default(),
    )
    .expect("should build client")
}

fn cart() -> Purchase {
    Purchase {
        purchase_country: "SE".to_owned(),
        purchase_currency: None,
        locale: None,
        lines: vec![LineItem {
            reference: "SKU-1".to_owned(),
            name: "Hoodie".to_owned(),
            quantity: 1,
            unit_price: Decimal::new(49900, 2),
            tax_rate: Decimal::from(25),
            discount: Decimal::ZERO,
            kind: LineKind::Physical,
            product_url: None,
            image_url: None,
        }],
    }
}

#[tokio::test]
async fn test_create_session_over_http() {
    let auth = format!("Basic {}", STANDARD.encode("K123456_live:top&secret"));
    let user_agent = r"^WordPress/6\.4; https://shop\.example\.com - WooCommerce: 8\.2 - KP: .+ - Rust: .+$";

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/payments/v1/sessions")
        .match_header("authorization", auth.as_str())
        .match_header("content-type", "application/json")
        .match_header("user-agent", Matcher::Regex(user_agent.to_owned()))
        .match_body(Matcher::PartialJson(json!({
            "purchase_country": "SE",
            "purchase_currency": "SEK",
            "order_amount": 49900,
            "order_tax_amount": 9980,
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"session_id":"068df369","client_token":"eyJhbGci"}"#)
        .expect(1)
        .create_async()
        .await;

    let result = client(&server).request(&CreateSession::new(cart())).await;

    assert_eq!(
        result.expect("should succeed"),
        Some(json!({"session_id": "068df369", "client_token": "eyJhbGci"}))
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_body_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/payments/v1/sessions/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error_code":"NOT_FOUND","error_messages":["Session not found","Check the id"]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let err = client(&server)
        .request(&GetSession::new("missing"))
        .await
        .expect_err("should fail");

    match err {
        ClientError::Api(api) => {
            assert_eq!(api.code, 404);
            assert_eq!(api.message, "Session not found Check the id");
            let prefix = format!("URL: {LIVE_BASE}payments/v1/sessions/missing - ");
            assert!(api.context.starts_with(&prefix));
        }
        other => panic!("expected API error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_reason_phrase_fallback_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/payments/v1/authorizations/tok-1")
        .with_status(503)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client(&server)
        .request(&CancelAuthorization::new("tok-1"))
        .await
        .expect_err("should fail");

    match err {
        ClientError::Api(api) => assert_eq!(api.message, "Service Unavailable"),
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_content_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/payments/v1/authorizations/tok-2")
        .with_status(204)
        .create_async()
        .await;

    let result = client(&server).request(&CancelAuthorization::new("tok-2")).await;
    assert_eq!(result.expect("should succeed"), None);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let client = client_at("http://127.0.0.1:1/".to_owned());

    let err = client.request(&GetSession::new("s")).await.expect_err("should fail");
    assert!(matches!(err, ClientError::Transport(TransportError::Http(_))));
    assert_eq!(err.status_code(), None);
}
