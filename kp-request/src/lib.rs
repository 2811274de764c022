//! kp-request: request building and dispatch for the Klarna Payments API
//!
//! This crate is the layer between a shop integration and Klarna's REST API.
//! It derives everything a request needs from merchant settings (regional
//! endpoint, test or live credentials, user agent), sends exactly one HTTP
//! request per call, and turns the response into either decoded JSON or a
//! structured error. Every exchange is logged once, with credentials redacted.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Shop integration    │  checkout, order admin
//! └──────────┬───────────┘
//!            │ RequestSpec (CreateSession, PlaceOrder, ...)
//! ┌──────────▼───────────────────────────────────────┐
//! │  PaymentsClient                                   │
//! │  ┌────────────────┐  ┌───────────┐  ┌──────────┐  │
//! │  │ RequestContext │  │ UrlPolicy │  │ Exchange │  │
//! │  │ (URL, auth, UA)│  │           │  │ Logger   │  │
//! │  └────────────────┘  └───────────┘  └──────────┘  │
//! └──────────┬───────────────────────────────────────┘
//!            │ Transport (HttpTransport = reqwest)
//! ┌──────────▼───────────┐
//! │  api{-na,-oc}.       │
//! │  {playground.}       │
//! │  klarna.com          │
//! └──────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kp_request::{
//!     config::Settings,
//!     context::RequestArguments,
//!     models::{LineItem, LineKind, Purchase},
//!     request::{PaymentsClient, kinds::CreateSession},
//! };
//! use rust_decimal::Decimal;
//!
//! # async fn example() -> kp_request::error::Result<()> {
//! let settings = Settings::from_toml(
//!     r#"
//!     testmode = true
//!
//!     [credentials]
//!     test_merchant_id_se = "PK12345_abcdef"
//!     test_shared_secret_se = "secret"
//!     "#,
//! )?;
//!
//! let client = PaymentsClient::from_settings(&settings, RequestArguments::for_country("SE"))?;
//!
//! let cart = Purchase {
//!     purchase_country: "SE".to_string(),
//!     purchase_currency: None,
//!     locale: None,
//!     lines: vec![LineItem {
//!         reference: "SKU-1".to_string(),
//!         name: "Hoodie".to_string(),
//!         quantity: 1,
//!         unit_price: Decimal::new(49900, 2),
//!         tax_rate: Decimal::from(25),
//!         discount: Decimal::ZERO,
//!         kind: LineKind::Physical,
//!         product_url: None,
//!         image_url: None,
//!     }],
//! };
//!
//! let session = client.request(&CreateSession::new(cart)).await?;
//! println!("{session:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! ```rust,no_run
//! use kp_request::{
//!     context::RequestArguments,
//!     error::ClientError,
//!     request::{PaymentsClient, kinds::GetSession},
//! };
//!
//! # async fn example(settings: kp_request::config::Settings) {
//! let Ok(client) = PaymentsClient::from_settings(&settings, RequestArguments::default()) else {
//!     return;
//! };
//!
//! match client.request(&GetSession::new("068df369")).await {
//!     Ok(Some(session)) => println!("status: {}", session["status"]),
//!     Ok(None) => println!("no body"),
//!     Err(ClientError::Api(err)) => eprintln!("Klarna said {}: {}", err.code, err.message),
//!     Err(ClientError::Transport(err)) => eprintln!("network: {err}"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: merchant settings and transport tuning
//! - [`context`]: base URL, credentials and user agent derivation
//! - [`country`]: per-country endpoint, currency and locale
//! - [`models`]: cart and order payloads
//! - [`policy`]: product URL exposure
//! - [`request`]: the client, request kinds and response processing
//! - [`transport`]: HTTP abstraction and the reqwest implementation
//! - [`audit`]: exchange log records and sinks
//! - [`observability`]: tracing subscriber setup
//! - [`error`]: error types

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod audit;
pub mod config;
pub mod context;
pub mod country;
pub mod error;
pub mod models;
pub mod observability;
pub mod policy;
pub mod request;
pub mod transport;

pub use error::{ApiError, ClientError, Result, TransportError};
pub use request::{ClientHooks, PaymentsClient, RequestSpec};
