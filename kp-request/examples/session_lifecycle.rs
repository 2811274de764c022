//! Payment session lifecycle against the Klarna playground.
//!
//! Creates a session for a one-item cart, reads it back, and shows how each
//! error class surfaces.
//!
//! # Running this example
//!
//! ```bash
//! export KP_SETTINGS=./kp-settings.toml   # testmode = true, [credentials] test_*_se
//! LOG_FORMAT=pretty RUST_LOG=kp_request=debug cargo run --example session_lifecycle
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "examples are allowed to use println"
)]

use std::env;

use kp_request::{
    ClientError, PaymentsClient,
    config::Settings,
    context::RequestArguments,
    models::{LineItem, LineKind, Purchase},
    observability::{LogFormat, init_observability},
    request::kinds::{CreateSession, GetSession},
};
use rust_decimal::Decimal;

fn report(step: &str, error: &ClientError) {
    match error {
        ClientError::Api(api) => {
            eprintln!("{step}: Klarna rejected the request ({}): {}", api.code, api.message);
            eprintln!("  {}", api.context);
        }
        ClientError::Transport(err) => eprintln!("{step}: no response from Klarna: {err}"),
        other => eprintln!("{step}: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_observability(LogFormat::from_env());

    let path = env::var("KP_SETTINGS").unwrap_or_else(|_| "kp-settings.toml".to_owned());
    let settings = Settings::from_file(&path)?;
    let client = PaymentsClient::from_settings(&settings, RequestArguments::for_country("SE"))?;

    println!("Endpoint: {}", client.context().base_url());

    let cart = Purchase {
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
            product_url: Some("https://shop.example.com/hoodie".to_owned()),
            image_url: None,
        }],
    };

    let session_id = match client.request(&CreateSession::new(cart)).await {
        Ok(Some(session)) => session["session_id"].as_str().unwrap_or_default().to_owned(),
        Ok(None) => {
            eprintln!("Create session: empty response");
            return Ok(());
        }
        Err(error) => {
            report("Create session", &error);
            return Ok(());
        }
    };
    println!("Session: {session_id}");

    match client.request(&GetSession::new(&session_id)).await {
        Ok(session) => println!("Status: {}", session.unwrap_or_default()["status"]),
        Err(error) => report("Get session", &error),
    }

    Ok(())
}
