//! Klarna Payments request kinds.
//!
//! | Kind | Method | Path |
//! |---|---|---|
//! | [`CreateSession`] | POST | `payments/v1/sessions` |
//! | [`UpdateSession`] | POST | `payments/v1/sessions/{session_id}` |
//! | [`GetSession`] | GET | `payments/v1/sessions/{session_id}` |
//! | [`PlaceOrder`] | POST | `payments/v1/authorizations/{token}/order` |
//! | [`CancelAuthorization`] | DELETE | `payments/v1/authorizations/{token}` |

use serde_json::Value;
use url::Url;

use super::RequestSpec;
use crate::{
    error::{ClientError, Result},
    models::{ItemSource, Purchase},
    policy::UrlPolicy,
    transport::HttpMethod,
};

const SESSIONS: [&str; 3] = ["payments", "v1", "sessions"];
const AUTHORIZATIONS: [&str; 3] = ["payments", "v1", "authorizations"];

/// Joins path segments, percent-encoding each one.
///
/// Identifiers must be non-empty and may not be `.` or `..`.
fn encode_path(fixed: &[&str], ids: &[(&str, &str)], tail: &[&str]) -> Result<String> {
    for (name, id) in ids {
        if id.trim().is_empty() || matches!(*id, "." | "..") {
            return Err(ClientError::InvalidRequest(format!("invalid {name}: {id:?}")));
        }
    }

    let mut url = Url::parse("https://localhost/")
        .map_err(|e| ClientError::InvalidRequest(format!("path base: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidRequest("path base cannot hold segments".to_owned()))?
        .clear()
        .extend(fixed)
        .extend(ids.iter().map(|(_, id)| *id))
        .extend(tail);

    Ok(url.path().trim_start_matches('/').to_owned())
}

fn purchase_body(
    purchase: &Purchase,
    source: ItemSource,
    policy: &dyn UrlPolicy,
    merchant_reference1: Option<&str>,
) -> Result<Option<Value>> {
    let mut payload = purchase.to_payload(source, policy)?;
    payload.merchant_reference1 = merchant_reference1.map(str::to_owned);
    serde_json::to_value(payload)
        .map(Some)
        .map_err(|e| ClientError::InvalidRequest(format!("payload serialization: {e}")))
}

/// Opens a payment session for a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSession {
    /// Cart contents.
    pub cart: Purchase,
}

impl CreateSession {
    /// Creates the request.
    #[must_use]
    pub fn new(cart: Purchase) -> Self {
        Self { cart }
    }
}

impl RequestSpec for CreateSession {
    fn label(&self) -> &'static str {
        "Create session"
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> Result<String> {
        encode_path(&SESSIONS, &[], &[])
    }

    fn body(&self, policy: &dyn UrlPolicy) -> Result<Option<Value>> {
        purchase_body(&self.cart, ItemSource::Cart, policy, None)
    }
}

/// Replaces the cart of an existing session.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSession {
    /// Session id returned by [`CreateSession`].
    pub session_id: String,
    /// New cart contents.
    pub cart: Purchase,
}

impl UpdateSession {
    /// Creates the request.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(session_id: impl Into<String>, cart: Purchase) -> Self {
        Self { session_id: session_id.into(), cart }
    }
}

impl RequestSpec for UpdateSession {
    fn label(&self) -> &'static str {
        "Update session"
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> Result<String> {
        encode_path(&SESSIONS, &[("session_id", &self.session_id)], &[])
    }

    fn body(&self, policy: &dyn UrlPolicy) -> Result<Option<Value>> {
        purchase_body(&self.cart, ItemSource::Cart, policy, None)
    }
}

/// Reads an existing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSession {
    /// Session id.
    pub session_id: String,
}

impl GetSession {
    /// Creates the request.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into() }
    }
}

impl RequestSpec for GetSession {
    fn label(&self) -> &'static str {
        "Get session"
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Result<String> {
        encode_path(&SESSIONS, &[("session_id", &self.session_id)], &[])
    }

    fn body(&self, _policy: &dyn UrlPolicy) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Turns an authorization into an order.
///
/// The merchant's order number is sent as `merchant_reference1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    /// Authorization token from the client-side widget.
    pub authorization_token: String,
    /// Merchant order number.
    pub order_number: String,
    /// Order contents.
    pub order: Purchase,
}

impl PlaceOrder {
    /// Creates the request.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(
        authorization_token: impl Into<String>,
        order_number: impl Into<String>,
        order: Purchase,
    ) -> Self {
        Self {
            authorization_token: authorization_token.into(),
            order_number: order_number.into(),
            order,
        }
    }
}

impl RequestSpec for PlaceOrder {
    fn label(&self) -> &'static str {
        "Place order"
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> Result<String> {
        encode_path(
            &AUTHORIZATIONS,
            &[("authorization_token", &self.authorization_token)],
            &["order"],
        )
    }

    fn body(&self, policy: &dyn UrlPolicy) -> Result<Option<Value>> {
        purchase_body(&self.order, ItemSource::Order, policy, Some(&self.order_number))
    }
}

/// Releases an authorization that will not become an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAuthorization {
    /// Authorization token.
    pub authorization_token: String,
}

impl CancelAuthorization {
    /// Creates the request.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(authorization_token: impl Into<String>) -> Self {
        Self { authorization_token: authorization_token.into() }
    }
}

impl RequestSpec for CancelAuthorization {
    fn label(&self) -> &'static str {
        "Cancel authorization"
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Delete
    }

    fn path(&self) -> Result<String> {
        encode_path(&AUTHORIZATIONS, &[("authorization_token", &self.authorization_token)], &[])
    }

    fn body(&self, _policy: &dyn UrlPolicy) -> Result<Option<Value>> {
        Ok(None)
    }
}
