//! Purchase data and the Klarna order-line payload built from it.
//!
//! Callers describe a purchase with [`Purchase`] and [`LineItem`] using
//! decimal major-unit prices (tax included). [`Purchase::to_payload`] turns
//! that into the wire format Klarna expects: minor-unit integers, tax rates
//! multiplied by 100, and product URLs filtered through a [`UrlPolicy`].

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{
    country,
    error::{ClientError, Result},
    policy::{UrlContext, UrlPolicy},
};

/// Locale used when neither the purchase nor the country table provides one.
pub const FALLBACK_LOCALE: &str = "en-US";

/// Kind of order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Shippable goods.
    #[default]
    Physical,
    /// Downloadable or virtual goods.
    Digital,
    /// Negative-amount discount line.
    Discount,
    /// Shipping cost.
    ShippingFee,
    /// Separately itemized sales tax (US).
    SalesTax,
    /// Surcharges such as payment fees.
    Surcharge,
    /// Gift card redemption.
    GiftCard,
    /// Store credit redemption.
    StoreCredit,
}

/// One purchased item, priced in major units including tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Merchant SKU or item reference.
    pub reference: String,
    /// Display name.
    pub name: String,
    /// Quantity.
    pub quantity: u32,
    /// Unit price including tax.
    pub unit_price: Decimal,
    /// Tax rate in percent (e.g. `25` for 25%).
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Total discount for the line including tax.
    #[serde(default)]
    pub discount: Decimal,
    /// Line kind.
    #[serde(default)]
    pub kind: LineKind,
    /// Product page URL.
    #[serde(default)]
    pub product_url: Option<String>,
    /// Product image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Which side of the checkout the items come from.
///
/// Decides which [`UrlContext`]s the product URLs are filtered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    /// Items of a live cart (payment sessions).
    Cart,
    /// Items of a placed order (authorizations).
    Order,
}

impl ItemSource {
    fn image_context(self) -> UrlContext {
        match self {
            Self::Cart => UrlContext::CartItemImage,
            Self::Order => UrlContext::OrderItemImage,
        }
    }

    fn url_context(self) -> UrlContext {
        match self {
            Self::Cart => UrlContext::CartItemUrl,
            Self::Order => UrlContext::OrderItemUrl,
        }
    }
}

/// A cart or order to be sent to Klarna.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase country (ISO 3166-1 alpha-2).
    pub purchase_country: String,
    /// Purchase currency; defaults to the country's currency.
    #[serde(default)]
    pub purchase_currency: Option<String>,
    /// Locale; defaults to the country's locale.
    #[serde(default)]
    pub locale: Option<String>,
    /// Items.
    pub lines: Vec<LineItem>,
}

/// A single `order_lines` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Line kind, sent as `type`.
    #[serde(rename = "type")]
    pub kind: LineKind,
    /// Item reference.
    pub reference: String,
    /// Display name.
    pub name: String,
    /// Quantity.
    pub quantity: u32,
    /// Minor units.
    pub unit_price: i64,
    /// Percent times 100 (`2500` = 25%).
    pub tax_rate: i64,
    /// Minor units, after discount.
    pub total_amount: i64,
    /// Minor units.
    pub total_discount_amount: i64,
    /// Minor units.
    pub total_tax_amount: i64,
    /// Product page URL, if the policy allows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    /// Product image URL, if the policy allows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Body shared by session and order requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchasePayload {
    /// Uppercase country code.
    pub purchase_country: String,
    /// Uppercase currency code.
    pub purchase_currency: String,
    /// Locale.
    pub locale: String,
    /// Sum of line totals, minor units.
    pub order_amount: i64,
    /// Sum of line taxes, minor units.
    pub order_tax_amount: i64,
    /// Lines.
    pub order_lines: Vec<OrderLine>,
    /// Merchant order number, for order requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_reference1: Option<String>,
}

/// Converts a major-unit amount to minor units, rounding half away from zero.
///
/// # Errors
///
/// Returns [`ClientError::InvalidRequest`] if the amount does not fit in `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| ClientError::InvalidRequest(format!("amount out of range: {amount}")))
}

fn checked_total(
    lines: &[OrderLine],
    amount: fn(&OrderLine) -> i64,
    name: &str,
) -> Result<i64> {
    lines
        .iter()
        .try_fold(0_i64, |sum, line| sum.checked_add(amount(line)))
        .ok_or_else(|| ClientError::InvalidRequest(format!("{name} overflows")))
}

impl LineItem {
    fn to_order_line(&self, source: ItemSource, policy: &dyn UrlPolicy) -> Result<OrderLine> {
        if self.tax_rate.is_sign_negative() {
            return Err(ClientError::InvalidRequest(format!(
                "negative tax rate on line {}",
                self.reference
            )));
        }

        let unit_price = to_minor_units(self.unit_price)?;
        let tax_rate = to_minor_units(self.tax_rate)?;
        let total_discount_amount = to_minor_units(self.discount)?;
        let total_amount = unit_price
            .checked_mul(i64::from(self.quantity))
            .and_then(|gross| gross.checked_sub(total_discount_amount))
            .ok_or_else(|| {
                ClientError::InvalidRequest(format!("line total overflows: {}", self.reference))
            })?;

        // Prices include tax: tax = total - total / (1 + rate).
        let total_tax_amount = if tax_rate == 0 {
            0
        } else {
            let rate = Decimal::from(tax_rate);
            Decimal::from(total_amount)
                .checked_mul(rate)
                .and_then(|gross| gross.checked_div(Decimal::from(10_000) + rate))
                .map(|tax| tax.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
                .and_then(|tax| tax.to_i64())
                .ok_or_else(|| {
                    ClientError::InvalidRequest(format!("line tax overflows: {}", self.reference))
                })?
        };

        Ok(OrderLine {
            kind: self.kind,
            reference: self.reference.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price,
            tax_rate,
            total_amount,
            total_discount_amount,
            total_tax_amount,
            product_url: policy.filter(source.url_context(), self.product_url.as_deref()),
            image_url: policy.filter(source.image_context(), self.image_url.as_deref()),
        })
    }
}

impl Purchase {
    /// Builds the wire payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the purchase has no lines,
    /// no currency can be determined, or an amount is out of range.
    pub fn to_payload(&self, source: ItemSource, policy: &dyn UrlPolicy) -> Result<PurchasePayload> {
        if self.lines.is_empty() {
            return Err(ClientError::InvalidRequest("purchase has no order lines".to_owned()));
        }

        let params = country::lookup(&self.purchase_country);
        let purchase_currency = self
            .purchase_currency
            .clone()
            .or_else(|| params.map(|p| p.currency.to_owned()))
            .ok_or_else(|| {
                ClientError::InvalidRequest(format!(
                    "no purchase_currency given and none known for country {}",
                    self.purchase_country
                ))
            })?;
        let locale = self
            .locale
            .clone()
            .or_else(|| params.map(|p| p.locale.to_owned()))
            .unwrap_or_else(|| FALLBACK_LOCALE.to_owned());

        let order_lines = self
            .lines
            .iter()
            .map(|line| line.to_order_line(source, policy))
            .collect::<Result<Vec<_>>>()?;

        let order_amount = checked_total(&order_lines, |line| line.total_amount, "order_amount")?;
        let order_tax_amount =
            checked_total(&order_lines, |line| line.total_tax_amount, "order_tax_amount")?;

        Ok(PurchasePayload {
            purchase_country: self.purchase_country.trim().to_uppercase(),
            purchase_currency: purchase_currency.to_uppercase(),
            locale,
            order_amount,
            order_tax_amount,
            order_lines,
            merchant_reference1: None,
        })
    }
}
