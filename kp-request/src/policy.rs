//! Product URL exposure policy.
//!
//! Order lines may carry a product page URL and a product image URL. Unless
//! the merchant opts in with `send_product_urls`, those URLs are stripped
//! before the payload is built.

use std::fmt;

/// Where a URL is about to be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlContext {
    /// Image URL of a cart item (session payloads).
    CartItemImage,
    /// Product URL of a cart item (session payloads).
    CartItemUrl,
    /// Image URL of an order item (order payloads).
    OrderItemImage,
    /// Product URL of an order item (order payloads).
    OrderItemUrl,
}

impl UrlContext {
    /// All contexts, in declaration order.
    pub const ALL: [Self; 4] =
        [Self::CartItemImage, Self::CartItemUrl, Self::OrderItemImage, Self::OrderItemUrl];
}

/// Decides whether a URL may be sent to Klarna.
pub trait UrlPolicy: Send + Sync + fmt::Debug {
    /// Returns true if `url` may be embedded in the payload for `context`.
    fn should_expose(&self, context: UrlContext, url: &str) -> bool;

    /// Applies the policy to an optional URL.
    ///
    /// Returns `None` when there is no URL or the policy suppresses it.
    fn filter(&self, context: UrlContext, url: Option<&str>) -> Option<String> {
        url.filter(|url| self.should_expose(context, url)).map(str::to_owned)
    }
}

/// Policy driven by the `send_product_urls` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductUrlPolicy {
    send_product_urls: bool,
}

impl ProductUrlPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new(send_product_urls: bool) -> Self {
        Self { send_product_urls }
    }
}

impl UrlPolicy for ProductUrlPolicy {
    fn should_expose(&self, _context: UrlContext, _url: &str) -> bool {
        self.send_product_urls
    }
}
