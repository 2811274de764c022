//! Per-client request context.
//!
//! A [`RequestContext`] is derived once from [`Settings`] and the call
//! arguments and never changes afterwards. It holds everything a request
//! needs besides its own path and body: the regional base URL, the merchant
//! credentials and the user agent.

use std::{fmt, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::Zeroizing;

use crate::{
    config::{HostInfo, Settings},
    country,
    error::{ClientError, Result},
};

/// Hook that may rewrite the user agent before it is used.
pub type UserAgentFilter = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Call-specific arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestArguments {
    /// Purchase country (ISO 3166-1 alpha-2). Case does not matter.
    pub country: Option<String>,
}

impl RequestArguments {
    /// Arguments for a specific purchase country.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn for_country(country: impl Into<String>) -> Self {
        Self { country: Some(country.into()) }
    }
}

/// Resolves the effective purchase country.
///
/// A non-blank explicit country always wins. A blank or absent one falls
/// back to `settings.default_country`. The result is lowercased.
pub fn resolve_country(args: &RequestArguments, settings: &Settings) -> Option<String> {
    let non_blank = |value: &Option<String>| {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
    };
    non_blank(&args.country).or_else(|| non_blank(&settings.default_country))
}

/// Builds the API base URL: `https://api{region}.{playground.}{domain}/`.
///
/// # Examples
///
/// ```
/// use kp_request::context::base_url;
///
/// assert_eq!(base_url("", false, "klarna.com"), "https://api.klarna.com/");
/// assert_eq!(base_url("-na", true, "klarna.com"), "https://api-na.playground.klarna.com/");
/// ```
pub fn base_url(region: &str, testmode: bool, domain: &str) -> String {
    let playground = if testmode { "playground." } else { "" };
    format!("https://api{region}.{playground}{domain}/")
}

/// Builds a credential setting key, e.g. `test_merchant_id_se`.
pub fn credential_key(name: &str, testmode: bool, country: Option<&str>) -> String {
    let prefix = if testmode { "test_" } else { "" };
    match country {
        Some(country) => format!("{prefix}{name}_{country}"),
        None => format!("{prefix}{name}"),
    }
}

/// Builds the `Authorization` header value.
///
/// The shared secret is HTML-entity decoded first, so secrets stored as
/// `s&amp;s` authenticate as `s&s`.
///
/// # Examples
///
/// ```
/// use kp_request::context::basic_auth;
///
/// assert_eq!(basic_auth("m", "s&amp;s"), basic_auth("m", "s&s"));
/// assert_eq!(basic_auth("user", "pass"), "Basic dXNlcjpwYXNz");
/// ```
pub fn basic_auth(merchant_id: &str, shared_secret: &str) -> String {
    let secret = html_escape::decode_html_entities(shared_secret);
    let credentials = Zeroizing::new(format!("{merchant_id}:{secret}"));
    format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
}

/// Builds the default user agent from host facts.
pub fn user_agent(host: &HostInfo) -> String {
    format!(
        "{}/{}; {} - {}: {} - KP: {} - Rust: {}",
        host.platform,
        host.platform_version,
        host.site_url,
        host.commerce,
        host.commerce_version,
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_RUST_VERSION"),
    )
}

/// Immutable per-client request state.
#[derive(Clone)]
pub struct RequestContext {
    country: Option<String>,
    base_url: String,
    merchant_id: String,
    shared_secret: Zeroizing<String>,
    user_agent: String,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("country", &self.country)
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .field("shared_secret", &crate::transport::REDACTED)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl RequestContext {
    /// Derives the context from settings and call arguments.
    ///
    /// Unknown countries fall back to the default region. Missing credential
    /// settings resolve to empty strings, unless `strict_credentials` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Misconfigured`] in strict mode when the country
    /// cannot be resolved or either credential is missing or empty.
    pub fn new(
        settings: &Settings,
        args: &RequestArguments,
        user_agent_filter: Option<&UserAgentFilter>,
    ) -> Result<Self> {
        let country = resolve_country(args, settings);
        let region = country::endpoint_suffix(country.as_deref());
        let base_url = base_url(region, settings.testmode, &settings.domain);

        let id_key = credential_key("merchant_id", settings.testmode, country.as_deref());
        let secret_key = credential_key("shared_secret", settings.testmode, country.as_deref());
        let merchant_id = settings.credential(&id_key).unwrap_or_default().to_owned();
        let shared_secret = Zeroizing::new(settings.credential(&secret_key).unwrap_or_default().to_owned());

        if country.is_none() || merchant_id.is_empty() || shared_secret.is_empty() {
            if settings.strict_credentials {
                return Err(ClientError::Misconfigured(match country {
                    None => "no purchase country and no default_country".to_owned(),
                    Some(_) => format!("{id_key} and {secret_key} must both be set"),
                }));
            }
            tracing::warn!(
                country = ?country,
                merchant_id_key = %id_key,
                "Klarna credentials missing, requests will use empty credentials"
            );
        }

        let mut user_agent = user_agent(&settings.host);
        if let Some(filter) = user_agent_filter {
            user_agent = filter(user_agent);
        }

        Ok(Self { country, base_url, merchant_id, shared_secret, user_agent })
    }

    /// Resolved purchase country, lowercased.
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Regional API base URL, ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Merchant id (Klarna API username).
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// User agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// `Authorization` header value for this merchant.
    pub fn authorization(&self) -> String {
        basic_auth(&self.merchant_id, &self.shared_secret)
    }

    /// Joins a path onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(testmode: bool, pairs: &[(&str, &str)]) -> Settings {
        let mut settings = Settings { testmode, ..Settings::default() };
        for (key, value) in pairs {
            settings.credentials.insert((*key).to_owned(), (*value).to_owned());
        }
        settings
    }

    #[test]
    fn test_base_url_default_region_live() {
        let context =
            RequestContext::new(&Settings::default(), &RequestArguments::for_country("XX"), None)
                .unwrap();
        assert_eq!(context.base_url(), "https://api.klarna.com/");
    }

    #[test]
    fn test_base_url_variants() {
        assert_eq!(base_url("", true, "klarna.com"), "https://api.playground.klarna.com/");
        assert_eq!(base_url("-oc", false, "klarna.com"), "https://api-oc.klarna.com/");
        assert_eq!(base_url("-na", true, "klarna.com"), "https://api-na.playground.klarna.com/");
    }

    #[test]
    fn test_testmode_uses_playground_and_test_keys() {
        let settings = settings_with(true, &[
            ("test_merchant_id_us", "PN_test"),
            ("test_shared_secret_us", "test-secret"),
            ("merchant_id_us", "PN_live"),
            ("shared_secret_us", "live-secret"),
        ]);

        let context =
            RequestContext::new(&settings, &RequestArguments::for_country("US"), None).unwrap();
        assert!(context.base_url().contains("playground"));
        assert_eq!(context.base_url(), "https://api-na.playground.klarna.com/");
        assert_eq!(context.merchant_id(), "PN_test");
        assert_eq!(context.authorization(), basic_auth("PN_test", "test-secret"));
    }

    #[test]
    fn test_live_mode_uses_unprefixed_keys() {
        let settings = settings_with(false, &[
            ("test_merchant_id_se", "K_test"),
            ("merchant_id_se", "K_live"),
            ("shared_secret_se", "live"),
        ]);

        let context =
            RequestContext::new(&settings, &RequestArguments::for_country("se"), None).unwrap();
        assert_eq!(context.merchant_id(), "K_live");
        assert_eq!(context.country(), Some("se"));
    }

    #[test]
    fn test_credential_key() {
        assert_eq!(credential_key("merchant_id", true, Some("se")), "test_merchant_id_se");
        assert_eq!(credential_key("shared_secret", false, Some("us")), "shared_secret_us");
        assert_eq!(credential_key("merchant_id", false, None), "merchant_id");
    }

    #[test]
    fn test_explicit_country_wins_over_default() {
        let settings = Settings { default_country: Some("SE".to_owned()), ..Settings::default() };
        let args = RequestArguments::for_country("NO");
        assert_eq!(resolve_country(&args, &settings).as_deref(), Some("no"));
    }

    #[test]
    fn test_blank_or_absent_country_falls_back_to_default() {
        let settings = Settings { default_country: Some("SE".to_owned()), ..Settings::default() };
        assert_eq!(resolve_country(&RequestArguments::default(), &settings).as_deref(), Some("se"));
        assert_eq!(
            resolve_country(&RequestArguments::for_country("  "), &settings).as_deref(),
            Some("se")
        );
    }

    #[test]
    fn test_no_country_at_all() {
        assert_eq!(resolve_country(&RequestArguments::default(), &Settings::default()), None);
    }

    #[test]
    fn test_missing_credentials_are_empty_by_default() {
        let context =
            RequestContext::new(&Settings::default(), &RequestArguments::for_country("de"), None)
                .unwrap();
        assert_eq!(context.merchant_id(), "");
        assert_eq!(context.authorization(), format!("Basic {}", STANDARD.encode(":")));
    }

    #[test]
    fn test_strict_mode_rejects_missing_credentials() {
        let settings = Settings {
            strict_credentials: true,
            ..settings_with(false, &[("merchant_id_de", "K1")])
        };
        let result = RequestContext::new(&settings, &RequestArguments::for_country("de"), None);
        assert!(matches!(result, Err(ClientError::Misconfigured(msg)) if msg.contains("shared_secret_de")));
    }

    #[test]
    fn test_strict_mode_rejects_missing_country() {
        let settings = Settings { strict_credentials: true, ..Settings::default() };
        let result = RequestContext::new(&settings, &RequestArguments::default(), None);
        assert!(matches!(result, Err(ClientError::Misconfigured(_))));
    }

    #[test]
    fn test_strict_mode_accepts_complete_credentials() {
        let settings = Settings {
            strict_credentials: true,
            ..settings_with(false, &[("merchant_id_de", "K1"), ("shared_secret_de", "s")])
        };
        assert!(RequestContext::new(&settings, &RequestArguments::for_country("DE"), None).is_ok());
    }

    #[test]
    fn test_basic_auth_decodes_html_entities() {
        let expected = format!("Basic {}", STANDARD.encode("m:s&s"));
        assert_eq!(basic_auth("m", "s&amp;s"), expected);
        assert_eq!(basic_auth("m", "s&s"), expected);
    }

    #[test]
    fn test_basic_auth_numeric_entities() {
        assert_eq!(basic_auth("m", "a&#39;b&quot;c"), basic_auth("m", "a'b\"c"));
    }

    #[test]
    fn test_user_agent_contains_host_facts() {
        let host = HostInfo {
            platform_version: "6.6.2".to_owned(),
            site_url: "https://shop.example.com".to_owned(),
            commerce_version: "9.3.1".to_owned(),
            ..HostInfo::default()
        };
        let agent = user_agent(&host);
        assert!(agent.starts_with("WordPress/6.6.2; https://shop.example.com - WooCommerce: 9.3.1"));
        assert!(agent.contains(&format!("KP: {}", env!("CARGO_PKG_VERSION"))));
        assert!(agent.contains("Rust: "));
    }

    #[test]
    fn test_user_agent_filter_overrides() {
        let filter: UserAgentFilter = Arc::new(|agent| format!("{agent} - Custom"));
        let context = RequestContext::new(
            &Settings::default(),
            &RequestArguments::for_country("se"),
            Some(&filter),
        )
        .unwrap();
        assert!(context.user_agent().ends_with(" - Custom"));
    }

    #[test]
    fn test_url_for_joins_without_double_slash() {
        let context =
            RequestContext::new(&Settings::default(), &RequestArguments::for_country("se"), None)
                .unwrap();
        assert_eq!(
            context.url_for("/payments/v1/sessions"),
            "https://api.klarna.com/payments/v1/sessions"
        );
        assert_eq!(
            context.url_for("payments/v1/sessions"),
            "https://api.klarna.com/payments/v1/sessions"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = settings_with(false, &[("merchant_id_se", "K1"), ("shared_secret_se", "hunter2")]);
        let context =
            RequestContext::new(&settings, &RequestArguments::for_country("se"), None).unwrap();
        let debug = format!("{context:?}");
        assert!(debug.contains("K1"));
        assert!(!debug.contains("hunter2"));
    }
}
