//! Per-country Klarna parameters.
//!
//! Klarna runs separate API deployments per region. European markets use the
//! default endpoint (`api.klarna.com`), North America uses `api-na` and
//! Oceania uses `api-oc`. The table also carries the purchase currency and
//! default locale used when a payload does not set them.

use std::{collections::HashMap, sync::LazyLock};

/// Region-specific parameters for one purchase country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryParams {
    /// Endpoint suffix appended to `api` (empty for the default region).
    pub endpoint: &'static str,
    /// ISO 4217 purchase currency.
    pub currency: &'static str,
    /// Default RFC 1766 locale.
    pub locale: &'static str,
}

impl CountryParams {
    const fn eu(currency: &'static str, locale: &'static str) -> Self {
        Self { endpoint: "", currency, locale }
    }

    const fn na(currency: &'static str, locale: &'static str) -> Self {
        Self { endpoint: "-na", currency, locale }
    }

    const fn oc(currency: &'static str, locale: &'static str) -> Self {
        Self { endpoint: "-oc", currency, locale }
    }
}

/// Country table keyed by lowercase ISO 3166-1 alpha-2 code.
pub static COUNTRY_PARAMS: LazyLock<HashMap<&'static str, CountryParams>> = LazyLock::new(|| {
    HashMap::from([
        ("at", CountryParams::eu("EUR", "de-AT")),
        ("be", CountryParams::eu("EUR", "nl-BE")),
        ("ch", CountryParams::eu("CHF", "de-CH")),
        ("cz", CountryParams::eu("CZK", "cs-CZ")),
        ("de", CountryParams::eu("EUR", "de-DE")),
        ("dk", CountryParams::eu("DKK", "da-DK")),
        ("es", CountryParams::eu("EUR", "es-ES")),
        ("fi", CountryParams::eu("EUR", "fi-FI")),
        ("fr", CountryParams::eu("EUR", "fr-FR")),
        ("gb", CountryParams::eu("GBP", "en-GB")),
        ("gr", CountryParams::eu("EUR", "el-GR")),
        ("hu", CountryParams::eu("HUF", "hu-HU")),
        ("ie", CountryParams::eu("EUR", "en-IE")),
        ("it", CountryParams::eu("EUR", "it-IT")),
        ("nl", CountryParams::eu("EUR", "nl-NL")),
        ("no", CountryParams::eu("NOK", "nb-NO")),
        ("pl", CountryParams::eu("PLN", "pl-PL")),
        ("pt", CountryParams::eu("EUR", "pt-PT")),
        ("ro", CountryParams::eu("RON", "ro-RO")),
        ("se", CountryParams::eu("SEK", "sv-SE")),
        ("us", CountryParams::na("USD", "en-US")),
        ("ca", CountryParams::na("CAD", "en-CA")),
        ("mx", CountryParams::na("MXN", "es-MX")),
        ("au", CountryParams::oc("AUD", "en-AU")),
        ("nz", CountryParams::oc("NZD", "en-NZ")),
    ])
});

/// Looks up the parameters for a country code, case-insensitively.
///
/// Unknown codes return `None`; callers fall back to the default region.
///
/// # Examples
///
/// ```
/// use kp_request::country::lookup;
///
/// assert_eq!(lookup("US").map(|p| p.endpoint), Some("-na"));
/// assert_eq!(lookup("se").map(|p| p.endpoint), Some(""));
/// assert!(lookup("zz").is_none());
/// ```
pub fn lookup(country: &str) -> Option<&'static CountryParams> {
    COUNTRY_PARAMS.get(country.trim().to_lowercase().as_str())
}

/// Returns the endpoint suffix for a country, or `""` for the default region.
pub fn endpoint_suffix(country: Option<&str>) -> &'static str {
    country.and_then(lookup).map_or("", |params| params.endpoint)
}
