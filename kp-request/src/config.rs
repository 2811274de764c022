//! Settings types.
//!
//! This module defines the TOML-deserializable settings a [`PaymentsClient`]
//! is built from. Settings are loaded once by the calling layer and passed in
//! explicitly; nothing in this crate reads global configuration.
//!
//! # Examples
//!
//! ```toml
//! testmode = true
//! send_product_urls = false
//! default_country = "SE"
//!
//! [credentials]
//! test_merchant_id_se = "PK01234_abcdef"
//! test_shared_secret_se = "sharedsecret"
//!
//! [host]
//! platform = "WordPress"
//! platform_version = "6.6.2"
//! site_url = "https://shop.example.com"
//! commerce = "WooCommerce"
//! commerce_version = "9.3.1"
//!
//! [transport]
//! timeout_secs = 30
//! ```
//!
//! [`PaymentsClient`]: crate::request::PaymentsClient

use std::{collections::HashMap, fmt, path::Path};

use serde::Deserialize;

use crate::{
    error::{ClientError, Result},
    transport::HttpConfig,
};

/// Provider domain used when none is configured.
pub const DEFAULT_DOMAIN: &str = "klarna.com";

/// Plugin settings, read-only after load.
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Route requests to the Klarna playground environment.
    #[serde(default)]
    pub testmode: bool,

    /// Include product and image URLs in outgoing order lines.
    #[serde(default)]
    pub send_product_urls: bool,

    /// Country used when a request does not name one.
    #[serde(default)]
    pub default_country: Option<String>,

    /// Fail construction when credentials are missing instead of sending
    /// requests with empty credentials.
    #[serde(default)]
    pub strict_credentials: bool,

    /// Provider domain (default: `klarna.com`).
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Credential settings keyed by `{test_}merchant_id_{country}` and
    /// `{test_}shared_secret_{country}`.
    #[serde(default)]
    pub credentials: HashMap<String, String>,

    /// Host platform facts embedded in the user agent.
    #[serde(default)]
    pub host: HostInfo,

    /// HTTP transport tuning.
    #[serde(default)]
    pub transport: HttpConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            testmode: false,
            send_product_urls: false,
            default_country: None,
            strict_credentials: false,
            domain: default_domain(),
            credentials: HashMap::new(),
            host: HostInfo::default(),
            transport: HttpConfig::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.credentials.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Settings")
            .field("testmode", &self.testmode)
            .field("send_product_urls", &self.send_product_urls)
            .field("default_country", &self.default_country)
            .field("strict_credentials", &self.strict_credentials)
            .field("domain", &self.domain)
            .field("credentials", &keys)
            .field("host", &self.host)
            .field("transport", &self.transport)
            .finish()
    }
}

impl Settings {
    /// Parses and validates settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if parsing or validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use kp_request::config::Settings;
    ///
    /// let settings = Settings::from_toml("testmode = true").unwrap();
    /// assert!(settings.testmode);
    /// assert_eq!(settings.domain, "klarna.com");
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let settings: Self = toml::from_str(toml_str)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid TOML settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if the file cannot be read or
    /// its content is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ClientError::InvalidConfig(format!("cannot read settings file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Validates settings values.
    ///
    /// The domain must be a bare host name (no scheme, path or whitespace)
    /// and transport timeouts must be within bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let domain = self.domain.as_str();
        if domain.is_empty() {
            return Err(ClientError::InvalidConfig("domain must not be empty".to_owned()));
        }
        if domain.contains("://")
            || domain.contains('/')
            || domain.chars().any(char::is_whitespace)
            || domain.starts_with('.')
        {
            return Err(ClientError::InvalidConfig(format!(
                "domain must be a bare host name, got: {domain}"
            )));
        }

        if let Some(country) = &self.default_country
            && !country.trim().is_empty()
            && !is_country_code(country.trim())
        {
            return Err(ClientError::InvalidConfig(format!(
                "default_country must be a two-letter code, got: {country}"
            )));
        }

        self.transport.validate()
    }

    /// Returns a credential setting, if configured.
    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }
}

fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_owned()
}

/// Facts about the host platform, embedded in the user agent.
#[derive(Debug, Clone, Deserialize)]
pub struct HostInfo {
    /// Host platform name.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Host platform version.
    #[serde(default)]
    pub platform_version: String,
    /// Public URL of the shop.
    #[serde(default)]
    pub site_url: String,
    /// E-commerce platform name.
    #[serde(default = "default_commerce")]
    pub commerce: String,
    /// E-commerce platform version.
    #[serde(default)]
    pub commerce_version: String,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            platform_version: String::new(),
            site_url: String::new(),
            commerce: default_commerce(),
            commerce_version: String::new(),
        }
    }
}

fn default_platform() -> String {
    "WordPress".to_owned()
}

fn default_commerce() -> String {
    "WooCommerce".to_owned()
}
