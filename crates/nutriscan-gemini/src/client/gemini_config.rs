//! Gemini client configuration
//!
//! This module provides configuration structures and builders for the Gemini client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use url::Url;

use crate::error::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Gemini REST API base URL.
    pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

    /// Default model for label analysis.
    pub const MODEL: &str = "gemini-1.5-flash";

    /// Default request timeout in seconds, covering the whole stream.
    pub const TIMEOUT_SECS: u64 = 120;

    /// Default connection timeout in seconds.
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Configuration for the Gemini client
///
/// Contains the endpoint, the model and the timeouts of the streaming
/// session. The request timeout bounds the whole stream, not a single chunk.
#[derive(Debug, Clone, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[builder(
    name = "GeminiBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct GeminiConfig {
    /// Base URL of the Gemini REST API
    #[builder(setter(custom), default = "GeminiConfig::default_base_url()")]
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-base-url", env = "GEMINI_BASE_URL", default_value = defaults::BASE_URL)
    )]
    pub base_url: Url,

    /// Model used for generation
    #[builder(default = "defaults::MODEL.to_owned()")]
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-model", env = "GEMINI_MODEL", default_value = defaults::MODEL)
    )]
    pub model: String,

    /// Request timeout in seconds
    #[builder(default = "defaults::TIMEOUT_SECS")]
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-timeout-secs", env = "GEMINI_TIMEOUT_SECS", default_value_t = defaults::TIMEOUT_SECS)
    )]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[builder(default = "defaults::CONNECT_TIMEOUT_SECS")]
    #[cfg_attr(
        feature = "config",
        arg(
            long = "gemini-connect-timeout-secs",
            env = "GEMINI_CONNECT_TIMEOUT_SECS",
            default_value_t = defaults::CONNECT_TIMEOUT_SECS
        )
    )]
    pub connect_timeout_secs: u64,

    /// User agent string for requests
    #[builder(default = "GeminiConfig::default_user_agent()")]
    #[cfg_attr(feature = "config", arg(skip = GeminiConfig::default_user_agent()))]
    pub user_agent: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: defaults::MODEL.to_owned(),
            timeout_secs: defaults::TIMEOUT_SECS,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
            user_agent: Self::default_user_agent(),
        }
    }
}

impl GeminiConfig {
    /// Create a new configuration builder
    pub fn builder() -> GeminiBuilder {
        GeminiBuilder::default()
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the server-sent events endpoint of the configured model.
    pub fn stream_endpoint(&self) -> Result<Url> {
        let mut url = with_trailing_slash(self.base_url.clone())
            .join(&format!("models/{}:streamGenerateContent", self.model))
            .map_err(|e| Error::invalid_config(format!("Invalid endpoint URL: {e}")))?;
        url.query_pairs_mut().append_pair("alt", "sse");
        Ok(url)
    }

    /// Checks values that may come from flags or the environment.
    pub fn validate(&self) -> Result<()> {
        check_model(&self.model)
            .and_then(|()| check_timeouts(Some(self.timeout_secs), Some(self.connect_timeout_secs)))
            .map_err(Error::Config)
    }

    fn default_base_url() -> Url {
        Url::parse(defaults::BASE_URL).expect("Valid default URL")
    }

    fn default_user_agent() -> String {
        format!("nutriscan-gemini/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl GeminiBuilder {
    /// Set the base URL for the Gemini API
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::invalid_config(format!("Invalid base URL '{url}': {e}")))?;
        self.base_url = Some(with_trailing_slash(parsed));
        Ok(self)
    }

    fn validate_config(&self) -> std::result::Result<(), String> {
        if let Some(model) = &self.model {
            check_model(model)?;
        }

        check_timeouts(self.timeout_secs, self.connect_timeout_secs)
    }
}

impl From<GeminiBuilderError> for Error {
    fn from(error: GeminiBuilderError) -> Self {
        Self::invalid_config(error.to_string())
    }
}

fn check_model(model: &str) -> std::result::Result<(), String> {
    if model.trim().is_empty() {
        return Err("Model must not be empty".to_string());
    }

    Ok(())
}

fn check_timeouts(
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
) -> std::result::Result<(), String> {
    if timeout_secs == Some(0) {
        return Err("Timeout must be greater than 0".to_string());
    }

    if connect_timeout_secs == Some(0) {
        return Err("Connect timeout must be greater than 0".to_string());
    }

    Ok(())
}

/// Keeps the last path segment of the base URL when joining.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();

        assert_eq!(
            config.base_url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/"
        );
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.user_agent.starts_with("nutriscan-gemini/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stream_endpoint() {
        let config = GeminiConfig::default();

        assert_eq!(
            config.stream_endpoint().unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_custom_base_url_without_slash() {
        let config = GeminiConfig::builder()
            .with_base_url("http://localhost:8080/v1")
            .expect("Valid URL")
            .with_model("gemini-2.0-flash")
            .build()
            .expect("Valid config");

        assert_eq!(
            config.stream_endpoint().unwrap().as_str(),
            "http://localhost:8080/v1/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(GeminiConfig::builder().with_base_url("not-a-valid-url").is_err());
    }

    #[test]
    fn test_validation() {
        assert!(GeminiConfig::builder().with_timeout_secs(0_u64).build().is_err());
        assert!(GeminiConfig::builder().with_model("  ").build().is_err());

        let config = GeminiConfig {
            connect_timeout_secs: 0,
            ..GeminiConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
