//! Authentication credentials for Gemini
//!
//! The Gemini REST API authenticates every request with an API key sent in
//! the `x-goog-api-key` header.

use std::fmt;

use crate::error::{Error, Result};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Value shipped in sample configurations in place of a real key.
const PLACEHOLDER_KEY: &str = "Your API Key";

/// API key credentials for the Gemini service
///
/// The key never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiCredentials {
    api_key: String,
}

impl GeminiCredentials {
    /// Create credentials from an API key
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is empty or still the
    /// sample placeholder.
    pub fn api_key(key: impl Into<String>) -> Result<Self> {
        let api_key = key.into().trim().to_owned();

        if api_key.is_empty() {
            return Err(Error::invalid_config("Gemini API key is empty"));
        }

        if api_key.eq_ignore_ascii_case(PLACEHOLDER_KEY) {
            return Err(Error::invalid_config(
                "Gemini API key is still the placeholder value; set a real key",
            ));
        }

        Ok(Self { api_key })
    }

    /// Read the API key from `GEMINI_API_KEY`
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::invalid_config(format!("{API_KEY_ENV} is not set")))?;
        Self::api_key(key)
    }

    /// Returns the key for the request header.
    pub(crate) fn expose(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for GeminiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiCredentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_trimmed() {
        let credentials = GeminiCredentials::api_key("  secret-key \n").unwrap();
        assert_eq!(credentials.expose(), "secret-key");
    }

    #[test]
    fn test_rejects_empty_and_placeholder() {
        assert!(matches!(GeminiCredentials::api_key(""), Err(Error::Config(_))));
        assert!(matches!(
            GeminiCredentials::api_key("Your API Key"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let credentials = GeminiCredentials::api_key("secret-key").unwrap();
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("REDACTED"));
    }
}
