//! Gemini client implementation
//!
//! This module provides the HTTP client that opens generation streams.

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client as HttpClient, ClientBuilder, Response};

use super::{GeminiConfig, GeminiCredentials};
use crate::wire::{ErrorResponse, GenerateContentRequest};
use crate::{Error, Result, TRACING_TARGET_CLIENT};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini client for the `streamGenerateContent` endpoint
///
/// The client owns a pooled HTTP client; cloning it is cheap.
///
/// # Examples
///
/// ```rust,ignore
/// use nutriscan_gemini::{GeminiClient, GeminiConfig, GeminiCredentials};
///
/// let config = GeminiConfig::builder()
///     .with_model("gemini-1.5-flash")
///     .build()?;
///
/// let client = GeminiClient::new(config, GeminiCredentials::from_env()?)?;
/// ```
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    config: GeminiConfig,
    credentials: GeminiCredentials,
}

impl GeminiClient {
    /// Create a new Gemini client with the given configuration and credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: GeminiConfig, credentials: GeminiCredentials) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            base_url = %config.base_url,
            model = %config.model,
            timeout_secs = config.timeout_secs,
            "Creating Gemini client"
        );

        let http_client = ClientBuilder::new()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            http_client,
            config,
            credentials,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Returns the configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends a streaming generation request.
    ///
    /// Resolves once the response headers arrive; the body is the event
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the request cannot be sent and
    /// [`Error::Api`] if the service answers with an error status.
    pub async fn stream_generate_content(&self, body: &GenerateContentRequest) -> Result<Response> {
        let url = self.config.stream_endpoint()?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            model = %self.config.model,
            parts = body.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
            "Sending streamGenerateContent request"
        );

        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, self.credentials.expose())
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(body)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                target: TRACING_TARGET_CLIENT,
                status = status.as_u16(),
                "Event stream accepted"
            );
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = ErrorResponse::message_from(&text).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

        tracing::error!(
            target: TRACING_TARGET_CLIENT,
            status = status.as_u16(),
            message = %message,
            "Generation request rejected"
        );

        Err(Error::api_error(status.as_u16(), message))
    }
}
