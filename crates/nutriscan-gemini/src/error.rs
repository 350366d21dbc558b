//! Error types for nutriscan-gemini.

use nutriscan_core::{TransportError, TransportKind};
use thiserror::Error;

/// Error type for the nutriscan-gemini library.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport errors from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an API error.
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Converts the error into the pipeline's transport error.
    pub fn into_transport(self) -> TransportError {
        match self {
            Self::Http(error) => {
                let kind = if error.is_timeout() {
                    TransportKind::Timeout
                } else if error.is_decode() {
                    TransportKind::InvalidResponse
                } else if error.is_builder() {
                    TransportKind::InvalidRequest
                } else {
                    TransportKind::Network
                };

                let transport = TransportError::new(kind).with_message(error.to_string());
                match error.status() {
                    Some(status) => transport.with_status(status.as_u16()).with_source(error),
                    None => transport.with_source(error),
                }
            }
            Self::Json(error) => TransportError::invalid_response()
                .with_message(error.to_string())
                .with_source(error),
            Self::Api { status, message } => TransportError::from_status(status).with_message(message),
            Self::Config(message) => TransportError::invalid_request().with_message(message),
        }
    }
}

impl From<Error> for TransportError {
    fn from(error: Error) -> Self {
        error.into_transport()
    }
}

impl From<Error> for nutriscan_core::Error {
    fn from(error: Error) -> Self {
        Self::Transport(error.into_transport())
    }
}

/// Result type alias for nutriscan-gemini operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
