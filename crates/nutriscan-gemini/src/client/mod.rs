//! Gemini client module.
//!
//! This module provides the HTTP client, its configuration and the API key
//! credentials.

mod credentials;
mod gemini_client;
mod gemini_config;

pub use credentials::GeminiCredentials;
pub use gemini_client::GeminiClient;
pub use gemini_config::{GeminiBuilder, GeminiConfig};
