//! Commonly used items from nutriscan-gemini.

pub use crate::client::{GeminiBuilder, GeminiClient, GeminiConfig, GeminiCredentials};
pub use crate::error::{Error, Result};
pub use crate::provider::GeminiProvider;
