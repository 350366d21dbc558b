#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the main library
pub const TRACING_TARGET: &str = "nutriscan_gemini";

/// Tracing target for client operations
pub const TRACING_TARGET_CLIENT: &str = "nutriscan_gemini::client";

/// Tracing target for event stream decoding
pub const TRACING_TARGET_STREAM: &str = "nutriscan_gemini::stream";

mod client;
mod error;
#[doc(hidden)]
pub mod prelude;
mod provider;
pub mod sse;
pub mod wire;

pub use crate::client::{GeminiBuilder, GeminiClient, GeminiConfig, GeminiCredentials};
pub use crate::error::{Error, Result};
pub use crate::provider::GeminiProvider;
