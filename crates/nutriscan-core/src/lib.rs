#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for image decoding.
pub const TRACING_TARGET_IMAGE: &str = "nutriscan_core::image";

/// Tracing target for model stream operations.
pub const TRACING_TARGET_STREAM: &str = "nutriscan_core::stream";

/// Tracing target for markup rendering.
pub const TRACING_TARGET_RENDER: &str = "nutriscan_core::render";

/// Tracing target for pipeline runs.
pub const TRACING_TARGET_PIPELINE: &str = "nutriscan_core::pipeline";

mod error;

pub mod image;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod pipeline;
#[doc(hidden)]
pub mod prelude;
pub mod render;
pub mod request;
pub mod stream;

pub use error::{BoxedError, Error, Result, StreamFailure, TransportError, TransportKind};
