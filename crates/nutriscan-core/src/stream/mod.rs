//! Generation sessions and their fragment streams.
//!
//! A [`GenerativeModel`] opens one streaming session per request.
//! [`StreamConsumer`] wraps any model with structured logging and forwards
//! fragments exactly as received: no reordering, no deduplication.

mod consumer;
mod fragment;

use futures::stream::BoxStream;

pub use self::consumer::StreamConsumer;
pub use self::fragment::StreamFragment;
use crate::Result;
use crate::request::AnalysisRequest;

/// Lazy, ordered, finite sequence of fragments.
///
/// An `Err(Error::Stream(_))` item is a non-fatal, per-chunk failure; any
/// other error terminates the stream.
pub type FragmentStream = BoxStream<'static, Result<StreamFragment>>;

/// A multimodal text-generation service.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Opens a streaming generation session for the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the session
    /// cannot be opened (authentication, network, quota).
    async fn open_stream(&self, request: &AnalysisRequest) -> Result<FragmentStream>;

    /// Returns the model identifier used for logging.
    fn model_name(&self) -> &str;
}
