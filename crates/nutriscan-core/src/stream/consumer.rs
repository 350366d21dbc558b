//! Model wrapper with observability.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use jiff::Timestamp;
use uuid::Uuid;

use super::{FragmentStream, GenerativeModel, StreamFragment};
use crate::request::AnalysisRequest;
use crate::{Error, Result, TRACING_TARGET_STREAM};

/// Opens generation sessions and exposes them as fragment streams.
///
/// The inner model is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct StreamConsumer {
    model: Arc<dyn GenerativeModel>,
}

impl fmt::Debug for StreamConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConsumer")
            .field("model", &self.model.model_name())
            .finish()
    }
}

impl StreamConsumer {
    /// Creates a consumer from a model.
    pub fn new<M>(model: M) -> Self
    where
        M: GenerativeModel + 'static,
    {
        Self {
            model: Arc::new(model),
        }
    }

    /// Creates a consumer from a shared model.
    pub fn from_shared(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Returns the model identifier.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Opens a session for the request.
    ///
    /// The returned stream suspends between fragments and ends either
    /// naturally or with a terminal error item.
    pub async fn open(&self, request: &AnalysisRequest) -> Result<FragmentStream> {
        let started_at = Timestamp::now();

        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            request_id = %request.request_id(),
            model = self.model.model_name(),
            image_count = request.image_count(),
            payload_size = request.payload_size(),
            "Opening generation stream"
        );

        let result = self.model.open_stream(request).await;
        let elapsed = Timestamp::now().duration_since(started_at);

        match result {
            Ok(stream) => {
                tracing::debug!(
                    target: TRACING_TARGET_STREAM,
                    request_id = %request.request_id(),
                    elapsed_ms = elapsed.as_millis(),
                    "Generation stream opened"
                );

                Ok(ObservedStream::new(request.request_id(), stream).boxed())
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_STREAM,
                    request_id = %request.request_id(),
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Failed to open generation stream"
                );

                Err(error)
            }
        }
    }
}

/// Fragment stream that logs each item and the stream totals.
struct ObservedStream {
    request_id: Uuid,
    inner: FragmentStream,
    started_at: Timestamp,
    fragments: usize,
    bytes: usize,
    failures: usize,
    finished: bool,
}

impl ObservedStream {
    fn new(request_id: Uuid, inner: FragmentStream) -> Self {
        Self {
            request_id,
            inner,
            started_at: Timestamp::now(),
            fragments: 0,
            bytes: 0,
            failures: 0,
            finished: false,
        }
    }

    fn observe(&mut self, item: &Result<StreamFragment>) {
        match item {
            Ok(fragment) => {
                self.fragments += 1;
                self.bytes += fragment.len();

                tracing::trace!(
                    target: TRACING_TARGET_STREAM,
                    request_id = %self.request_id,
                    fragment_index = self.fragments - 1,
                    fragment_len = fragment.len(),
                    "Received fragment"
                );
            }
            Err(Error::Stream(failure)) => {
                self.failures += 1;

                tracing::warn!(
                    target: TRACING_TARGET_STREAM,
                    request_id = %self.request_id,
                    error = %failure,
                    "Received failed chunk"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_STREAM,
                    request_id = %self.request_id,
                    error = %error,
                    fragments = self.fragments,
                    "Generation stream terminated abnormally"
                );
            }
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }

        self.finished = true;
        let elapsed = Timestamp::now().duration_since(self.started_at);

        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            request_id = %self.request_id,
            fragments = self.fragments,
            bytes = self.bytes,
            failures = self.failures,
            elapsed_ms = elapsed.as_millis(),
            "Generation stream ended"
        );
    }
}

impl Stream for ObservedStream {
    type Item = Result<StreamFragment>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(item)) => {
                self.observe(&item);
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                self.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
