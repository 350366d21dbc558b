//! Buffer plus converter.

use std::fmt;
use std::sync::Arc;

use super::{MarkdownConverter, MarkupConverter, RenderBuffer};
use crate::stream::StreamFragment;
use crate::{StreamFailure, TRACING_TARGET_RENDER};

/// Sanitised markup derived from the buffer at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    markup: String,
    fragment_count: usize,
    buffer_len: usize,
}

impl RenderSnapshot {
    /// Returns the rendered markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Consumes the snapshot and returns the markup.
    pub fn into_markup(self) -> String {
        self.markup
    }

    /// Returns how many fragments the snapshot covers.
    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    /// Returns the size of the rendered buffer in bytes.
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }
}

impl fmt::Display for RenderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.markup)
    }
}

/// Accumulates fragments in arrival order and re-renders after each one.
#[derive(Clone)]
pub struct IncrementalRenderer {
    buffer: RenderBuffer,
    converter: Arc<dyn MarkupConverter>,
    invalid_reported: usize,
}

impl fmt::Debug for IncrementalRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalRenderer")
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl Default for IncrementalRenderer {
    fn default() -> Self {
        Self::new(Arc::new(MarkdownConverter::new()))
    }
}

impl IncrementalRenderer {
    /// Creates a renderer with an empty buffer.
    pub fn new(converter: Arc<dyn MarkupConverter>) -> Self {
        Self {
            buffer: RenderBuffer::new(),
            converter,
            invalid_reported: 0,
        }
    }

    /// Appends the fragment, then renders the whole buffer.
    ///
    /// The fragment is appended even when rendering fails, so a later
    /// fragment can complete what this one left malformed. Invalid bytes
    /// fail only the fragment that introduced them; later renders skip them.
    pub fn on_fragment(&mut self, fragment: &StreamFragment) -> Result<RenderSnapshot, StreamFailure> {
        self.buffer.append(fragment);
        let result = self.render_appended();

        if let Err(failure) = &result {
            tracing::debug!(
                target: TRACING_TARGET_RENDER,
                fragment_index = self.buffer.fragment_count() - 1,
                buffer_len = self.buffer.len(),
                error = %failure,
                "Buffer not renderable yet"
            );
        }

        result
    }

    /// Renders the current buffer without modifying it.
    pub fn render(&self) -> Result<RenderSnapshot, StreamFailure> {
        let decoded = self.buffer.decode()?;
        self.snapshot(decoded.as_str())
    }

    fn render_appended(&mut self) -> Result<RenderSnapshot, StreamFailure> {
        let decoded = self.buffer.decode()?;

        let invalid = decoded.invalid_offsets();
        if let Some(&valid_up_to) = invalid.get(self.invalid_reported) {
            self.invalid_reported = invalid.len();
            return Err(StreamFailure::InvalidUtf8 { valid_up_to });
        }

        self.snapshot(decoded.as_str())
    }

    fn snapshot(&self, text: &str) -> Result<RenderSnapshot, StreamFailure> {
        let markup = self.converter.convert(text)?;

        Ok(RenderSnapshot {
            markup,
            fragment_count: self.buffer.fragment_count(),
            buffer_len: self.buffer.len(),
        })
    }

    /// Returns the buffer.
    pub fn buffer(&self) -> &RenderBuffer {
        &self.buffer
    }

    /// Empties the buffer for a new run.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.invalid_reported = 0;
    }
}
