//! Sink that records every published value.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::pipeline::{DisplaySink, Output, PipelineState};

/// Display sink that keeps the full publish history.
///
/// Clones share the history, so a test can hand one clone to the
/// controller and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    outputs: Arc<Mutex<Vec<Output>>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every published value, oldest first.
    pub fn outputs(&self) -> Vec<Output> {
        self.lock().clone()
    }

    /// Returns the published bodies, oldest first.
    pub fn bodies(&self) -> Vec<String> {
        self.lock().iter().map(|output| output.body.clone()).collect()
    }

    /// Returns the states seen, collapsing consecutive repeats.
    pub fn states(&self) -> Vec<PipelineState> {
        let mut states: Vec<PipelineState> = Vec::new();
        for output in self.lock().iter() {
            if states.last() != Some(&output.state) {
                states.push(output.state);
            }
        }
        states
    }

    /// Returns the most recent value.
    pub fn last(&self) -> Option<Output> {
        self.lock().last().cloned()
    }

    /// Returns the number of publishes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing was published.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forgets the recorded history.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Output>> {
        self.outputs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplaySink for RecordingSink {
    fn publish(&self, output: Output) {
        self.lock().push(output);
    }
}
