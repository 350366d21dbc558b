//! The single "current output" slot and the sinks that display it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};
use tokio::sync::watch;
use uuid::Uuid;

use super::{PipelineState, messages};

/// What an output value holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputKind {
    /// Plain status text.
    Status,
    /// Sanitised markup rendered from the buffer.
    Markup,
    /// A per-fragment render failure shown in place of the markup.
    Diagnostic,
    /// The message of a failed run.
    Error,
}

/// A displayable value published to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Run that published the value; nil before the first run.
    pub run_id: Uuid,
    /// State the run was in when publishing.
    pub state: PipelineState,
    /// Kind of the body.
    pub kind: OutputKind,
    /// Markup or plain text.
    pub body: String,
}

impl Output {
    /// Creates an output value.
    pub fn new(run_id: Uuid, state: PipelineState, kind: OutputKind, body: impl Into<String>) -> Self {
        Self {
            run_id,
            state,
            kind,
            body: body.into(),
        }
    }

    /// The placeholder shown before any submission.
    pub fn idle() -> Self {
        Self::new(
            Uuid::nil(),
            PipelineState::Idle,
            OutputKind::Status,
            messages::IDLE,
        )
    }

    /// Returns true if the body is markup rather than plain text.
    pub fn is_markup(&self) -> bool {
        self.kind == OutputKind::Markup
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::idle()
    }
}

/// Receives the current output value.
///
/// Each publish replaces the previous value; sinks keep no history on
/// behalf of the pipeline. `publish` runs while the controller holds its
/// publication lock, so it must not call back into the controller.
pub trait DisplaySink: Send + Sync {
    /// Replaces the displayed value.
    fn publish(&self, output: Output);
}

/// Watchable slot holding the one visible output value.
#[derive(Debug, Clone)]
pub struct OutputSlot {
    sender: Arc<watch::Sender<Output>>,
}

impl Default for OutputSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSlot {
    /// Creates a slot showing the idle placeholder.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Output::idle());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns a copy of the current value.
    pub fn current(&self) -> Output {
        self.sender.borrow().clone()
    }

    /// Subscribes to changes of the value.
    pub fn subscribe(&self) -> watch::Receiver<Output> {
        self.sender.subscribe()
    }
}

impl DisplaySink for OutputSlot {
    fn publish(&self, output: Output) {
        self.sender.send_replace(output);
    }
}
