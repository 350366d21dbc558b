//! Pipeline lifecycle states.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Lifecycle state of a single run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, IntoStaticStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineState {
    /// Nothing submitted yet; buffer and output reset.
    Idle,
    /// Checking that both images are present.
    Validating,
    /// Opening the generation stream.
    Requesting,
    /// Receiving and rendering fragments.
    Streaming,
    /// The stream ended naturally.
    Completed,
    /// Validation or transport failed.
    Failed,
}

impl PipelineState {
    /// Returns true for states that end a run.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the run may move from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Validating)
                | (Self::Validating, Self::Failed | Self::Requesting)
                | (Self::Requesting, Self::Failed | Self::Streaming)
                | (Self::Streaming, Self::Completed | Self::Failed)
        )
    }
}
