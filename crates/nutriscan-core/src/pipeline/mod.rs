//! The submission pipeline.
//!
//! A [`PipelineController`] takes a [`Submission`] through
//! `Idle → Validating → Requesting → Streaming → Completed`, or to `Failed`
//! from validation, stream opening or a terminal stream error. Every state
//! entry and every fragment received while streaming replaces the single
//! current [`Output`] held by the [`DisplaySink`].
//!
//! Submitting again while a run is in flight cancels that run. Once a newer
//! run has started, values from the older one are never published.

mod controller;
pub mod messages;
mod output;
mod run;
mod state;
mod submission;

pub use self::controller::{PipelineController, RunHandle};
pub use self::output::{DisplaySink, Output, OutputKind, OutputSlot};
pub use self::run::{RunOutcome, RunReport};
pub use self::state::PipelineState;
pub use self::submission::Submission;
