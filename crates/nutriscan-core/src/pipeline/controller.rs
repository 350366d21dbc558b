//! Run lifecycle: supersession, cancellation and gated publishing.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::run::Run;
use super::{DisplaySink, Output, RunReport, Submission};
use crate::TRACING_TARGET_PIPELINE;
use crate::render::{MarkdownConverter, MarkupConverter};
use crate::stream::{GenerativeModel, StreamConsumer};

/// Bookkeeping for the one run allowed to publish.
#[derive(Debug, Default)]
struct ActiveRun {
    generation: u64,
    run_id: Option<Uuid>,
    cancel: Option<CancellationToken>,
}

type SharedActiveRun = Arc<Mutex<ActiveRun>>;

fn lock(active: &Mutex<ActiveRun>) -> MutexGuard<'_, ActiveRun> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publishes on behalf of one run while that run is still current.
///
/// The generation check and the sink call happen under the same lock the
/// controller takes to start or cancel a run, so no value from a
/// superseded run can land after its successor's first value.
#[derive(Clone)]
pub(crate) struct Publisher {
    sink: Arc<dyn DisplaySink>,
    active: SharedActiveRun,
    generation: u64,
    run_id: Uuid,
}

impl Publisher {
    pub(crate) fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Publishes the value if the run is still current.
    pub(crate) fn publish(&self, output: Output) -> bool {
        let active = lock(&self.active);
        if active.generation != self.generation {
            tracing::trace!(
                target: TRACING_TARGET_PIPELINE,
                run_id = %self.run_id,
                kind = ?output.kind,
                "Dropped output of superseded run"
            );
            return false;
        }

        self.sink.publish(output);
        true
    }

    /// Clears the busy flag if the run is still current.
    pub(crate) fn release(&self) {
        let mut active = lock(&self.active);
        if active.generation == self.generation {
            active.run_id = None;
            active.cancel = None;
        }
    }
}

/// Handle to a spawned run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Returns the run identifier.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Stops the run. Values it has already published stay visible.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the run has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run to end.
    ///
    /// # Errors
    ///
    /// Returns the join error if the run task panicked or was aborted.
    pub async fn wait(self) -> Result<RunReport, JoinError> {
        self.handle.await
    }
}

/// Drives submissions through the pipeline and owns the output slot.
///
/// At most one run is current at a time. Starting a run cancels the
/// previous one; from that point on the previous run can no longer publish.
#[derive(Clone)]
pub struct PipelineController {
    consumer: StreamConsumer,
    converter: Arc<dyn MarkupConverter>,
    sink: Arc<dyn DisplaySink>,
    active: SharedActiveRun,
}

impl fmt::Debug for PipelineController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineController")
            .field("consumer", &self.consumer)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl PipelineController {
    /// Creates a controller with the default markdown converter.
    pub fn new(consumer: StreamConsumer, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            consumer,
            converter: Arc::new(MarkdownConverter::new()),
            sink,
            active: SharedActiveRun::default(),
        }
    }

    /// Creates a controller from a model and a sink.
    pub fn with_model<M, S>(model: M, sink: S) -> Self
    where
        M: GenerativeModel + 'static,
        S: DisplaySink + 'static,
    {
        Self::new(StreamConsumer::new(model), Arc::new(sink))
    }

    /// Replaces the markup converter.
    pub fn with_converter(mut self, converter: Arc<dyn MarkupConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Returns true while a run is in flight.
    pub fn is_busy(&self) -> bool {
        lock(&self.active).run_id.is_some()
    }

    /// Returns the identifier of the run in flight.
    pub fn active_run(&self) -> Option<Uuid> {
        lock(&self.active).run_id
    }

    /// Starts a run on a background task, superseding any run in flight.
    pub fn submit(&self, submission: Submission) -> RunHandle {
        let (run, cancel) = self.prepare();
        let run_id = run.id();
        let handle = tokio::spawn(run.execute(submission));

        RunHandle {
            run_id,
            cancel,
            handle,
        }
    }

    /// Runs a submission on the current task, superseding any run in flight.
    pub async fn run(&self, submission: Submission) -> RunReport {
        let (run, _) = self.prepare();
        run.execute(submission).await
    }

    /// Cancels the run in flight, if any.
    ///
    /// Returns true if a run was cancelled.
    pub fn cancel(&self) -> bool {
        let mut active = lock(&self.active);
        let Some(cancel) = active.cancel.take() else {
            return false;
        };

        active.generation += 1;
        let run_id = active.run_id.take();
        cancel.cancel();

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            run_id = ?run_id,
            "Cancelled run"
        );

        true
    }

    fn prepare(&self) -> (Run, CancellationToken) {
        let run_id = Uuid::now_v7();
        let cancel = CancellationToken::new();

        let generation = {
            let mut active = lock(&self.active);
            if let Some(previous) = active.cancel.take() {
                previous.cancel();
                tracing::info!(
                    target: TRACING_TARGET_PIPELINE,
                    superseded = ?active.run_id,
                    run_id = %run_id,
                    "Superseding run in flight"
                );
            }

            active.generation += 1;
            active.run_id = Some(run_id);
            active.cancel = Some(cancel.clone());
            active.generation
        };

        let publisher = Publisher {
            sink: self.sink.clone(),
            active: self.active.clone(),
            generation,
            run_id,
        };

        let run = Run::new(
            self.consumer.clone(),
            self.converter.clone(),
            publisher,
            cancel.clone(),
        );

        (run, cancel)
    }
}
