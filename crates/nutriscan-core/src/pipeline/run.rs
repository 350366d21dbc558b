//! A single pass through the pipeline state machine.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use jiff::{SignedDuration, Timestamp};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::controller::Publisher;
use super::{Output, OutputKind, PipelineState, Submission, messages};
use crate::render::{IncrementalRenderer, MarkupConverter};
use crate::stream::{StreamConsumer, StreamFragment};
use crate::{Error, StreamFailure, TRACING_TARGET_PIPELINE};

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The stream ended naturally.
    Completed,
    /// Validation or transport failed.
    Failed(Error),
    /// The run was superseded or stopped before reaching a terminal state.
    Cancelled,
}

impl RunOutcome {
    /// Returns true if the stream ended naturally.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the error of a failed run.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// Identifier of the request, once one was assembled.
    pub request_id: Option<Uuid>,
    /// Every state the run entered, in order.
    pub states: Vec<PipelineState>,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Fragments received.
    pub fragments: usize,
    /// Fragments after which the buffer could not be rendered.
    pub render_failures: usize,
    /// Chunks the service reported as failed.
    pub chunk_failures: usize,
    /// Final buffer content.
    pub buffer: Bytes,
    /// The last value the run published, if it was allowed to publish.
    pub output: Option<Output>,
    /// Wall time from submission to the end of the run.
    pub elapsed: SignedDuration,
}

impl RunReport {
    /// Returns the last state the run entered.
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }

    /// Returns the buffer as text, replacing invalid sequences.
    pub fn buffer_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }
}

/// Mutable state of one run: current state, buffer and current output.
pub(crate) struct Run {
    id: Uuid,
    state: PipelineState,
    states: Vec<PipelineState>,
    renderer: IncrementalRenderer,
    current_output: Option<Output>,
    consumer: StreamConsumer,
    publisher: Publisher,
    cancel: CancellationToken,
    request_id: Option<Uuid>,
    fragments: usize,
    render_failures: usize,
    chunk_failures: usize,
    started_at: Timestamp,
}

impl Run {
    pub(crate) fn new(
        consumer: StreamConsumer,
        converter: Arc<dyn MarkupConverter>,
        publisher: Publisher,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: publisher.run_id(),
            state: PipelineState::Idle,
            states: Vec::with_capacity(5),
            renderer: IncrementalRenderer::new(converter),
            current_output: None,
            consumer,
            publisher,
            cancel,
            request_id: None,
            fragments: 0,
            render_failures: 0,
            chunk_failures: 0,
            started_at: Timestamp::now(),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Drives the run to a terminal state or until cancelled.
    pub(crate) async fn execute(mut self, submission: Submission) -> RunReport {
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            run_id = %self.id,
            model = self.consumer.model_name(),
            "Starting run"
        );

        let outcome = self.drive(submission).await;
        self.finish(outcome)
    }

    async fn drive(&mut self, submission: Submission) -> RunOutcome {
        let cancel = self.cancel.clone();

        self.renderer.reset();
        self.enter(PipelineState::Idle, OutputKind::Status, messages::IDLE);
        if cancel.is_cancelled() {
            return RunOutcome::Cancelled;
        }

        self.enter(PipelineState::Validating, OutputKind::Status, messages::PENDING);
        let request = match submission.into_builder().build() {
            Ok(request) => request,
            Err(error) => return self.fail(error, messages::INCOMPLETE_SUBMISSION.to_owned()),
        };
        self.request_id = Some(request.request_id());

        self.enter(PipelineState::Requesting, OutputKind::Status, messages::PENDING);
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => return RunOutcome::Cancelled,
            result = self.consumer.open(&request) => result,
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(error) => {
                let body = messages::failure(&error);
                return self.fail(error, body);
            }
        };

        self.renderer.reset();
        self.enter(PipelineState::Streaming, OutputKind::Markup, String::new());

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return RunOutcome::Cancelled,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(fragment)) => self.on_fragment(&fragment),
                Some(Err(Error::Stream(failure))) => self.on_chunk_failure(&failure),
                Some(Err(error)) => {
                    let body = messages::failure(&error);
                    return self.fail(error, body);
                }
                None => break,
            }
        }

        self.complete()
    }

    fn on_fragment(&mut self, fragment: &StreamFragment) {
        self.fragments += 1;

        match self.renderer.on_fragment(fragment) {
            Ok(snapshot) => {
                self.publish(OutputKind::Markup, snapshot.into_markup());
            }
            Err(failure) => {
                self.render_failures += 1;
                self.publish(OutputKind::Diagnostic, messages::diagnostic(&failure));
            }
        }
    }

    fn on_chunk_failure(&mut self, failure: &StreamFailure) {
        self.chunk_failures += 1;
        self.publish(OutputKind::Diagnostic, messages::diagnostic(failure));
    }

    fn complete(&mut self) -> RunOutcome {
        match self.renderer.render() {
            Ok(snapshot) => {
                self.enter(PipelineState::Completed, OutputKind::Markup, snapshot.into_markup());
            }
            Err(failure) => {
                self.enter(
                    PipelineState::Completed,
                    OutputKind::Diagnostic,
                    messages::diagnostic(&failure),
                );
            }
        }

        RunOutcome::Completed
    }

    fn fail(&mut self, error: Error, body: String) -> RunOutcome {
        tracing::warn!(
            target: TRACING_TARGET_PIPELINE,
            run_id = %self.id,
            state = %self.state,
            error = %error,
            "Run failed"
        );

        self.enter(PipelineState::Failed, OutputKind::Error, body);
        RunOutcome::Failed(error)
    }

    /// Moves to `next` and publishes the value that comes with it.
    fn enter(&mut self, next: PipelineState, kind: OutputKind, body: impl Into<String>) {
        debug_assert!(
            self.states.is_empty() || self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );

        tracing::debug!(
            target: TRACING_TARGET_PIPELINE,
            run_id = %self.id,
            from = %self.state,
            to = %next,
            "State transition"
        );

        self.state = next;
        self.states.push(next);
        self.publish(kind, body);
    }

    fn publish(&mut self, kind: OutputKind, body: impl Into<String>) {
        let output = Output::new(self.id, self.state, kind, body);
        if self.publisher.publish(output.clone()) {
            self.current_output = Some(output);
        }
    }

    fn finish(mut self, outcome: RunOutcome) -> RunReport {
        self.publisher.release();

        let elapsed = Timestamp::now().duration_since(self.started_at);
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            run_id = %self.id,
            state = %self.state,
            cancelled = outcome.is_cancelled(),
            fragments = self.fragments,
            render_failures = self.render_failures,
            chunk_failures = self.chunk_failures,
            buffer_len = self.renderer.buffer().len(),
            elapsed_ms = elapsed.as_millis(),
            "Run finished"
        );

        RunReport {
            run_id: self.id,
            request_id: self.request_id,
            states: std::mem::take(&mut self.states),
            outcome,
            fragments: self.fragments,
            render_failures: self.render_failures,
            chunk_failures: self.chunk_failures,
            buffer: Bytes::copy_from_slice(self.renderer.buffer().as_bytes()),
            output: self.current_output.take(),
            elapsed,
        }
    }
}

/// Clears the busy flag even when the run future is dropped mid-flight.
impl Drop for Run {
    fn drop(&mut self) {
        self.publisher.release();
    }
}
