//! Scripted generative model.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use uuid::Uuid;

use crate::request::AnalysisRequest;
use crate::stream::{FragmentStream, GenerativeModel, StreamFragment};
use crate::{Error, Result, StreamFailure, TransportError, TransportKind};

/// A transport error description that can be replayed on every open.
#[derive(Debug, Clone)]
struct ScriptedTransport {
    kind: TransportKind,
    status: Option<u16>,
    message: Option<String>,
}

impl ScriptedTransport {
    fn from_error(error: &TransportError) -> Self {
        Self {
            kind: error.kind,
            status: error.status,
            message: error.message.clone(),
        }
    }

    fn to_error(&self) -> Error {
        let mut error = TransportError::new(self.kind);
        error.status = self.status;
        error.message = self.message.clone();
        Error::Transport(error)
    }
}

#[derive(Debug, Clone)]
enum Step {
    Fragment(Bytes),
    Failure(StreamFailure),
    Terminate(ScriptedTransport),
    Delay(Duration),
    Hold,
}

#[derive(Debug, Clone, Default)]
struct Script {
    open_failure: Option<ScriptedTransport>,
    open_delay: Option<Duration>,
    steps: Vec<Step>,
}

/// Generative model that replays a fixed script on every open.
///
/// Clones share the open counter and the recorded requests.
#[derive(Clone, Default)]
pub struct MockModel {
    script: Arc<Script>,
    opens: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Uuid>>>,
}

impl fmt::Debug for MockModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockModel")
            .field("steps", &self.script.steps.len())
            .field("opens", &self.open_count())
            .finish()
    }
}

impl MockModel {
    /// Creates a model whose stream ends immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model that streams the given fragments, then ends.
    pub fn with_fragments<I, F>(fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<StreamFragment>,
    {
        fragments
            .into_iter()
            .fold(Self::new(), |model, fragment| model.fragment(fragment))
    }

    /// Creates a model that fails every open with the given error.
    pub fn failing_open(error: TransportError) -> Self {
        let mut model = Self::new();
        model.script_mut().open_failure = Some(ScriptedTransport::from_error(&error));
        model
    }

    /// Appends a fragment.
    pub fn fragment(mut self, fragment: impl Into<StreamFragment>) -> Self {
        let bytes = fragment.into().into_bytes();
        self.script_mut().steps.push(Step::Fragment(bytes));
        self
    }

    /// Appends a non-fatal chunk failure.
    pub fn chunk_failure(mut self, failure: StreamFailure) -> Self {
        self.script_mut().steps.push(Step::Failure(failure));
        self
    }

    /// Appends a terminal error; later steps are never reached.
    pub fn terminate(mut self, error: TransportError) -> Self {
        let step = Step::Terminate(ScriptedTransport::from_error(&error));
        self.script_mut().steps.push(step);
        self
    }

    /// Appends a pause before the next step.
    pub fn delay(mut self, duration: Duration) -> Self {
        self.script_mut().steps.push(Step::Delay(duration));
        self
    }

    /// Keeps the stream open forever after the preceding steps.
    pub fn hold_open(mut self) -> Self {
        self.script_mut().steps.push(Step::Hold);
        self
    }

    /// Pauses every open before it resolves.
    pub fn open_delay(mut self, duration: Duration) -> Self {
        self.script_mut().open_delay = Some(duration);
        self
    }

    /// Returns how many times a stream was opened.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Returns the identifiers of the requests received, in order.
    pub fn request_ids(&self) -> Vec<Uuid> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn script_mut(&mut self) -> &mut Script {
        Arc::make_mut(&mut self.script)
    }
}

#[async_trait::async_trait]
impl GenerativeModel for MockModel {
    async fn open_stream(&self, request: &AnalysisRequest) -> Result<FragmentStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.request_id());

        if let Some(delay) = self.script.open_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = &self.script.open_failure {
            return Err(failure.to_error());
        }

        let steps = self.script.steps.clone().into_iter();
        let stream = futures::stream::unfold(steps, |mut steps| async move {
            loop {
                match steps.next()? {
                    Step::Fragment(bytes) => {
                        return Some((Ok(StreamFragment::new(bytes)), steps));
                    }
                    Step::Failure(failure) => {
                        return Some((Err(Error::Stream(failure)), steps));
                    }
                    Step::Terminate(transport) => {
                        return Some((Err(transport.to_error()), Vec::new().into_iter()));
                    }
                    Step::Delay(duration) => tokio::time::sleep(duration).await,
                    Step::Hold => futures::future::pending::<()>().await,
                }
            }
        });

        Ok(stream.boxed())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
