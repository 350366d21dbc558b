//! Commonly used items from nutriscan-core.
//!
//! ```rust,ignore
//! use nutriscan_core::prelude::*;
//! ```

pub use crate::image::{ImageAsset, ImageFormat};
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use crate::mock::{MockModel, RecordingSink};
pub use crate::pipeline::{
    DisplaySink, Output, OutputKind, OutputSlot, PipelineController, PipelineState, RunHandle,
    RunOutcome, RunReport, Submission,
};
pub use crate::render::{IncrementalRenderer, MarkdownConverter, MarkupConverter, RenderSnapshot};
pub use crate::request::{AnalysisRequest, ImageRole, Part, PromptTemplate, RequestBuilder};
pub use crate::stream::{FragmentStream, GenerativeModel, StreamConsumer, StreamFragment};
pub use crate::{BoxedError, Error, Result, StreamFailure, TransportError, TransportKind};
