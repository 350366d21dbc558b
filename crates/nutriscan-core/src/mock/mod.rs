//! Scripted test doubles for the pipeline.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! nutriscan-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use nutriscan_core::mock::{MockModel, RecordingSink};
//! use nutriscan_core::pipeline::PipelineController;
//!
//! let model = MockModel::new().fragment("# Tit").fragment("le\n\nok");
//! let sink = RecordingSink::new();
//! let controller = PipelineController::with_model(model, sink.clone());
//! ```

mod model;
mod sink;

pub use self::model::MockModel;
pub use self::sink::RecordingSink;
