//! User-facing output texts.

use std::fmt::Display;

/// Shown before the first submission.
pub const IDLE: &str = "(Results will appear here)";

/// Shown while validating and opening the stream.
pub const PENDING: &str = "Generating...";

/// Shown when a submission lacks one or both images.
pub const INCOMPLETE_SUBMISSION: &str =
    "Please capture or upload both the brand image and nutritional values image.";

/// Text shown in place of the markup when a fragment fails to render.
pub fn diagnostic(error: impl Display) -> String {
    format!("An error occurred: {error}")
}

/// Text shown when a run fails.
pub fn failure(error: impl Display) -> String {
    format!("Error: {error}")
}
