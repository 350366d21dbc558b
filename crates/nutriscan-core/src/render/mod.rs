//! Incremental rendering of the accumulated stream.
//!
//! Every fragment triggers a full conversion of the whole buffer instead of
//! patching the previous output: structured markup such as tables is only
//! well formed when parsed over the complete text.

mod buffer;
mod converter;
mod renderer;

pub use self::buffer::{DecodedText, RenderBuffer};
pub use self::converter::{MarkdownConverter, MarkupConverter};
pub use self::renderer::{IncrementalRenderer, RenderSnapshot};
