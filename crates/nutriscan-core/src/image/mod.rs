//! Image payloads and the data URI codec.
//!
//! Image sources (camera frames, uploaded files) hand the pipeline a
//! `data:<mime>;base64,<payload>` URI. [`decode`] turns it into an
//! [`ImageAsset`]: the MIME type plus the raw bytes, passed through verbatim.

mod codec;
mod format;

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

pub use self::codec::{decode, encode};
pub use self::format::ImageFormat;
use crate::{Error, Result};

/// A decoded image ready for transport.
///
/// The bytes are never empty and the format is always a recognised image
/// type. Cloning is cheap: the payload is reference counted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    format: ImageFormat,
    data: Bytes,
}

impl ImageAsset {
    /// Creates an asset from raw bytes of a known format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedImage`] if `data` is empty.
    pub fn new(format: ImageFormat, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(Error::malformed_image("image payload is empty"));
        }

        Ok(Self { format, data })
    }

    /// Decodes an asset from a data URI.
    pub fn from_data_uri(data_uri: &str) -> Result<Self> {
        decode(data_uri)
    }

    /// Returns the image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the MIME type.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns a cheap clone of the payload.
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }

    /// Returns the payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes the payload as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Encodes the asset back into a data URI.
    pub fn to_data_uri(&self) -> String {
        encode(self.format, &self.data)
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}
