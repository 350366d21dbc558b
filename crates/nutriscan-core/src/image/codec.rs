//! Data URI encoding and decoding.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

use super::{ImageAsset, ImageFormat};
use crate::{Error, Result, TRACING_TARGET_IMAGE};

const SCHEME: &str = "data:";

/// Decodes a `data:<mime>;base64,<payload>` URI into an [`ImageAsset`].
///
/// The bytes are passed through verbatim: no recompression or resizing.
/// Whitespace inside the payload is ignored, as some sources wrap long
/// base64 lines.
///
/// # Errors
///
/// Returns [`Error::MalformedImage`] if the URI is not a data URI, declares a
/// non-image or unsupported MIME type, is not base64 encoded, or carries an
/// empty or undecodable payload.
pub fn decode(data_uri: &str) -> Result<ImageAsset> {
    let trimmed = data_uri.trim();

    let rest = trimmed
        .get(..SCHEME.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
        .map(|_| &trimmed[SCHEME.len()..])
        .ok_or_else(|| Error::malformed_image("not a data URI"))?;

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::malformed_image("data URI has no payload separator"))?;

    let mut params = meta.split(';');
    let mime = params.next().unwrap_or_default().trim();
    if mime.is_empty() {
        return Err(Error::malformed_image("data URI declares no media type"));
    }

    let format = ImageFormat::from_mime_type(mime).ok_or_else(|| {
        Error::malformed_image(format!("unsupported media type '{mime}'"))
    })?;

    let is_base64 = params.any(|param| param.trim().eq_ignore_ascii_case("base64"));
    if !is_base64 {
        return Err(Error::malformed_image("data URI payload is not base64 encoded"));
    }

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(Error::malformed_image("data URI payload is empty"));
    }

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| STANDARD_NO_PAD.decode(compact.as_bytes()))
        .map_err(|e| Error::malformed_image(format!("invalid base64 payload: {e}")))?;

    tracing::trace!(
        target: TRACING_TARGET_IMAGE,
        mime_type = format.mime_type(),
        size = bytes.len(),
        "Decoded data URI"
    );

    ImageAsset::new(format, bytes)
}

/// Encodes raw bytes of the given format as a base64 data URI.
pub fn encode(format: ImageFormat, bytes: &[u8]) -> String {
    format!("{SCHEME}{};base64,{}", format.mime_type(), STANDARD.encode(bytes))
}
