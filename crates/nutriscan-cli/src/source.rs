//! Image files normalised to data URIs.

use std::path::Path;

use anyhow::Context;
use nutriscan_core::image::{self, ImageFormat};

use crate::TRACING_TARGET_SOURCE;

/// Reads an image file and encodes it as a `data:` URI.
///
/// The format is detected from the file's magic bytes, falling back to its
/// extension.
pub async fn load_data_uri(path: &Path) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;

    let format = detect_format(path, &bytes)
        .with_context(|| format!("'{}' is not a recognised image file", path.display()))?;

    tracing::debug!(
        target: TRACING_TARGET_SOURCE,
        path = %path.display(),
        mime_type = format.mime_type(),
        size = bytes.len(),
        "Loaded image"
    );

    Ok(image::encode(format, &bytes))
}

/// Loads an optional image; `None` stays `None`.
pub async fn load_optional(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    match path {
        Some(path) => load_data_uri(path).await.map(Some),
        None => Ok(None),
    }
}

fn detect_format(path: &Path, bytes: &[u8]) -> Option<ImageFormat> {
    ImageFormat::sniff(bytes).or_else(|| {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(ImageFormat::from_extension)
    })
}
