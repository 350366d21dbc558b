//! Recognised image formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Image formats accepted by the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG, the format camera captures are normalised to.
    Jpeg,
    /// Portable Network Graphics.
    Png,
    /// WebP.
    Webp,
    /// Graphics Interchange Format.
    Gif,
    /// High Efficiency Image Coding.
    Heic,
    /// High Efficiency Image File Format.
    Heif,
}

impl ImageFormat {
    /// Every recognised format.
    pub const ALL: [Self; 6] = [
        Self::Jpeg,
        Self::Png,
        Self::Webp,
        Self::Gif,
        Self::Heic,
        Self::Heif,
    ];

    /// Returns the canonical MIME type.
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    /// Returns the conventional file extension.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Heic => "heic",
            Self::Heif => "heif",
        }
    }

    /// Parses a MIME type, ignoring case and surrounding whitespace.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            "image/heic" => Some(Self::Heic),
            "image/heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Guesses the format from a file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jfif" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Detects the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] if brand.len() >= 4 => {
                match &brand[..4] {
                    b"heic" | b"heix" | b"hevc" | b"hevx" => Some(Self::Heic),
                    b"mif1" | b"msf1" | b"heif" => Some(Self::Heif),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mime_type(s)
            .ok_or_else(|| Error::malformed_image(format!("unsupported image type '{}'", s.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_are_case_insensitive() {
        assert_eq!(ImageFormat::from_mime_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type(" image/jpg "), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
        assert!("application/pdf".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn canonical_mime_roundtrip() {
        for format in ImageFormat::ALL {
            assert_eq!(ImageFormat::from_mime_type(format.mime_type()), Some(format));
            assert_eq!(ImageFormat::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn sniff_magic_bytes() {
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::sniff(b"GIF89a\x01\0"), Some(ImageFormat::Gif));
        assert_eq!(
            ImageFormat::sniff(b"RIFF\x24\0\0\0WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(
            ImageFormat::sniff(b"\0\0\0\x18ftypheic\0\0\0\0"),
            Some(ImageFormat::Heic)
        );
        assert_eq!(ImageFormat::sniff(b"hello"), None);
        assert_eq!(ImageFormat::sniff(&[]), None);
    }
}
