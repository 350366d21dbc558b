//! Multi-part generation requests.
//!
//! An [`AnalysisRequest`] always holds five parts in a fixed order: the brand
//! image, its label, the nutrition image, its label, and the instruction
//! template. [`RequestBuilder`] is the only validation gate before any
//! network activity.

mod builder;
mod prompt;

use jiff::Timestamp;
use strum::{AsRefStr, IntoStaticStr};
use uuid::Uuid;

pub use self::builder::RequestBuilder;
pub use self::prompt::PromptTemplate;
use crate::image::ImageAsset;

/// Which of the two submitted photos an image is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ImageRole {
    /// Product front showing the brand and product name.
    Brand,
    /// Nutrition facts label.
    Nutrition,
}

impl ImageRole {
    /// Both roles in request order.
    pub const ALL: [Self; 2] = [Self::Brand, Self::Nutrition];

    /// Returns the descriptive text sent right after the image.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Brand => "This image contains the brand and product information.",
            Self::Nutrition => "This image contains the nutritional values.",
        }
    }
}

/// One segment of a multi-part request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// An inline image.
    Image {
        /// The image role, which also determines its label.
        role: ImageRole,
        /// The decoded image.
        asset: ImageAsset,
    },
    /// Plain text.
    Text {
        /// The text content.
        content: String,
    },
}

impl Part {
    /// Creates an image part.
    pub fn image(role: ImageRole, asset: ImageAsset) -> Self {
        Self::Image { role, asset }
    }

    /// Creates a text part.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Returns the image asset if this is an image part.
    pub fn as_image(&self) -> Option<&ImageAsset> {
        match self {
            Self::Image { asset, .. } => Some(asset),
            Self::Text { .. } => None,
        }
    }

    /// Returns the text if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content),
            Self::Image { .. } => None,
        }
    }

    /// Returns the image label if this is an image part.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Image { role, .. } => Some(role.label()),
            Self::Text { .. } => None,
        }
    }
}

/// An immutable, ordered generation request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    request_id: Uuid,
    created_at: Timestamp,
    parts: Vec<Part>,
}

impl AnalysisRequest {
    /// Builds a request from both images and the default template.
    pub fn new(brand: ImageAsset, nutrition: ImageAsset) -> Self {
        Self::with_template(brand, nutrition, PromptTemplate::analysis())
    }

    /// Builds a request from both images and a template.
    pub fn with_template(
        brand: ImageAsset,
        nutrition: ImageAsset,
        template: PromptTemplate,
    ) -> Self {
        let parts = vec![
            Part::image(ImageRole::Brand, brand),
            Part::text(ImageRole::Brand.label()),
            Part::image(ImageRole::Nutrition, nutrition),
            Part::text(ImageRole::Nutrition.label()),
            Part::text(template.as_str()),
        ];

        Self {
            request_id: Uuid::now_v7(),
            created_at: Timestamp::now(),
            parts,
        }
    }

    /// Returns the unique request identifier.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns when the request was built.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the parts in transmission order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns the image parts in order.
    pub fn images(&self) -> impl Iterator<Item = (ImageRole, &ImageAsset)> {
        self.parts.iter().filter_map(|part| match part {
            Part::Image { role, asset } => Some((*role, asset)),
            Part::Text { .. } => None,
        })
    }

    /// Returns the number of image parts.
    pub fn image_count(&self) -> usize {
        self.images().count()
    }

    /// Returns the total size of the image payloads in bytes.
    pub fn payload_size(&self) -> usize {
        self.images().map(|(_, asset)| asset.len()).sum()
    }

    /// Returns the total length of the text parts in bytes.
    pub fn text_length(&self) -> usize {
        self.parts.iter().filter_map(Part::as_text).map(str::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageFormat;

    fn asset(byte: u8) -> ImageAsset {
        ImageAsset::new(ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF, byte]).unwrap()
    }

    #[test]
    fn parts_follow_fixed_order() {
        let request = AnalysisRequest::new(asset(1), asset(2));
        let parts = request.parts();

        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], Part::image(ImageRole::Brand, asset(1)));
        assert_eq!(parts[1].as_text(), Some(ImageRole::Brand.label()));
        assert_eq!(parts[2], Part::image(ImageRole::Nutrition, asset(2)));
        assert_eq!(parts[3].as_text(), Some(ImageRole::Nutrition.label()));
        assert_eq!(parts[4].as_text(), Some(PromptTemplate::analysis().as_str()));
    }

    #[test]
    fn request_metrics() {
        let request = AnalysisRequest::new(asset(1), asset(2));
        assert_eq!(request.image_count(), 2);
        assert_eq!(request.payload_size(), 8);
        assert!(request.text_length() > PromptTemplate::analysis().len());
        assert_eq!(request.parts()[0].label(), Some(ImageRole::Brand.label()));
    }

    #[test]
    fn each_request_gets_a_fresh_id() {
        let first = AnalysisRequest::new(asset(1), asset(2));
        let second = AnalysisRequest::new(asset(1), asset(2));
        assert_ne!(first.request_id(), second.request_id());
    }
}
