//! The pair of image slots a user fills before submitting.

use crate::Result;
use crate::image::ImageAsset;
use crate::request::{ImageRole, RequestBuilder};

/// Images captured or uploaded for one run.
///
/// Either slot may be empty; completeness is checked when the run enters
/// `Validating`, not when the submission is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    brand: Option<ImageAsset>,
    nutrition: Option<ImageAsset>,
}

impl Submission {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the brand image.
    pub fn with_brand(mut self, asset: ImageAsset) -> Self {
        self.brand = Some(asset);
        self
    }

    /// Sets the nutrition image.
    pub fn with_nutrition(mut self, asset: ImageAsset) -> Self {
        self.nutrition = Some(asset);
        self
    }

    /// Decodes whichever data URIs are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedImage`](crate::Error::MalformedImage) if a
    /// present URI cannot be decoded. Absent URIs are left empty.
    pub fn from_data_uris(brand: Option<&str>, nutrition: Option<&str>) -> Result<Self> {
        Ok(Self {
            brand: brand.map(ImageAsset::from_data_uri).transpose()?,
            nutrition: nutrition.map(ImageAsset::from_data_uri).transpose()?,
        })
    }

    /// Returns the image held for a role.
    pub fn get(&self, role: ImageRole) -> Option<&ImageAsset> {
        match role {
            ImageRole::Brand => self.brand.as_ref(),
            ImageRole::Nutrition => self.nutrition.as_ref(),
        }
    }

    /// Returns true if both slots are filled.
    pub fn is_complete(&self) -> bool {
        self.brand.is_some() && self.nutrition.is_some()
    }

    /// Converts the submission into a request builder.
    pub fn into_builder(self) -> RequestBuilder {
        let mut builder = RequestBuilder::new();
        builder
            .set(ImageRole::Brand, self.brand)
            .set(ImageRole::Nutrition, self.nutrition);
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn absent_uris_leave_slots_empty() {
        let submission =
            Submission::from_data_uris(Some("data:image/png;base64,aGVsbG8="), None).unwrap();

        assert!(submission.get(ImageRole::Brand).is_some());
        assert!(submission.get(ImageRole::Nutrition).is_none());
        assert!(!submission.is_complete());
        assert_eq!(submission.into_builder().missing(), vec![ImageRole::Nutrition]);
    }

    #[test]
    fn malformed_uri_is_rejected_early() {
        let result = Submission::from_data_uris(Some("not a uri"), Some("data:image/png;base64,aGVsbG8="));
        assert!(matches!(result, Err(Error::MalformedImage(_))));
    }
}
