//! Submission validation and request assembly.

use super::{AnalysisRequest, ImageRole, PromptTemplate};
use crate::image::ImageAsset;
use crate::{Error, Result};

/// Collects the two images of a submission and assembles the request.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    brand: Option<ImageAsset>,
    nutrition: Option<ImageAsset>,
    template: PromptTemplate,
}

impl RequestBuilder {
    /// Creates an empty builder with the default template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the brand image.
    pub fn with_brand(mut self, asset: ImageAsset) -> Self {
        self.brand = Some(asset);
        self
    }

    /// Sets the nutrition label image.
    pub fn with_nutrition(mut self, asset: ImageAsset) -> Self {
        self.nutrition = Some(asset);
        self
    }

    /// Sets or clears the image for a role.
    pub fn set(&mut self, role: ImageRole, asset: Option<ImageAsset>) -> &mut Self {
        match role {
            ImageRole::Brand => self.brand = asset,
            ImageRole::Nutrition => self.nutrition = asset,
        }
        self
    }

    /// Overrides the instruction template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Returns the roles that still have no image.
    pub fn missing(&self) -> Vec<ImageRole> {
        ImageRole::ALL
            .into_iter()
            .filter(|role| match role {
                ImageRole::Brand => self.brand.is_none(),
                ImageRole::Nutrition => self.nutrition.is_none(),
            })
            .collect()
    }

    /// Returns true if both images are present.
    pub fn is_complete(&self) -> bool {
        self.brand.is_some() && self.nutrition.is_some()
    }

    /// Assembles the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompleteSubmission`] if either image is missing.
    pub fn build(&self) -> Result<AnalysisRequest> {
        match (&self.brand, &self.nutrition) {
            (Some(brand), Some(nutrition)) => Ok(AnalysisRequest::with_template(
                brand.clone(),
                nutrition.clone(),
                self.template,
            )),
            _ => Err(Error::incomplete_submission(self.missing())),
        }
    }
}
