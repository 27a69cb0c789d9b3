//! Client-side validation errors for catalog write payloads.

use super::slug::SlugError;

/// A payload failed validation before being sent to the API.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is missing or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// The price is below zero.
    #[error("price cannot be negative")]
    NegativePrice,

    /// A product must carry at least one image.
    #[error("please upload at least one image")]
    NoImages,

    /// A product carries more images than allowed.
    #[error("maximum {max} images allowed")]
    TooManyImages {
        /// Maximum number of images per product.
        max: usize,
    },

    /// The category slug is malformed.
    #[error(transparent)]
    Slug(#[from] SlugError),
}

/// Fail with [`ValidationError::Required`] if `value` is blank.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}
