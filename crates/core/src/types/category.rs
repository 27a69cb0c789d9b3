//! Categories and category write payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::CategoryId;
use super::slug::Slug;
use super::validation::{ValidationError, require};

/// A product category as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    /// Ascending sort key for category menus.
    #[serde(default)]
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sort categories by display order, keeping API order for ties.
pub fn sort_by_display_order(categories: &mut [Category]) {
    categories.sort_by_key(|c| c.display_order);
}

/// Payload for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub image_url: String,
    pub display_order: i32,
    pub is_active: bool,
}

impl CategoryInput {
    /// Start a new active category, deriving the slug from the name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] if the name is blank or has no
    /// characters a slug can be built from.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        require("name", name)?;
        let slug = Slug::slugify(name).ok_or(ValidationError::Required("slug"))?;
        Ok(Self {
            name: name.trim().to_owned(),
            slug,
            description: String::new(),
            image_url: String::new(),
            display_order: 0,
            is_active: true,
        })
    }

    /// Check the fields the admin form requires before submitting.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank name or a malformed slug.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        Slug::parse(self.slug.as_str())?;
        Ok(())
    }
}

/// Partial update for a category.
///
/// There is no slug field: a slug is fixed once the category exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.display_order.is_none()
            && self.is_active.is_none()
    }

    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] if a name is set but blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::slug::SlugError;

    fn category(id: &str, order: i32) -> Category {
        serde_json::from_value(serde_json::json!({
            "categoryId": id,
            "name": id,
            "slug": id,
            "displayOrder": order,
            "isActive": true,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_sort_by_display_order_is_stable() {
        let mut categories = vec![category("b", 2), category("a", 1), category("c", 1)];
        sort_by_display_order(&mut categories);
        let ids: Vec<_> = categories.iter().map(|c| c.category_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_from_name_generates_slug() {
        let input = CategoryInput::from_name("Bridal Lehengas").unwrap();
        assert_eq!(input.slug.as_str(), "bridal-lehengas");
        assert!(input.is_active);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_slug() {
        let mut input = CategoryInput::from_name("Sarees").unwrap();
        input.slug = serde_json::from_str("\"Sarees\"").unwrap();
        assert_eq!(
            input.validate(),
            Err(ValidationError::Slug(SlugError::Malformed))
        );
    }

    #[test]
    fn test_patch_has_no_slug() {
        let patch = CategoryPatch {
            display_order: Some(3),
            ..CategoryPatch::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"displayOrder":3}"#
        );
    }
}
