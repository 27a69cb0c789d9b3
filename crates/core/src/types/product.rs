//! Products and product write payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::validation::{ValidationError, require};
use super::variant::{Color, Size, Variant};

/// Default number of products requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum number of images a product may carry.
pub const MAX_PRODUCT_IMAGES: usize = 5;

/// Image shown for products that have none.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-product.jpg";

/// Stock below this (and above zero) is flagged as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A catalog product as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Slug of the owning category. Not checked against the category list.
    pub category: String,
    /// Image URLs; the first one is the primary image.
    #[serde(default)]
    pub images: Vec<String>,
    /// Sizes as stored. Labels outside [`Size`] are kept, not rejected.
    #[serde(default)]
    pub sizes: Vec<Variant<Size>>,
    #[serde(default)]
    pub colors: Vec<Variant<Color>>,
    #[serde(default)]
    pub stock: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The primary image URL, if the product has any images.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// True when only a handful of units are left.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock < LOW_STOCK_THRESHOLD
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub count: u32,
    /// Pagination cursor for the next page, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub images: Vec<String>,
    pub sizes: Vec<Size>,
    pub colors: Vec<Color>,
    pub stock: u32,
    pub is_active: bool,
}

impl ProductInput {
    /// Check the fields the admin form requires before submitting.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: blank name or category, negative
    /// price, no images, or more than [`MAX_PRODUCT_IMAGES`] images.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("category", &self.category)?;
        if self.price.is_negative() {
            return Err(ValidationError::NegativePrice);
        }
        validate_images(&self.images)
    }

    /// Drop duplicate sizes and colors, keeping first occurrences.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        dedup_in_order(&mut self.sizes);
        dedup_in_order(&mut self.colors);
        self
    }
}

/// Partial update for a product. Only fields that are set are sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<Size>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Color>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProductPatch {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.images.is_none()
            && self.sizes.is_none()
            && self.colors.is_none()
            && self.stock.is_none()
            && self.is_active.is_none()
    }

    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Same rules as [`ProductInput::validate`], applied only to set fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(category) = &self.category {
            require("category", category)?;
        }
        if self.price.is_some_and(|p| p.is_negative()) {
            return Err(ValidationError::NegativePrice);
        }
        if let Some(images) = &self.images {
            validate_images(images)?;
        }
        Ok(())
    }
}

fn validate_images(images: &[String]) -> Result<(), ValidationError> {
    if images.is_empty() {
        return Err(ValidationError::NoImages);
    }
    if images.len() > MAX_PRODUCT_IMAGES {
        return Err(ValidationError::TooManyImages {
            max: MAX_PRODUCT_IMAGES,
        });
    }
    Ok(())
}

fn dedup_in_order<T: PartialEq + Copy>(items: &mut Vec<T>) {
    let mut seen: Vec<T> = Vec::with_capacity(items.len());
    items.retain(|item| {
        if seen.contains(item) {
            false
        } else {
            seen.push(*item);
            true
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: "Kanjivaram Silk Saree".to_string(),
            description: "Handwoven".to_string(),
            price: Price::from_rupees(12_500),
            category: "sarees".to_string(),
            images: vec!["https://cdn.example/p1.jpg".to_string()],
            sizes: vec![Size::FreeSize],
            colors: vec![Color::Maroon, Color::Gold],
            stock: 3,
            is_active: true,
        }
    }

    #[test]
    fn test_product_deserializes_from_api_json() {
        let json = r#"{
            "productId": "p1",
            "name": "Lehenga",
            "description": "Bridal",
            "price": 45999,
            "category": "lehengas",
            "images": ["a.jpg", "b.jpg"],
            "sizes": ["M", "L"],
            "colors": ["Red"],
            "stock": 2,
            "isActive": true,
            "createdAt": "2025-01-10T08:00:00Z",
            "updatedAt": "2025-01-11T08:00:00.000Z"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_id.as_str(), "p1");
        assert_eq!(product.primary_image(), Some("a.jpg"));
        assert_eq!(product.price, Price::from_rupees(45_999));
        assert!(product.is_low_stock());
        assert!(!product.is_out_of_stock());
        assert_eq!(product.sizes, vec![Size::M.into(), Size::L.into()]);
    }

    #[test]
    fn test_product_keeps_unlisted_sizes_and_colors() {
        let json = r#"{
            "productId": "p2",
            "name": "Kurta",
            "price": 999,
            "category": "kurtas",
            "sizes": ["3XL"],
            "colors": ["Navy", "Red"],
            "isActive": true,
            "createdAt": "2025-01-10T08:00:00Z",
            "updatedAt": "2025-01-10T08:00:00Z"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.sizes, vec![Variant::Other("3XL".to_string())]);
        assert_eq!(
            product.colors,
            vec![Variant::Other("Navy".to_string()), Variant::Known(Color::Red)]
        );
    }

    #[test]
    fn test_page_without_last_key() {
        let page: ProductPage = serde_json::from_str(r#"{"products": [], "count": 0}"#).unwrap();
        assert!(page.last_key.is_none());
    }

    #[test]
    fn test_input_validation() {
        assert!(input().validate().is_ok());

        let mut no_images = input();
        no_images.images.clear();
        assert_eq!(no_images.validate(), Err(ValidationError::NoImages));

        let mut blank_name = input();
        blank_name.name = "   ".to_string();
        assert_eq!(blank_name.validate(), Err(ValidationError::Required("name")));

        let mut negative = input();
        negative.price = "-1".parse().unwrap();
        assert_eq!(negative.validate(), Err(ValidationError::NegativePrice));

        let mut crowded = input();
        crowded.images = vec!["x".to_string(); MAX_PRODUCT_IMAGES + 1];
        assert!(matches!(
            crowded.validate(),
            Err(ValidationError::TooManyImages { .. })
        ));
    }

    #[test]
    fn test_input_serializes_camel_case() {
        let value = serde_json::to_value(input()).unwrap();
        assert_eq!(value["isActive"], true);
        assert_eq!(value["sizes"][0], "Free Size");
    }

    #[test]
    fn test_normalized_dedups() {
        let mut dup = input();
        dup.colors = vec![Color::Red, Color::Gold, Color::Red];
        assert_eq!(dup.normalized().colors, vec![Color::Red, Color::Gold]);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ProductPatch {
            stock: Some(0),
            ..ProductPatch::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"stock":0}"#);
        assert!(!patch.is_empty());
        assert!(ProductPatch::default().is_empty());
    }

    #[test]
    fn test_patch_rejects_clearing_images() {
        let patch = ProductPatch {
            images: Some(vec![]),
            ..ProductPatch::default()
        };
        assert_eq!(patch.validate(), Err(ValidationError::NoImages));
    }
}
