//! Core types for the SriSri catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod filters;
pub mod id;
pub mod price;
pub mod product;
pub mod slug;
pub mod validation;
pub mod variant;

pub use category::{Category, CategoryInput, CategoryPatch, sort_by_display_order};
pub use email::{Email, EmailError};
pub use filters::{PRICE_RANGES, PriceRange, ProductFilters, SortOption};
pub use id::*;
pub use price::Price;
pub use product::{
    DEFAULT_PAGE_SIZE, LOW_STOCK_THRESHOLD, MAX_PRODUCT_IMAGES, PLACEHOLDER_IMAGE, Product, ProductInput, ProductPage,
    ProductPatch,
};
pub use slug::{Slug, SlugError};
pub use validation::ValidationError;
pub use variant::{Color, Size, UnknownVariant, Variant};
