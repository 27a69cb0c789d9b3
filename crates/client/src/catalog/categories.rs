use std::sync::Arc;

use serde::Deserialize;
use srisri_core::{Category, CategoryId, CategoryInput, CategoryPatch, sort_by_display_order};
use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey, ResourceKind};
use crate::error::ClientError;

const CATEGORIES: [&str; 2] = ["api", "categories"];

#[derive(Deserialize)]
struct CategoryList {
    #[serde(default)]
    categories: Vec<Category>,
}

/// Category reads and admin writes.
#[derive(Debug, Clone)]
pub struct CategoriesApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl CategoriesApi {
    #[must_use]
    pub const fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// All categories, optionally filtered by active flag, in display order.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    #[instrument(skip(self))]
    pub async fn list(&self, is_active: Option<bool>) -> Result<Vec<Category>, ClientError> {
        let key = QueryKey::categories(is_active);
        let query: Vec<_> = is_active
            .map(|active| ("isActive", active.to_string()))
            .into_iter()
            .collect();

        self.cache
            .get_or_fetch(key, async {
                let list: CategoryList = self.api.get(&CATEGORIES, &query).await.into_result()?;
                let mut categories = list.categories;
                sort_by_display_order(&mut categories);
                Ok::<_, ClientError>(categories)
            })
            .await
    }

    /// A single category.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get(&self, id: &CategoryId) -> Result<Category, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::category(id), async {
                self.api
                    .get::<Category>(&["api", "categories", id.as_str()], &[])
                    .await
                    .into_result()
            })
            .await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling the API, or the API
    /// failure.
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, ClientError> {
        input.validate()?;

        let category: Category = self.api.post(&CATEGORIES, input).await.into_result()?;
        self.cache.invalidate_resource(ResourceKind::Categories).await;

        info!(id = %category.category_id, "Created category");
        Ok(category)
    }

    /// Apply a partial update. The slug cannot change.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling the API, or the API
    /// failure.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update(&self, id: &CategoryId, patch: &CategoryPatch) -> Result<Category, ClientError> {
        patch.validate()?;

        let category: Category = self
            .api
            .put(&["api", "categories", id.as_str()], patch)
            .await
            .into_result()?;
        self.cache.invalidate_resource(ResourceKind::Categories).await;
        self.cache.invalidate_key(&QueryKey::category(id)).await;

        info!("Updated category");
        Ok(category)
    }

    /// Delete a category. Products that reference its slug are untouched.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &CategoryId) -> Result<(), ClientError> {
        self.api
            .delete(&["api", "categories", id.as_str()])
            .await
            .into_ack()?;
        self.cache.invalidate_resource(ResourceKind::Categories).await;
        self.cache.invalidate_key(&QueryKey::category(id)).await;

        info!("Deleted category");
        Ok(())
    }
}
