use std::sync::Arc;

use srisri_core::{Product, ProductFilters, ProductId, ProductInput, ProductPage, ProductPatch};
use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey, ResourceKind};
use crate::error::ClientError;

const PRODUCTS: [&str; 2] = ["api", "products"];

/// Product reads and admin writes.
#[derive(Debug, Clone)]
pub struct ProductsApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl ProductsApi {
    #[must_use]
    pub const fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// One page of products matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    #[instrument(skip(self))]
    pub async fn list(&self, filters: &ProductFilters) -> Result<ProductPage, ClientError> {
        let query = filters.query_pairs();
        self.cache
            .get_or_fetch(QueryKey::products(filters), async {
                self.api.get::<ProductPage>(&PRODUCTS, &query).await.into_result()
            })
            .await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns the API failure, typically `Api { status: 404, .. }`.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Product, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::product(id), async {
                self.api
                    .get::<Product>(&["api", "products", id.as_str()], &[])
                    .await
                    .into_result()
            })
            .await
    }

    /// Create a product. Duplicate sizes and colors are dropped first.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling the API, or the API
    /// failure.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<Product, ClientError> {
        let input = input.normalized();
        input.validate()?;

        let product: Product = self.api.post(&PRODUCTS, &input).await.into_result()?;
        self.cache.invalidate_resource(ResourceKind::Products).await;

        info!(id = %product.product_id, "Created product");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling the API, or the API
    /// failure.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update(&self, id: &ProductId, patch: &ProductPatch) -> Result<Product, ClientError> {
        patch.validate()?;

        let product: Product = self
            .api
            .put(&["api", "products", id.as_str()], patch)
            .await
            .into_result()?;
        self.cache.invalidate_resource(ResourceKind::Products).await;
        self.cache.invalidate_key(&QueryKey::product(id)).await;

        info!("Updated product");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ClientError> {
        self.api
            .delete(&["api", "products", id.as_str()])
            .await
            .into_ack()?;
        self.cache.invalidate_resource(ResourceKind::Products).await;
        self.cache.invalidate_key(&QueryKey::product(id)).await;

        info!("Deleted product");
        Ok(())
    }
}
