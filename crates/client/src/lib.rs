//! SriSri Client - REST client for the SriSri Ethnics catalog API.
//!
//! # Architecture
//!
//! [`CatalogClient`] owns one [`Session`], one [`QueryCache`] and one HTTP
//! connection pool, and hands out cheap service handles that share them:
//!
//! - [`AuthService`] - login, logout and session queries
//! - [`ProductsApi`] / [`CategoriesApi`] - cached reads, invalidating writes
//! - [`Uploader`] - presigned image uploads
//! - [`ContactLinks`] / [`AssetUrls`] - storefront link and image helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use srisri_client::{CatalogClient, ClientConfig, LoginCredentials};
//! use srisri_core::ProductFilters;
//!
//! # async fn run() -> Result<(), srisri_client::ClientError> {
//! let client = CatalogClient::new(ClientConfig::from_env()?)?;
//! client
//!     .auth()
//!     .login(&LoginCredentials::new("admin@srisriethnics.in", "secret")?)
//!     .await?;
//!
//! let page = client
//!     .products()
//!     .list(&ProductFilters::storefront().with_category("sarees"))
//!     .await?;
//! println!("{} sarees", page.count);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod storefront;
pub mod upload;

use std::sync::Arc;

pub use api::{ApiClient, ApiResponse};
pub use auth::{AuthService, AuthSession, LoginCredentials};
pub use cache::{CacheValue, QueryCache, QueryKey, ResourceKind};
pub use catalog::{CategoriesApi, ProductsApi};
pub use config::{ClientConfig, ConfigError, ContactConfig};
pub use error::ClientError;
pub use session::{
    AuthState, AuthUser, FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore,
};
pub use storefront::{AssetUrls, ContactLinks};
pub use upload::{
    MAX_UPLOAD_BYTES, UploadBatch, UploadDescriptor, UploadFile, UploadOutcome, Uploader,
    ensure_image_capacity,
};

/// Entry point bundling every catalog service over shared state.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    api: ApiClient,
    cache: Arc<QueryCache>,
    uploader: Uploader,
    contact: ContactLinks,
    assets: AssetUrls,
}

impl CatalogClient {
    /// Client whose session persists to `config.session_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let store = FileSessionStore::new(&config.session_file);
        Self::with_store(config, Arc::new(store))
    }

    /// Client over an explicit session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built.
    pub fn with_store(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let session = Session::new(store);
        let api = ApiClient::new(&config, session)?;
        let uploader = Uploader::new(api.clone(), &config)?;

        Ok(Self {
            cache: Arc::new(QueryCache::new(config.cache_ttl)),
            contact: ContactLinks::new(&config.contact),
            assets: AssetUrls::new(config.cdn_url),
            uploader,
            api,
        })
    }

    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    #[must_use]
    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.api.clone(), Arc::clone(&self.cache))
    }

    #[must_use]
    pub fn categories(&self) -> CategoriesApi {
        CategoriesApi::new(self.api.clone(), Arc::clone(&self.cache))
    }

    #[must_use]
    pub const fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    #[must_use]
    pub const fn contact(&self) -> &ContactLinks {
        &self.contact
    }

    #[must_use]
    pub const fn assets(&self) -> &AssetUrls {
        &self.assets
    }

    /// The shared query cache, for explicit invalidation.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.api.session()
    }
}
