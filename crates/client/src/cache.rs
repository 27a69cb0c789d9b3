//! Read cache for catalog queries.
//!
//! Entries are keyed by resource kind plus the form-encoded query parameters,
//! so two requests with equal filters share one entry. Writes invalidate by
//! kind or by key.
//!
//! Each kind carries a generation counter that every invalidation bumps. A
//! read records the generation before it goes to the network and only stores
//! its result if no invalidation happened meanwhile; otherwise a slow read
//! could put pre-write data back into the cache.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use srisri_core::{Category, CategoryId, Product, ProductFilters, ProductId, ProductPage};
use tracing::debug;
use url::form_urlencoded;

use crate::error::ClientError;

const MAX_ENTRIES: u64 = 1000;

/// The cached resource families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Product listings.
    Products,
    /// Single products by id.
    Product,
    /// Category listings.
    Categories,
    /// Single categories by id.
    Category,
}

impl ResourceKind {
    const ALL: [Self; 4] = [Self::Products, Self::Product, Self::Categories, Self::Category];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Product => "product",
            Self::Categories => "categories",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key: resource kind plus normalized query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    kind: ResourceKind,
    params: String,
}

impl QueryKey {
    /// Build a key from query pairs. Pair order is significant, so callers
    /// must produce pairs in a fixed order.
    #[must_use]
    pub fn new(kind: ResourceKind, pairs: &[(&str, String)]) -> Self {
        let params = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Self { kind, params }
    }

    #[must_use]
    pub fn products(filters: &ProductFilters) -> Self {
        Self::new(ResourceKind::Products, &filters.query_pairs())
    }

    #[must_use]
    pub fn product(id: &ProductId) -> Self {
        Self::new(ResourceKind::Product, &[("id", id.to_string())])
    }

    #[must_use]
    pub fn categories(is_active: Option<bool>) -> Self {
        let pairs: Vec<_> = is_active
            .map(|active| ("isActive", active.to_string()))
            .into_iter()
            .collect();
        Self::new(ResourceKind::Categories, &pairs)
    }

    #[must_use]
    pub fn category(id: &CategoryId) -> Self {
        Self::new(ResourceKind::Category, &[("id", id.to_string())])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(self.kind.as_str())
        } else {
            write!(f, "{}?{}", self.kind, self.params)
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(ProductPage),
    Product(Box<Product>),
    Categories(Vec<Category>),
    Category(Box<Category>),
}

/// A query result that can live in the cache.
pub trait Cacheable: Clone + Sized {
    fn into_value(self) -> CacheValue;
    fn from_value(value: CacheValue) -> Option<Self>;
}

impl Cacheable for ProductPage {
    fn into_value(self) -> CacheValue {
        CacheValue::Products(self)
    }

    fn from_value(value: CacheValue) -> Option<Self> {
        match value {
            CacheValue::Products(page) => Some(page),
            _ => None,
        }
    }
}

impl Cacheable for Product {
    fn into_value(self) -> CacheValue {
        CacheValue::Product(Box::new(self))
    }

    fn from_value(value: CacheValue) -> Option<Self> {
        match value {
            CacheValue::Product(product) => Some(*product),
            _ => None,
        }
    }
}

impl Cacheable for Vec<Category> {
    fn into_value(self) -> CacheValue {
        CacheValue::Categories(self)
    }

    fn from_value(value: CacheValue) -> Option<Self> {
        match value {
            CacheValue::Categories(categories) => Some(categories),
            _ => None,
        }
    }
}

impl Cacheable for Category {
    fn into_value(self) -> CacheValue {
        CacheValue::Category(Box::new(self))
    }

    fn from_value(value: CacheValue) -> Option<Self> {
        match value {
            CacheValue::Category(category) => Some(*category),
            _ => None,
        }
    }
}

/// Shared query cache with TTL expiry and per-kind invalidation.
pub struct QueryCache {
    entries: Cache<QueryKey, CacheValue>,
    generations: Mutex<HashMap<ResourceKind, u64>>,
}

impl QueryCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();

        Self {
            entries,
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Current generation of `kind`.
    #[must_use]
    pub fn generation(&self, kind: ResourceKind) -> u64 {
        let generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        generations.get(&kind).copied().unwrap_or(0)
    }

    fn bump(&self, kind: ResourceKind) {
        let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        *generations.entry(kind).or_insert(0) += 1;
    }

    pub async fn get(&self, key: &QueryKey) -> Option<CacheValue> {
        self.entries.get(key).await
    }

    /// Store `value` unless `key`'s kind was invalidated after `generation`
    /// was read. Returns whether the value was kept.
    pub async fn insert_if_current(&self, key: QueryKey, value: CacheValue, generation: u64) -> bool {
        let kind = key.kind;
        if self.generation(kind) != generation {
            debug!(key = %key, "Discarding stale read");
            return false;
        }

        self.entries.insert(key.clone(), value).await;

        // An invalidation may have run between the check and the insert
        if self.generation(kind) != generation {
            self.entries.invalidate(&key).await;
            debug!(key = %key, "Discarding stale read");
            return false;
        }
        true
    }

    /// Serve `key` from the cache, or run `fetch` and cache its result.
    ///
    /// # Errors
    ///
    /// Returns whatever `fetch` fails with. Failures are not cached.
    pub async fn get_or_fetch<T, Fut>(&self, key: QueryKey, fetch: Fut) -> Result<T, ClientError>
    where
        T: Cacheable,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(value) = self.get(&key).await.and_then(T::from_value) {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }
        debug!(key = %key, "Cache miss");

        let generation = self.generation(key.kind);
        let value = fetch.await?;
        self.insert_if_current(key, value.clone().into_value(), generation)
            .await;
        Ok(value)
    }

    /// Drop every entry of `kind`.
    pub async fn invalidate_resource(&self, kind: ResourceKind) {
        self.bump(kind);
        let keys: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(key, _)| QueryKey::clone(&key))
            .collect();
        for key in &keys {
            self.entries.invalidate(key).await;
        }
        debug!(kind = %kind, dropped = keys.len(), "Invalidated resource");
    }

    /// Drop a single entry.
    pub async fn invalidate_key(&self, key: &QueryKey) {
        self.bump(key.kind);
        self.entries.invalidate(key).await;
        debug!(key = %key, "Invalidated key");
    }

    /// Drop everything.
    pub fn clear(&self) {
        for kind in ResourceKind::ALL {
            self.bump(kind);
        }
        self.entries.invalidate_all();
        debug!("Cleared query cache");
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}
