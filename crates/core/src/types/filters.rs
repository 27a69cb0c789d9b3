//! Product listing filters, sort options and price-range presets.

use core::fmt;
use std::cmp::Reverse;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::price::Price;
use super::product::Product;

/// Filters for a product listing request.
///
/// [`ProductFilters::query_pairs`] is the single serialization of a filter
/// set: it drives both the request query string and the cache key, so equal
/// filters always hit the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Pagination cursor returned by the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,
}

impl ProductFilters {
    /// Filters used by the public storefront: active products only.
    #[must_use]
    pub fn storefront() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Apply a price-range preset, replacing any existing bounds.
    #[must_use]
    pub fn with_price_range(mut self, range: &PriceRange) -> Self {
        self.min_price = Some(range.min_price());
        self.max_price = range.max_price();
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The same filters pointed at the page after `last_key`.
    #[must_use]
    pub fn next_page(&self, last_key: impl Into<String>) -> Self {
        Self {
            last_key: Some(last_key.into()),
            ..self.clone()
        }
    }

    /// Serialize to query parameters in a fixed field order.
    ///
    /// Absent values, empty strings, zero prices and a zero limit are left
    /// out, matching what the storefront has always sent. Prices are
    /// normalized so `1000.00` and `1000` produce the same pair.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(category) = non_empty(self.category.as_deref()) {
            pairs.push(("category", category.to_owned()));
        }
        if let Some(search) = non_empty(self.search.as_deref()) {
            pairs.push(("search", search.to_owned()));
        }
        if let Some(min) = self.min_price.filter(|p| !p.is_zero()) {
            pairs.push(("minPrice", min.normalized().to_string()));
        }
        if let Some(max) = self.max_price.filter(|p| !p.is_zero()) {
            pairs.push(("maxPrice", max.normalized().to_string()));
        }
        if let Some(active) = self.is_active {
            pairs.push(("isActive", active.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(last_key) = non_empty(self.last_key.as_deref()) {
            pairs.push(("lastKey", last_key.to_owned()));
        }

        pairs
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Client-side ordering for a fetched page of products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl SortOption {
    pub const ALL: [Self; 4] = [Self::Newest, Self::PriceAsc, Self::PriceDesc, Self::NameAsc];

    /// Wire value, e.g. `price-asc`.
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest First",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::NameAsc => "Name: A to Z",
        }
    }

    /// Sort products in place. The sort is stable.
    pub fn apply(self, products: &mut [Product]) {
        match self {
            Self::Newest => products.sort_by_key(|p| Reverse(p.created_at)),
            Self::PriceAsc => products.sort_by_key(|p| p.price),
            Self::PriceDesc => products.sort_by_key(|p| Reverse(p.price)),
            Self::NameAsc => products.sort_by_cached_key(|p| p.name.to_lowercase()),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.value() == s)
            .ok_or_else(|| format!("unknown sort option: {s}"))
    }
}

/// A price-range preset offered in the listing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    /// Lower bound in rupees.
    pub min: i64,
    /// Upper bound in rupees, `None` for open-ended.
    pub max: Option<i64>,
    pub label: &'static str,
}

impl PriceRange {
    #[must_use]
    pub fn min_price(&self) -> Price {
        Price::from_rupees(self.min)
    }

    #[must_use]
    pub fn max_price(&self) -> Option<Price> {
        self.max.map(Price::from_rupees)
    }

    /// Whether `price` falls inside the range (upper bound inclusive).
    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        price >= self.min_price() && self.max_price().is_none_or(|max| price <= max)
    }
}

/// The storefront's price-range presets.
pub const PRICE_RANGES: [PriceRange; 5] = [
    PriceRange {
        min: 0,
        max: Some(1_000),
        label: "Under ₹1,000",
    },
    PriceRange {
        min: 1_000,
        max: Some(5_000),
        label: "₹1,000 - ₹5,000",
    },
    PriceRange {
        min: 5_000,
        max: Some(10_000),
        label: "₹5,000 - ₹10,000",
    },
    PriceRange {
        min: 10_000,
        max: Some(50_000),
        label: "₹10,000 - ₹50,000",
    },
    PriceRange {
        min: 50_000,
        max: None,
        label: "Above ₹50,000",
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_fixed_order() {
        let filters = ProductFilters {
            last_key: Some("k9".to_string()),
            limit: Some(20),
            is_active: Some(true),
            max_price: Some(Price::from_rupees(5000)),
            min_price: Some(Price::from_rupees(1000)),
            search: Some("silk".to_string()),
            category: Some("sarees".to_string()),
        };
        let keys: Vec<_> = filters.query_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["category", "search", "minPrice", "maxPrice", "isActive", "limit", "lastKey"]
        );
    }

    #[test]
    fn test_query_pairs_skip_empty_and_zero() {
        let filters = ProductFilters {
            category: Some(String::new()),
            min_price: Some(Price::from_rupees(0)),
            limit: Some(0),
            is_active: Some(false),
            ..ProductFilters::default()
        };
        assert_eq!(filters.query_pairs(), vec![("isActive", "false".to_string())]);
        assert!(ProductFilters::default().query_pairs().is_empty());
    }

    #[test]
    fn test_query_pairs_normalize_prices() {
        let a = ProductFilters {
            max_price: Some("1000.00".parse().unwrap()),
            ..ProductFilters::default()
        };
        let b = ProductFilters {
            max_price: Some(Price::from_rupees(1000)),
            ..ProductFilters::default()
        };
        assert_eq!(a.query_pairs(), b.query_pairs());
        assert_eq!(a.query_pairs()[0].1, "1000");
    }

    #[test]
    fn test_price_range_presets() {
        let filters = ProductFilters::storefront().with_price_range(&PRICE_RANGES[4]);
        assert_eq!(filters.max_price, None);
        assert_eq!(filters.min_price, Some(Price::from_rupees(50_000)));

        assert!(PRICE_RANGES[0].contains(Price::from_rupees(999)));
        assert!(PRICE_RANGES[0].contains(Price::from_rupees(1000)));
        assert!(!PRICE_RANGES[1].contains(Price::from_rupees(999)));
        assert!(PRICE_RANGES[4].contains(Price::from_rupees(1_000_000)));
    }

    #[test]
    fn test_next_page_keeps_filters() {
        let first = ProductFilters::storefront().with_category("sarees");
        let second = first.next_page("cursor-1");
        assert_eq!(second.category.as_deref(), Some("sarees"));
        assert_eq!(second.last_key.as_deref(), Some("cursor-1"));
    }

    fn product(id: &str, name: &str, price: i64, created: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "productId": id,
            "name": name,
            "price": price,
            "category": "sarees",
            "isActive": true,
            "createdAt": created,
            "updatedAt": created
        }))
        .unwrap()
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.product_id.as_str()).collect()
    }

    #[test]
    fn test_sort_apply() {
        let mut products = vec![
            product("a", "zari saree", 3000, "2025-01-02T00:00:00Z"),
            product("b", "Anarkali", 1500, "2025-01-03T00:00:00Z"),
            product("c", "lehenga", 9000, "2025-01-01T00:00:00Z"),
        ];

        SortOption::Newest.apply(&mut products);
        assert_eq!(ids(&products), vec!["b", "a", "c"]);

        SortOption::PriceAsc.apply(&mut products);
        assert_eq!(ids(&products), vec!["b", "a", "c"]);

        SortOption::PriceDesc.apply(&mut products);
        assert_eq!(ids(&products), vec!["c", "a", "b"]);

        SortOption::NameAsc.apply(&mut products);
        assert_eq!(ids(&products), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_option_parse() {
        assert_eq!("price-desc".parse::<SortOption>().unwrap(), SortOption::PriceDesc);
        assert!("cheapest".parse::<SortOption>().is_err());
        assert_eq!(SortOption::NameAsc.label(), "Name: A to Z");
    }
}
