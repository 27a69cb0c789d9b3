//! Cached reads and invalidate-on-write against the mock API.

#![allow(clippy::unwrap_used)]

use srisri_client::{ClientError, QueryKey, ResourceKind};
use srisri_core::{
    CategoryId, Price, ProductFilters, ProductId, ProductInput, ProductPatch, Size, Variant,
};
use srisri_integration_tests::MockApi;

fn saree_input() -> ProductInput {
    ProductInput {
        name: "Banarasi Silk Saree".to_string(),
        description: "Handwoven".to_string(),
        price: Price::from_rupees(5999),
        category: "sarees".to_string(),
        images: vec!["https://cdn.example.com/products/banarasi.jpg".to_string()],
        sizes: vec![Size::FreeSize, Size::FreeSize],
        colors: vec![],
        stock: 3,
        is_active: true,
    }
}

#[tokio::test]
async fn test_same_filters_reuse_cached_page() {
    let api = MockApi::start().await;
    api.seed_product("p1", "Silk Saree", 1200, "sarees");
    api.seed_product("p2", "Anarkali Suit", 3400, "suits");
    let client = api.client();
    let products = client.products();

    let filters = ProductFilters::storefront().with_category("sarees");
    let first = products.list(&filters).await.unwrap();
    let second = products.list(&filters.clone()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.count, 1);
    assert_eq!(api.hits("GET /api/products"), 1);

    products
        .list(&ProductFilters::storefront().with_category("suits"))
        .await
        .unwrap();
    assert_eq!(api.hits("GET /api/products"), 2);
}

#[tokio::test]
async fn test_create_invalidates_product_list() {
    let api = MockApi::start().await;
    let client = api.signed_in_client().await;
    let products = client.products();
    let filters = ProductFilters::default();

    assert_eq!(products.list(&filters).await.unwrap().count, 0);

    let created = products.create(saree_input()).await.unwrap();
    assert_eq!(created.sizes, vec![Variant::Known(Size::FreeSize)]);
    assert!(created.is_low_stock());

    let page = products.list(&filters).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(api.hits("GET /api/products"), 2);
}

#[tokio::test]
async fn test_update_invalidates_detail_entry() {
    let api = MockApi::start().await;
    api.seed_product("p1", "Silk Saree", 1200, "sarees");
    let client = api.signed_in_client().await;
    let products = client.products();
    let id = ProductId::new("p1");

    products.get(&id).await.unwrap();
    products.get(&id).await.unwrap();
    assert_eq!(api.hits("GET /api/products/{id}"), 1);

    let patch = ProductPatch {
        name: Some("Kanjivaram Silk Saree".to_string()),
        ..ProductPatch::default()
    };
    products.update(&id, &patch).await.unwrap();

    let product = products.get(&id).await.unwrap();
    assert_eq!(product.name, "Kanjivaram Silk Saree");
    assert_eq!(api.hits("GET /api/products/{id}"), 2);
}

#[tokio::test]
async fn test_delete_product_drops_list_and_detail() {
    let api = MockApi::start().await;
    api.seed_product("p1", "Silk Saree", 1200, "sarees");
    api.seed_product("p2", "Anarkali Suit", 3400, "suits");
    let client = api.signed_in_client().await;
    let products = client.products();
    let filters = ProductFilters::default();
    let id = ProductId::new("p1");

    assert_eq!(products.list(&filters).await.unwrap().count, 2);
    products.get(&id).await.unwrap();
    products.list(&filters).await.unwrap();
    products.get(&id).await.unwrap();
    assert_eq!(api.hits("GET /api/products"), 1);
    assert_eq!(api.hits("GET /api/products/{id}"), 1);

    products.delete(&id).await.unwrap();
    assert_eq!(api.hits("DELETE /api/products/{id}"), 1);

    let page = products.list(&filters).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(api.hits("GET /api/products"), 2);

    let err = products.get(&id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(api.hits("GET /api/products/{id}"), 2);
}

#[tokio::test]
async fn test_unlisted_variants_do_not_break_listing() {
    let api = MockApi::start().await;
    api.seed_product("p1", "Silk Saree", 1200, "sarees");
    api.seed_product("p2", "Cotton Kurta", 900, "kurtas");
    api.set_product_variants("p2", &["3XL"], &["Navy"]);
    let client = api.client();

    let page = client.products().list(&ProductFilters::default()).await.unwrap();
    assert_eq!(page.count, 2);

    let kurta = page
        .products
        .iter()
        .find(|p| p.product_id.as_str() == "p2")
        .unwrap();
    assert_eq!(kurta.sizes, vec![Variant::Other("3XL".to_string())]);
    assert_eq!(kurta.colors, vec![Variant::Other("Navy".to_string())]);

    let saree = client.products().get(&ProductId::new("p1")).await.unwrap();
    assert_eq!(saree.sizes, vec![Variant::Known(Size::FreeSize)]);
}

#[tokio::test]
async fn test_delete_category_refetches_list() {
    let api = MockApi::start().await;
    api.seed_category("c1", "Sarees", "sarees", 1);
    api.seed_category("c2", "Lehengas", "lehengas", 2);
    let client = api.signed_in_client().await;
    let categories = client.categories();

    let before = categories.list(None).await.unwrap();
    assert_eq!(before.len(), 2);
    categories.list(None).await.unwrap();
    assert_eq!(api.hits("GET /api/categories"), 1);

    categories.delete(&CategoryId::new("c1")).await.unwrap();

    let after = categories.list(None).await.unwrap();
    assert_eq!(api.hits("GET /api/categories"), 2);
    assert_eq!(after.len(), 1);
    assert_eq!(after.first().unwrap().slug.as_str(), "lehengas");
}

#[tokio::test]
async fn test_categories_sorted_by_display_order() {
    let api = MockApi::start().await;
    api.seed_category("a", "Suits", "suits", 3);
    api.seed_category("b", "Sarees", "sarees", 1);
    api.seed_category("c", "Dupattas", "dupattas", 2);
    let client = api.client();

    let slugs: Vec<String> = client
        .categories()
        .list(Some(true))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.slug.as_str().to_owned())
        .collect();
    assert_eq!(slugs, vec!["sarees", "dupattas", "suits"]);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let api = MockApi::start().await;
    let client = api.client();

    let err = client
        .products()
        .get(&ProductId::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 404, ref message } if message == "Product not found"
    ));
}

#[tokio::test]
async fn test_invalid_input_never_reaches_api() {
    let api = MockApi::start().await;
    let client = api.signed_in_client().await;

    let mut input = saree_input();
    input.images.clear();
    let err = client.products().create(input).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(api.hits("POST /api/products"), 0);
}

#[tokio::test]
async fn test_failed_write_keeps_cache() {
    let api = MockApi::start().await;
    api.seed_category("c1", "Sarees", "sarees", 1);
    let client = api.signed_in_client().await;
    let categories = client.categories();

    categories.list(None).await.unwrap();
    let err = categories.delete(&CategoryId::new("missing")).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    categories.list(None).await.unwrap();
    assert_eq!(api.hits("GET /api/categories"), 1);
}

#[tokio::test]
async fn test_explicit_invalidation() {
    let api = MockApi::start().await;
    api.seed_product("p1", "Silk Saree", 1200, "sarees");
    let client = api.client();
    let filters = ProductFilters::default();

    client.products().list(&filters).await.unwrap();
    client.cache().invalidate_key(&QueryKey::products(&filters)).await;
    client.products().list(&filters).await.unwrap();
    assert_eq!(api.hits("GET /api/products"), 2);

    client.cache().invalidate_resource(ResourceKind::Products).await;
    client.products().list(&filters).await.unwrap();
    assert_eq!(api.hits("GET /api/products"), 3);
}
