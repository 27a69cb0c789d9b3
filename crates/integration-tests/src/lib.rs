//! Integration test support for the SriSri catalog client.
//!
//! [`MockApi`] serves an in-memory copy of the catalog REST API and a fake
//! object-storage endpoint on an ephemeral local port. It counts requests per
//! route so tests can assert when the client hit the network and when it
//! answered from cache.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p srisri-integration-tests
//! ```
//!
//! # Mock behavior
//!
//! - `POST /api/auth/login` accepts `a@b.com` / `x` and issues token `t1`
//! - Writes and presigned URLs require `Authorization: Bearer t1`
//! - [`MockApi::revoke_tokens`] makes every authenticated route answer 401
//! - `POST /storage` answers 403 for any upload whose file name contains
//!   `reject`

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::Json;
use axum::Router;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};
use srisri_client::{CatalogClient, ClientConfig, LoginCredentials, MemorySessionStore};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Email accepted by the mock login endpoint.
pub const ADMIN_EMAIL: &str = "a@b.com";
/// Password accepted by the mock login endpoint.
pub const ADMIN_PASSWORD: &str = "x";
/// Token issued on successful login.
pub const ADMIN_TOKEN: &str = "t1";

const TIMESTAMP: &str = "2025-01-01T00:00:00Z";

/// One request received by the fake storage endpoint.
#[derive(Debug, Clone)]
pub struct StorageUpload {
    /// `Authorization` header, if the client sent one.
    pub authorization: Option<String>,
    /// Multipart field names in the order received.
    pub fields: Vec<String>,
    /// Value of the `key` form field.
    pub key: Option<String>,
    /// Size of the `file` part.
    pub size: usize,
}

// =============================================================================
// State
// =============================================================================

struct MockState {
    base_url: String,
    products: Mutex<BTreeMap<String, Value>>,
    categories: Mutex<BTreeMap<String, Value>>,
    hits: Mutex<HashMap<String, usize>>,
    uploads: Mutex<Vec<StorageUpload>>,
    revoked: AtomicBool,
    next_id: AtomicUsize,
}

impl MockState {
    fn hit(&self, route: &str) {
        *lock(&self.hits).entry(route.to_owned()).or_insert(0) += 1;
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {ADMIN_TOKEN}");
        !self.revoked.load(Ordering::SeqCst)
            && headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == expected)
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

fn unauthorized() -> Response {
    fail(StatusCode::UNAUTHORIZED, "Unauthorized")
}

/// Overwrite `target`'s fields with `patch`'s and bump `updatedAt`.
fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
        target.insert("updatedAt".to_string(), json!(TIMESTAMP));
    }
}

fn matches_flag(item: &Value, field: &str, wanted: Option<&String>) -> bool {
    wanted.is_none_or(|wanted| {
        item.get(field)
            .and_then(Value::as_bool)
            .is_some_and(|value| value.to_string() == *wanted)
    })
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<LoginBody>) -> Response {
    state.hit("POST /api/auth/login");
    if body.email != ADMIN_EMAIL || body.password != ADMIN_PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    ok(json!({
        "token": ADMIN_TOKEN,
        "user": { "email": ADMIN_EMAIL, "name": "A" },
    }))
}

async fn list_products(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("GET /api/products");
    let search = query.get("search").map(|s| s.to_lowercase());
    let products: Vec<Value> = lock(&state.products)
        .values()
        .filter(|p| {
            query
                .get("category")
                .is_none_or(|c| p.get("category").and_then(Value::as_str) == Some(c.as_str()))
        })
        .filter(|p| matches_flag(p, "isActive", query.get("isActive")))
        .filter(|p| {
            search.as_deref().is_none_or(|s| {
                p.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| name.to_lowercase().contains(s))
            })
        })
        .cloned()
        .collect();

    ok(json!({ "products": products, "count": products.len() }))
}

async fn get_product(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.hit("GET /api/products/{id}");
    lock(&state.products)
        .get(&id)
        .cloned()
        .map_or_else(|| fail(StatusCode::NOT_FOUND, "Product not found"), ok)
}

async fn create_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit("POST /api/products");
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let id = state.next_id("p");
    merge(
        &mut body,
        &json!({ "productId": id, "createdAt": TIMESTAMP }),
    );
    lock(&state.products).insert(id, body.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "data": body }))).into_response()
}

async fn update_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Response {
    state.hit("PUT /api/products/{id}");
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let mut products = lock(&state.products);
    let Some(product) = products.get_mut(&id) else {
        return fail(StatusCode::NOT_FOUND, "Product not found");
    };
    merge(product, &patch);
    ok(product.clone())
}

async fn delete_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.hit("DELETE /api/products/{id}");
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if lock(&state.products).remove(&id).is_none() {
        return fail(StatusCode::NOT_FOUND, "Product not found");
    }
    Json(json!({ "success": true, "message": "Product deleted" })).into_response()
}

async fn list_categories(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("GET /api/categories");
    let categories: Vec<Value> = lock(&state.categories)
        .values()
        .filter(|c| matches_flag(c, "isActive", query.get("isActive")))
        .cloned()
        .collect();
    ok(json!({ "categories": categories }))
}

async fn get_category(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.hit("GET /api/categories/{id}");
    lock(&state.categories)
        .get(&id)
        .cloned()
        .map_or_else(|| fail(StatusCode::NOT_FOUND, "Category not found"), ok)
}

async fn create_category(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit("POST /api/categories");
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let slug = body.get("slug").cloned();
    let taken = lock(&state.categories)
        .values()
        .any(|c| c.get("slug") == slug.as_ref());
    if taken {
        return fail(StatusCode::CONFLICT, "Category slug already exists");
    }

    let id = state.next_id("c");
    merge(
        &mut body,
        &json!({ "categoryId": id, "createdAt": TIMESTAMP }),
    );
    lock(&state.categories).insert(id, body.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "data": body }))).into_response()
}

async fn update_category(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Response {
    state.hit("PUT /api/categories/{id}");
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let mut categories = lock(&state.categories);
    let Some(category) = categories.get_mut(&id) else {
        return fail(StatusCode::NOT_FOUND, "Category not found");
    };
    merge(category, &patch);
    ok(category.clone())
}

async fn delete_category(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.hit("DELETE /api/categories/{id}");
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if lock(&state.categories).remove(&id).is_none() {
        return fail(StatusCode::NOT_FOUND, "Category not found");
    }
    Json(json!({ "success": true, "message": "Category deleted" })).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignBody {
    file_name: String,
    file_type: String,
}

async fn presign(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<PresignBody>,
) -> Response {
    state.hit("POST /api/upload/presigned-url");
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let key = format!("products/{}", body.file_name);
    ok(json!({
        "uploadUrl": format!("{}/storage", state.base_url),
        "uploadFields": {
            "key": key,
            "Content-Type": body.file_type,
            "policy": "mock-policy",
        },
        "fileUrl": format!("{}/files/{key}", state.base_url),
        "key": key,
    }))
}

async fn storage(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    state.hit("POST /storage");
    let mut upload = StorageUpload {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        fields: Vec::new(),
        key: None,
        size: 0,
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "file" {
            upload.size = field.bytes().await.map_or(0, |b| b.len());
        } else if name == "key" {
            upload.key = field.text().await.ok();
        }
        upload.fields.push(name);
    }

    let rejected = upload.key.as_deref().is_some_and(|k| k.contains("reject"));
    lock(&state.uploads).push(upload);

    if rejected {
        StatusCode::FORBIDDEN.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/upload/presigned-url", post(presign))
        .route("/storage", post(storage))
        .with_state(state)
}

// =============================================================================
// MockApi
// =============================================================================

/// A running mock of the catalog API. The server stops when this is dropped.
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Start the mock on `127.0.0.1` with an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock API listener");
        let addr = listener.local_addr().expect("read mock API address");

        let state = Arc::new(MockState {
            base_url: format!("http://{addr}"),
            products: Mutex::new(BTreeMap::new()),
            categories: Mutex::new(BTreeMap::new()),
            hits: Mutex::new(HashMap::new()),
            uploads: Mutex::new(Vec::new()),
            revoked: AtomicBool::new(false),
            next_id: AtomicUsize::new(0),
        });

        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, server }
    }

    /// Base URL of the mock, e.g. `http://127.0.0.1:54321`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointed at this mock.
    ///
    /// # Panics
    ///
    /// Panics if the mock URL does not parse, which cannot happen for a
    /// socket address.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_api(self.url().parse().expect("mock URL parses"))
    }

    /// A fresh client with an in-memory session.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> CatalogClient {
        CatalogClient::with_store(self.config(), Arc::new(MemorySessionStore::new()))
            .expect("build catalog client")
    }

    /// A fresh client already signed in as the mock admin.
    ///
    /// # Panics
    ///
    /// Panics if login fails.
    pub async fn signed_in_client(&self) -> CatalogClient {
        let client = self.client();
        let credentials =
            LoginCredentials::new(ADMIN_EMAIL, ADMIN_PASSWORD).expect("valid credentials");
        client
            .auth()
            .login(&credentials)
            .await
            .expect("mock login succeeds");
        client
    }

    /// Number of requests received for `route`, e.g. `"GET /api/products"` or
    /// `"DELETE /api/categories/{id}"`.
    #[must_use]
    pub fn hits(&self, route: &str) -> usize {
        lock(&self.state.hits).get(route).copied().unwrap_or(0)
    }

    /// Requests received by the storage endpoint, in arrival order.
    #[must_use]
    pub fn uploads(&self) -> Vec<StorageUpload> {
        lock(&self.state.uploads).clone()
    }

    /// Make every authenticated route answer 401 from now on.
    pub fn revoke_tokens(&self) {
        self.state.revoked.store(true, Ordering::SeqCst);
    }

    /// Insert a category directly.
    pub fn seed_category(&self, id: &str, name: &str, slug: &str, display_order: i32) {
        let category = json!({
            "categoryId": id,
            "name": name,
            "slug": slug,
            "description": "",
            "imageUrl": "",
            "displayOrder": display_order,
            "isActive": true,
            "createdAt": TIMESTAMP,
            "updatedAt": TIMESTAMP,
        });
        lock(&self.state.categories).insert(id.to_owned(), category);
    }

    /// Insert an active product directly.
    pub fn seed_product(&self, id: &str, name: &str, price: u32, category: &str) {
        let product = json!({
            "productId": id,
            "name": name,
            "description": "",
            "price": price,
            "category": category,
            "images": [format!("https://cdn.example.com/products/{id}.jpg")],
            "sizes": ["Free Size"],
            "colors": ["Red"],
            "stock": 10,
            "isActive": true,
            "createdAt": TIMESTAMP,
            "updatedAt": TIMESTAMP,
        });
        lock(&self.state.products).insert(id.to_owned(), product);
    }

    /// Replace a seeded product's sizes and colors with arbitrary labels.
    pub fn set_product_variants(&self, id: &str, sizes: &[&str], colors: &[&str]) {
        if let Some(product) = lock(&self.state.products).get_mut(id) {
            merge(product, &json!({ "sizes": sizes, "colors": colors }));
        }
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}
