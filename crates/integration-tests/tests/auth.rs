//! Login, logout and session invalidation against the mock API.

#![allow(clippy::unwrap_used)]

use srisri_client::{AuthState, ClientConfig, ClientError, LoginCredentials};
use srisri_core::{CategoryInput, CategoryPatch, CategoryId};
use srisri_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, MockApi};

#[tokio::test]
async fn test_login_persists_session() {
    let api = MockApi::start().await;
    let client = api.client();
    let auth = client.auth();
    assert!(!auth.is_authenticated());

    let credentials = LoginCredentials::new(ADMIN_EMAIL, ADMIN_PASSWORD).unwrap();
    let session = auth.login(&credentials).await.unwrap();

    assert_eq!(session.user.name, "A");
    assert!(auth.is_authenticated());
    assert_eq!(auth.user().unwrap().name, "A");
    assert_eq!(auth.user().unwrap().email.as_str(), "a@b.com");
    assert_eq!(*auth.subscribe().borrow(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let api = MockApi::start().await;
    let client = api.signed_in_client().await;
    let auth = client.auth();
    let mut states = auth.subscribe();
    assert!(auth.is_authenticated());

    auth.logout().unwrap();

    assert!(!auth.is_authenticated());
    assert!(auth.user().is_none());
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_login_failure_carries_server_message() {
    let api = MockApi::start().await;
    let client = api.client();

    let credentials = LoginCredentials::new(ADMIN_EMAIL, "wrong").unwrap();
    let err = client.auth().login(&credentials).await.unwrap_err();

    assert!(matches!(err, ClientError::LoginFailed(ref m) if m == "Invalid credentials"));
    assert!(!client.auth().is_authenticated());
}

#[tokio::test]
async fn test_bad_relogin_keeps_existing_session() {
    let api = MockApi::start().await;
    let client = api.signed_in_client().await;
    let mut states = client.auth().subscribe();

    let credentials = LoginCredentials::new(ADMIN_EMAIL, "wrong").unwrap();
    let err = client.auth().login(&credentials).await.unwrap_err();

    assert!(matches!(err, ClientError::LoginFailed(ref m) if m == "Invalid credentials"));
    assert!(client.auth().is_authenticated());
    assert_eq!(client.auth().user().unwrap().name, "A");
    assert!(!states.has_changed().unwrap());
    assert_eq!(api.hits("POST /api/auth/login"), 2);
}

#[tokio::test]
async fn test_rejected_token_signs_out() {
    let api = MockApi::start().await;
    api.seed_category("c1", "Sarees", "sarees", 1);
    let client = api.signed_in_client().await;
    let mut states = client.auth().subscribe();

    api.revoke_tokens();
    let patch = CategoryPatch {
        display_order: Some(2),
        ..CategoryPatch::default()
    };
    let err = client
        .categories()
        .update(&CategoryId::new("c1"), &patch)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(err.status(), Some(401));
    assert!(!client.auth().is_authenticated());
    assert_eq!(*states.borrow_and_update(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_anonymous_write_is_unauthorized() {
    let api = MockApi::start().await;
    let client = api.client();

    let input = CategoryInput::from_name("Kurtis").unwrap();
    let err = client.categories().create(&input).await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Unauthorized"));
    assert_eq!(api.hits("POST /api/categories"), 1);
}

#[tokio::test]
async fn test_unreachable_api_is_a_transport_error() {
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::for_api(format!("http://127.0.0.1:{port}").parse().unwrap());
    let client = srisri_client::CatalogClient::with_store(
        config,
        std::sync::Arc::new(srisri_client::MemorySessionStore::new()),
    )
    .unwrap();

    let err = client.categories().list(None).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
