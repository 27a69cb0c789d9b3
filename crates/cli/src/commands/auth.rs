//! Session commands.

use serde_json::json;
use srisri_client::{CatalogClient, LoginCredentials};

use super::{CommandError, print_json};

/// Sign in and persist the session.
pub async fn login(client: &CatalogClient, email: &str, password: String) -> Result<(), CommandError> {
    let credentials = LoginCredentials::new(email, password)?;
    let session = client.auth().login(&credentials).await?;
    print_json(&json!({
        "authenticated": true,
        "user": session.user,
    }))
}

/// Forget the stored session.
pub fn logout(client: &CatalogClient) -> Result<(), CommandError> {
    client.auth().logout()?;
    print_json(&json!({ "authenticated": false }))
}

/// Show who is signed in, if anyone.
pub fn whoami(client: &CatalogClient) -> Result<(), CommandError> {
    let auth = client.auth();
    print_json(&json!({
        "authenticated": auth.is_authenticated(),
        "user": auth.user(),
    }))
}
