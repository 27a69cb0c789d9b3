//! Admin sign-in and sign-out.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use srisri_core::Email;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session::{AuthState, AuthUser, Session};

const LOGIN_FAILED: &str = "Login failed";

/// Email and password submitted to the login endpoint.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: Email,
    pub password: SecretString,
}

impl LoginCredentials {
    /// Parse the email and wrap the password.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Email`] if the email is malformed.
    pub fn new(email: &str, password: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            email: Email::parse(email)?,
            password: SecretString::from(password.into()),
        })
    }
}

/// A signed-in session as returned by [`AuthService::login`].
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: SecretString,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: AuthUser,
}

/// Login, logout and session queries.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn session(&self) -> &Session {
        self.api.session()
    }

    /// Exchange credentials for a token and persist the session.
    ///
    /// The current token is not sent, so refused credentials leave an
    /// existing session signed in.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LoginFailed`] with the server's message (or
    /// `Login failed`) when the credentials are refused or the request fails,
    /// and [`ClientError::Session`] if the session cannot be stored.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, ClientError> {
        let request = LoginRequest {
            email: credentials.email.as_str(),
            password: credentials.password.expose_secret(),
        };

        let response = self
            .api
            .post_anonymous::<LoginResponse, _>(&["api", "auth", "login"], &request)
            .await;

        if !response.success || response.data.is_none() {
            let message = response.error_message().unwrap_or(LOGIN_FAILED).to_owned();
            return Err(ClientError::LoginFailed(message));
        }
        let login = response.into_result()?;

        let token = SecretString::from(login.token);
        self.session().establish(&token, &login.user)?;
        info!(name = %login.user.name, "Signed in");

        Ok(AuthSession {
            token,
            user: login.user,
        })
    }

    /// Forget the stored token and profile.
    ///
    /// Subscribers see [`AuthState::Anonymous`] and should return to the
    /// login screen.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the session store cannot be
    /// written.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.session().clear()?;
        info!("Signed out");
        Ok(())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Profile stored at the last successful login.
    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        self.session().user()
    }

    /// Follow sign-in/sign-out transitions, including 401-triggered sign-outs.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.session().subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validate_email() {
        assert!(LoginCredentials::new("a@b.com", "x").is_ok());
        assert!(matches!(
            LoginCredentials::new("not-an-email", "x"),
            Err(ClientError::Email(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = LoginCredentials::new("a@b.com", "hunter2").unwrap();
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }

    #[test]
    fn test_login_request_shape() {
        let body = serde_json::to_value(LoginRequest {
            email: "a@b.com",
            password: "x",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"email": "a@b.com", "password": "x"}));
    }
}
