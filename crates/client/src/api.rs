//! REST transport for the catalog API.
//!
//! Every call resolves to an [`ApiResponse`] envelope, never a panic or a
//! transport-level `Err`: network failures and non-2xx statuses are folded
//! into `success = false` with a readable `error`. Callers turn the envelope
//! into a `Result` with [`ApiResponse::into_result`] or
//! [`ApiResponse::into_ack`].

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::error::ClientError;
use crate::session::Session;

const USER_AGENT: &str = concat!("srisri-client/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Envelope
// =============================================================================

/// The `{success, data, error, message}` wrapper every endpoint returns.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
    /// HTTP status, absent when no response arrived.
    #[serde(skip)]
    pub status: Option<u16>,
    #[serde(skip)]
    endpoint: String,
}

impl<T> ApiResponse<T> {
    fn failure(endpoint: &str, status: Option<u16>, error: String, message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            message,
            status,
            endpoint: endpoint.to_owned(),
        }
    }

    /// Best available description of a failure: the body's `error`, then its
    /// `message`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }

    /// Require a successful response carrying `data`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure, or [`ClientError::MissingData`] when a
    /// successful response has no payload.
    pub fn into_result(self) -> Result<T, ClientError> {
        if !self.success {
            return Err(self.into_error());
        }
        self.data.ok_or(ClientError::MissingData(self.endpoint))
    }

    /// Require a successful response, ignoring any payload.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    pub fn into_ack(self) -> Result<(), ClientError> {
        if self.success {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> ClientError {
        let message = self
            .error_message()
            .map_or_else(|| generic_message(self.status), str::to_owned);

        match self.status {
            None => ClientError::Transport(message),
            Some(401) => ClientError::Unauthorized(message),
            Some(status) => ClientError::Api { status, message },
        }
    }
}

/// Error body shape used when the typed payload does not parse.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn generic_message(status: Option<u16>) -> String {
    status.map_or_else(
        || "Request failed".to_string(),
        |status| format!("Request failed with status {status}"),
    )
}

// =============================================================================
// ApiClient
// =============================================================================

/// HTTP client bound to one API origin and one session.
///
/// Cheap to clone; clones share the connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base: Url,
    session: Session,
}

impl ApiClient {
    /// Create a client for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the API URL
    /// cannot carry a path.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ClientError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "SRISRI_API_URL".to_string(),
                format!("{} cannot carry a path", config.api_url),
            )
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base: config.api_url.clone(),
                session,
            }),
        })
    }

    /// The session whose token this client sends.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Build the URL for `segments` under the API origin.
    ///
    /// Segments are percent-encoded individually, so ids may contain any
    /// character. Query pairs are form-encoded in the order given.
    #[must_use]
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.inner.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Send a request and normalize the outcome into an envelope.
    ///
    /// The stored bearer token is attached when present. A 401 answer to a
    /// request that carried a token clears the session.
    pub async fn request<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(method, segments, query, body, Bearer::Session)
            .await
    }

    /// `POST` without the stored token. A 401 answer leaves the session
    /// untouched.
    pub async fn post_anonymous<T, B>(&self, segments: &[&str], body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, segments, &[], Some(body), Bearer::Omit)
            .await
    }

    #[instrument(skip(self, segments, query, body), fields(path = %segments.join("/")))]
    async fn send<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
        bearer: Bearer,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments, query);
        let endpoint = format!("{method} {}", url.path());

        let token = match bearer {
            Bearer::Session => self.inner.session.token(),
            Bearer::Omit => None,
        };
        let mut request = self.inner.client.request(method, url);
        if let Some(token) = &token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Request failed before a response arrived");
                return ApiResponse::failure(&endpoint, None, e.to_string(), None);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(status = %status, error = %e, "Failed to read response body");
                return ApiResponse::failure(&endpoint, None, e.to_string(), None);
            }
        };

        if status == StatusCode::UNAUTHORIZED && token.is_some() {
            warn!("API rejected the session token; signing out");
            if let Err(e) = self.inner.session.clear() {
                error!(error = %e, "Failed to clear rejected session");
            }
        }

        if !status.is_success() {
            debug!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let error = body
                .error
                .or_else(|| body.message.clone())
                .unwrap_or_else(|| generic_message(Some(status.as_u16())));
            return ApiResponse::failure(&endpoint, Some(status.as_u16()), error, body.message);
        }

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(mut envelope) => {
                envelope.status = Some(status.as_u16());
                envelope.endpoint = endpoint;
                envelope
            }
            Err(e) => {
                error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "Failed to parse API response"
                );
                ApiResponse::failure(
                    &endpoint,
                    Some(status.as_u16()),
                    format!("Invalid response from server: {e}"),
                    None,
                )
            }
        }
    }

    /// `GET` with query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> ApiResponse<T> {
        self.request::<T, ()>(Method::GET, segments, query, None)
            .await
    }

    /// `POST` a JSON body.
    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, segments, &[], Some(body)).await
    }

    /// `PUT` a JSON body.
    pub async fn put<T, B>(&self, segments: &[&str], body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, segments, &[], Some(body)).await
    }

    /// `DELETE`; any payload is discarded.
    pub async fn delete(&self, segments: &[&str]) -> ApiResponse<IgnoredAny> {
        self.request::<IgnoredAny, ()>(Method::DELETE, segments, &[], None)
            .await
    }
}

/// Whether a request carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bearer {
    Session,
    Omit,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::for_api(Url::parse(base).unwrap());
        ApiClient::new(&config, Session::in_memory()).unwrap()
    }

    fn envelope(json: &str) -> ApiResponse<serde_json::Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_url_building() {
        let api = client("https://api.example.com");
        let url = api.url(
            &["api", "products"],
            &[("category", "sarees".to_string()), ("search", "red silk".to_string())],
        );
        assert_eq!(
            url.as_str(),
            "https://api.example.com/api/products?category=sarees&search=red+silk"
        );
    }

    #[test]
    fn test_url_encodes_segments_and_keeps_prefix() {
        let api = client("https://example.com/backend/");
        let url = api.url(&["api", "products", "a/b c"], &[]);
        assert_eq!(url.as_str(), "https://example.com/backend/api/products/a%2Fb%20c");
    }

    #[test]
    fn test_into_result_requires_data() {
        let ok = envelope(r#"{"success":true,"data":{"id":1}}"#);
        assert_eq!(ok.into_result().unwrap()["id"], 1);

        let empty = envelope(r#"{"success":true}"#);
        assert!(matches!(empty.into_result(), Err(ClientError::MissingData(_))));
        assert!(envelope(r#"{"success":true}"#).into_ack().is_ok());
    }

    #[test]
    fn test_error_classification() {
        let unauthorized: ApiResponse<()> =
            ApiResponse::failure("GET /x", Some(401), "Invalid token".into(), None);
        assert!(matches!(
            unauthorized.into_ack(),
            Err(ClientError::Unauthorized(ref m)) if m == "Invalid token"
        ));

        let missing: ApiResponse<()> =
            ApiResponse::failure("GET /x", Some(404), "Product not found".into(), None);
        assert!(matches!(
            missing.into_ack(),
            Err(ClientError::Api { status: 404, ref message }) if message == "Product not found"
        ));

        let offline: ApiResponse<()> =
            ApiResponse::failure("GET /x", None, "connection refused".into(), None);
        assert!(matches!(offline.into_ack(), Err(ClientError::Transport(_))));
    }

    #[test]
    fn test_success_false_uses_message_fallback() {
        let mut body = envelope(r#"{"success":false,"message":"Slug already exists"}"#);
        body.status = Some(200);
        let err = body.into_ack().unwrap_err();
        assert_eq!(err.to_string(), "API error (200): Slug already exists");

        let mut bare = envelope(r#"{"success":false}"#);
        bare.status = Some(500);
        assert_eq!(
            bare.into_ack().unwrap_err().to_string(),
            "API error (500): Request failed with status 500"
        );
    }
}
