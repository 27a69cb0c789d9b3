//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SRISRI_API_URL` - Origin of the catalog REST API
//!
//! ## Optional
//! - `SRISRI_CDN_URL` - Asset CDN origin for relative image keys
//! - `SRISRI_PHONE` - Contact phone number (default: +91-1234567890)
//! - `SRISRI_WHATSAPP` - WhatsApp number (default: +911234567890)
//! - `SRISRI_SESSION_FILE` - Session file (default: `$HOME/.config/srisri/session.json`)
//! - `SRISRI_CACHE_TTL_SECS` - Query cache TTL in seconds (default: 300)
//! - `SRISRI_UPLOAD_CONCURRENCY` - Parallel uploads per batch (default: 4)
//! - `SRISRI_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_PHONE: &str = "+91-1234567890";
const DEFAULT_WHATSAPP: &str = "+911234567890";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const SESSION_FILE_NAME: &str = "srisri-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin, e.g. `https://api.srisriethnics.in`
    pub api_url: Url,
    /// CDN origin that relative image keys resolve against
    pub cdn_url: Option<Url>,
    /// Contact details shown next to products
    pub contact: ContactConfig,
    /// Where the auth session is persisted
    pub session_file: PathBuf,
    /// Time-to-live for cached query results
    pub cache_ttl: Duration,
    /// Maximum parallel uploads within one batch
    pub upload_concurrency: usize,
    /// Per-request timeout
    pub http_timeout: Duration,
}

/// Shop contact numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactConfig {
    pub phone: String,
    pub whatsapp: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            phone: DEFAULT_PHONE.to_string(),
            whatsapp: DEFAULT_WHATSAPP.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SRISRI_API_URL` is missing or any variable
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let api_url = env.url("SRISRI_API_URL")?;
        let cdn_url = env
            .optional("SRISRI_CDN_URL")
            .map(|raw| parse_url("SRISRI_CDN_URL", &raw))
            .transpose()?;

        let contact = ContactConfig {
            phone: env.or_default("SRISRI_PHONE", DEFAULT_PHONE),
            whatsapp: env.or_default("SRISRI_WHATSAPP", DEFAULT_WHATSAPP),
        };

        let session_file = env.optional("SRISRI_SESSION_FILE").map_or_else(
            || default_session_file(env.optional("HOME")),
            PathBuf::from,
        );

        let cache_ttl = Duration::from_secs(env.parsed("SRISRI_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?);
        let http_timeout =
            Duration::from_secs(env.parsed("SRISRI_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?);

        let upload_concurrency: usize =
            env.parsed("SRISRI_UPLOAD_CONCURRENCY", DEFAULT_UPLOAD_CONCURRENCY)?;
        if upload_concurrency == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SRISRI_UPLOAD_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            cdn_url,
            contact,
            session_file,
            cache_ttl,
            upload_concurrency,
            http_timeout,
        })
    }

    /// Configuration for an API origin with every other setting defaulted.
    ///
    /// The session file is placed in the system temp directory.
    #[must_use]
    pub fn for_api(api_url: Url) -> Self {
        Self {
            api_url,
            cdn_url: None,
            contact: ContactConfig::default(),
            session_file: std::env::temp_dir().join(SESSION_FILE_NAME),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn url(&self, key: &str) -> Result<Url, ConfigError> {
        parse_url(key, &self.required(key)?)
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn default_session_file(home: Option<String>) -> PathBuf {
    home.map_or_else(
        || PathBuf::from(SESSION_FILE_NAME),
        |home| PathBuf::from(home).join(".config").join("srisri").join("session.json"),
    )
}
