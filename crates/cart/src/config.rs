//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `ROCKETSHOES_API_URL` - Store API base URL (default: <http://localhost:3333>)
//! - `ROCKETSHOES_API_TOKEN` - Bearer token sent with every API request
//! - `ROCKETSHOES_STORAGE_DIR` - Directory holding the persisted cart (default: .rocketshoes)
//! - `ROCKETSHOES_CATALOG_CACHE_TTL_SECS` - Product metadata cache TTL (default: 300)
//! - `ROCKETSHOES_HTTP_TIMEOUT_SECS` - Request timeout (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Clone)]
pub struct CartConfig {
    /// Base URL of the store API serving `/stock/{id}` and `/products/{id}`
    pub api_url: Url,
    /// Optional bearer token for the store API
    pub api_token: Option<SecretString>,
    /// Directory the persisted cart is written to
    pub storage_dir: PathBuf,
    /// How long product metadata stays cached
    pub catalog_cache_ttl: Duration,
    /// Per-request timeout; `None` waits indefinitely
    pub http_timeout: Option<Duration>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for CartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("storage_dir", &self.storage_dir)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .field("http_timeout", &self.http_timeout)
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            http_timeout: None,
            sentry_dsn: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = match get_optional_env("ROCKETSHOES_API_URL") {
            Some(raw) => parse_api_url(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), e))?,
            None => default_api_url(),
        };

        let catalog_cache_ttl = Duration::from_secs(
            parse_optional_env::<u64>("ROCKETSHOES_CATALOG_CACHE_TTL_SECS")?
                .unwrap_or(DEFAULT_CATALOG_CACHE_TTL_SECS),
        );

        let http_timeout = parse_optional_env::<u64>("ROCKETSHOES_HTTP_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            api_url,
            api_token: get_optional_env("ROCKETSHOES_API_TOKEN").map(SecretString::from),
            storage_dir: PathBuf::from(get_env_or_default(
                "ROCKETSHOES_STORAGE_DIR",
                DEFAULT_STORAGE_DIR,
            )),
            catalog_cache_ttl,
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

#[allow(clippy::expect_used)] // Constant input, covered by tests
fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

/// Parse an API base URL, accepting only http(s).
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional environment variable.
fn parse_optional_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}
