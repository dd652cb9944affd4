//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CRAFTY_BACKEND` - Item store backend: `local` (default) or `remote`
//! - `CRAFTY_SNAPSHOT_PATH` - JSON file mirroring the local catalog across
//!   restarts (local backend only)
//! - `CRAFTY_REQUEST_TIMEOUT_SECS` - Per-request timeout for the remote
//!   backend (default: 30)
//!
//! ## Required with `CRAFTY_BACKEND=remote`
//! - `CRAFTY_BACKEND_URL` - Base URL of the hosted item store API
//! - `CRAFTY_BACKEND_API_KEY` - Bearer credential for the hosted API

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Which item store backs the catalog.
    pub backend: BackendConfig,
}

/// Item store backend selection.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// On-device storage with an optional JSON snapshot file.
    Local {
        /// Where to mirror the item collection, if anywhere.
        snapshot_path: Option<PathBuf>,
    },
    /// Hosted backend over HTTP.
    Remote(RemoteStoreConfig),
}

/// Remote item store connection settings.
///
/// Implements `Debug` manually to redact the credential.
#[derive(Clone)]
pub struct RemoteStoreConfig {
    /// Base URL of the hosted item store API.
    pub base_url: String,
    /// Bearer credential for the hosted API.
    pub api_key: SecretString,
    /// Per-request timeout. The change-feed connection is exempt since it
    /// is deliberately long-lived.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for RemoteStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = match get_env_or_default("CRAFTY_BACKEND", "local").as_str() {
            "local" => BackendConfig::Local {
                snapshot_path: get_optional_env("CRAFTY_SNAPSHOT_PATH").map(PathBuf::from),
            },
            "remote" => BackendConfig::Remote(RemoteStoreConfig::from_env()?),
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "CRAFTY_BACKEND".to_string(),
                    format!("expected `local` or `remote`, got `{other}`"),
                ));
            }
        };

        Ok(Self { backend })
    }

    /// Configuration for an in-process local backend with no snapshot.
    ///
    /// Handy default for embedders and tests that wire their own store.
    #[must_use]
    pub const fn local() -> Self {
        Self {
            backend: BackendConfig::Local {
                snapshot_path: None,
            },
        }
    }
}

impl RemoteStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("CRAFTY_BACKEND_URL")?;
        validate_base_url(&base_url)?;

        let api_key = SecretString::from(get_required_env("CRAFTY_BACKEND_API_KEY")?);

        let request_timeout = get_env_or_default(
            "CRAFTY_REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CRAFTY_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            api_key,
            request_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a backend URL parses and has a host.
fn validate_base_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("CRAFTY_BACKEND_URL".to_string(), e.to_string())
    })?;

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "CRAFTY_BACKEND_URL".to_string(),
            "must have a host".to_string(),
        ));
    }

    Ok(())
}
