//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GO_MARKETPLACE_NAMESPACE` - Storage key namespace (default: @GoMarketplace)
//! - `GO_MARKETPLACE_DATA_DIR` - Directory for the file backend (default: .go-marketplace)
//! - `GO_MARKETPLACE_DECREMENT_POLICY` - `remove` or `clamp` (default: remove)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use go_marketplace_core::DecrementPolicy;
use thiserror::Error;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "@GoMarketplace";

const DEFAULT_DATA_DIR: &str = ".go-marketplace";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Options that control a single cart store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Namespace prefix of the storage key.
    pub namespace: String,
    /// Behavior when decrementing an item at quantity 1.
    pub decrement_policy: DecrementPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            decrement_policy: DecrementPolicy::default(),
        }
    }
}

impl StoreOptions {
    /// The single key under which the whole cart is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}:cart", self.namespace)
    }
}

/// Application-level cart configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Store options
    pub store: StoreOptions,
    /// Directory used by the file backend
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let namespace = get_env_or_default("GO_MARKETPLACE_NAMESPACE", DEFAULT_NAMESPACE);
        if namespace.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "GO_MARKETPLACE_NAMESPACE".to_string(),
                "namespace cannot be empty".to_string(),
            ));
        }

        let decrement_policy = get_env_or_default("GO_MARKETPLACE_DECREMENT_POLICY", "remove")
            .parse::<DecrementPolicy>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("GO_MARKETPLACE_DECREMENT_POLICY".to_string(), e)
            })?;

        let data_dir = PathBuf::from(get_env_or_default("GO_MARKETPLACE_DATA_DIR", DEFAULT_DATA_DIR));

        Ok(Self {
            store: StoreOptions {
                namespace,
                decrement_policy,
            },
            data_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}
