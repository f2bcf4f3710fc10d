//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `BRUME_CART_STORAGE_KEY` - Storage key holding the cart (default: `brume_cart`)
//! - `BRUME_STORAGE_DIR` - Directory for file-backed storage; in-memory when unset
//! - `BRUME_BADGE_POP_MS` - Duration of the badge emphasis animation (default: 300)
//! - `BRUME_SHOP_URL` - Link target of the empty-cart call to action (default: `/buy.html`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default storage key for the cart payload.
pub const DEFAULT_STORAGE_KEY: &str = "brume_cart";

/// Default badge emphasis duration in milliseconds.
pub const DEFAULT_BADGE_POP_MS: u64 = 300;

/// Default link target of the empty-cart call to action.
pub const DEFAULT_SHOP_URL: &str = "/buy.html";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Fixed key the cart is stored under
    pub storage_key: String,
    /// Directory for durable file-backed storage
    pub storage_dir: Option<PathBuf>,
    /// How long the badge keeps its emphasis class
    pub badge_pop: Duration,
    /// Link target of the empty-cart call to action
    pub shop_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
            badge_pop: Duration::from_millis(DEFAULT_BADGE_POP_MS),
            shop_url: DEFAULT_SHOP_URL.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
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
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage_key = get_env_or_default("BRUME_CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        validate_storage_key(&storage_key, "BRUME_CART_STORAGE_KEY")?;

        let badge_pop_ms = parse_millis(
            "BRUME_BADGE_POP_MS",
            &get_env_or_default("BRUME_BADGE_POP_MS", &DEFAULT_BADGE_POP_MS.to_string()),
        )?;

        Ok(Self {
            storage_key,
            storage_dir: get_optional_env("BRUME_STORAGE_DIR").map(PathBuf::from),
            badge_pop: Duration::from_millis(badge_pop_ms),
            shop_url: get_env_or_default("BRUME_SHOP_URL", DEFAULT_SHOP_URL),
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
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a millisecond duration.
fn parse_millis(var_name: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

/// Storage keys double as file names for file-backed storage.
fn validate_storage_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("'{key}' must be ASCII letters, digits, '_', '-' or '.'"),
        ))
    }
}
