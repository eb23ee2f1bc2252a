//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MYSHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `MYSHOP_BASE_URL` - Public URL for the shop
//!
//! ## Optional
//! - `MYSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `MYSHOP_PORT` - Listen port (default: 8000)
//! - `MYSHOP_CART_SESSION_KEY` - Session key holding the cart (default: cart)
//! - `MYSHOP_MEDIA_URL` - URL prefix for product images, not `/` (default: /media/)
//! - `MYSHOP_MEDIA_ROOT` - Directory served under the media URL (default: media)
//! - `MYSHOP_STATIC_ROOT` - Directory served under /static (default: crates/storefront/static)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use myshop_core::cart::DEFAULT_SESSION_KEY;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the shop
    pub base_url: String,
    /// Session key the cart is stored under
    pub cart_session_key: String,
    /// Product image settings
    pub media: MediaConfig,
    /// Directory served under `/static`
    pub static_root: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Where product images live and how they are linked.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// URL prefix, always with leading and trailing `/`
    pub url: String,
    /// Directory on disk
    pub root: PathBuf,
}

impl MediaConfig {
    /// Public URL for an image path stored on a product.
    #[must_use]
    pub fn image_url(&self, path: &str) -> String {
        format!("{}{}", self.url, path.trim_start_matches('/'))
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            url: "/media/".to_string(),
            root: PathBuf::from("media"),
        }
    }
}

impl StorefrontConfig {
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

        let database_url = get_database_url("MYSHOP_DATABASE_URL")?;
        let host = get_env_or_default("MYSHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MYSHOP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MYSHOP_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MYSHOP_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("MYSHOP_BASE_URL")?;
        let cart_session_key = validate_session_key(
            &get_env_or_default("MYSHOP_CART_SESSION_KEY", DEFAULT_SESSION_KEY),
            "MYSHOP_CART_SESSION_KEY",
        )?;

        let media_url = normalize_url_prefix(&get_env_or_default("MYSHOP_MEDIA_URL", "/media/"));
        if media_url == "/" {
            return Err(ConfigError::InvalidEnvVar(
                "MYSHOP_MEDIA_URL".to_string(),
                "must not be the site root".to_string(),
            ));
        }
        let media = MediaConfig {
            url: media_url,
            root: PathBuf::from(get_env_or_default("MYSHOP_MEDIA_ROOT", "media")),
        };
        let static_root =
            PathBuf::from(get_env_or_default("MYSHOP_STATIC_ROOT", "crates/storefront/static"));

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_sample_rate(
            "SENTRY_SAMPLE_RATE",
            &get_env_or_default("SENTRY_SAMPLE_RATE", "1.0"),
        )?;
        let sentry_traces_sample_rate = parse_sample_rate(
            "SENTRY_TRACES_SAMPLE_RATE",
            &get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0"),
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            cart_session_key,
            media,
            static_root,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Session keys must be non-blank; surrounding whitespace is dropped.
fn validate_session_key(value: &str, var_name: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Ensure a URL prefix starts and ends with `/`.
fn normalize_url_prefix(value: &str) -> String {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Parse a sample rate in [0, 1].
fn parse_sample_rate(var_name: &str, value: &str) -> Result<f32, ConfigError> {
    let rate = value
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            cart_session_key: "cart".to_string(),
            media: MediaConfig::default(),
            static_root: PathBuf::from("static"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = "https://shop.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_validate_session_key_empty() {
        let result = validate_session_key("   ", "TEST_KEY");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_validate_session_key_trims() {
        assert_eq!(validate_session_key(" basket ", "TEST_KEY").unwrap(), "basket");
    }

    #[test]
    fn test_normalize_url_prefix() {
        assert_eq!(normalize_url_prefix("media"), "/media/");
        assert_eq!(normalize_url_prefix("/media"), "/media/");
        assert_eq!(normalize_url_prefix("/media/"), "/media/");
        assert_eq!(normalize_url_prefix(""), "/");
    }

    #[test]
    fn test_parse_sample_rate() {
        assert_eq!(parse_sample_rate("RATE", "0.25").unwrap(), 0.25);
        assert!(parse_sample_rate("RATE", "1.5").is_err());
        assert!(parse_sample_rate("RATE", "-0.1").is_err());
        assert!(parse_sample_rate("RATE", "often").is_err());
    }

    #[test]
    fn test_media_image_url() {
        let media = MediaConfig::default();
        assert_eq!(
            media.image_url("products/2026/01/02/tea.png"),
            "/media/products/2026/01/02/tea.png"
        );
        assert_eq!(media.image_url("/tea.png"), "/media/tea.png");
    }
}
