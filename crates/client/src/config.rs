//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLOOD_ORANGE_API_BASE_URL` - Base URL of the storefront backend
//!   (e.g., `https://api.bloodorange.example/api/v1`)
//!
//! ## Optional
//! - `BLOOD_ORANGE_HTTP_TIMEOUT_SECS` - Request timeout (default: 30)
//! - `BLOOD_ORANGE_USER_AGENT` - Outbound `User-Agent`
//!   (default: `BloodOrange/0.1`)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "BloodOrange/0.1";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the backend, stored without a trailing slash.
    pub api_base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Outbound `User-Agent` header.
    pub user_agent: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = validate_base_url(
            "BLOOD_ORANGE_API_BASE_URL",
            &get_required_env("BLOOD_ORANGE_API_BASE_URL")?,
        )?;

        let timeout_secs = get_env_or_default(
            "BLOOD_ORANGE_HTTP_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        );
        let timeout_secs = timeout_secs.parse::<u64>().map_err(|e| {
            ConfigError::InvalidEnvVar("BLOOD_ORANGE_HTTP_TIMEOUT_SECS".to_owned(), e.to_string())
        })?;

        let user_agent = get_env_or_default("BLOOD_ORANGE_USER_AGENT", DEFAULT_USER_AGENT);

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            user_agent,
        })
    }

    /// Build a configuration directly from a base URL, with defaults for
    /// everything else. Used by tests and embedders that do their own
    /// configuration plumbing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not valid http(s).
    pub fn new(api_base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: validate_base_url("api_base_url", api_base_url.as_ref())?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Validate an http(s) base URL and strip any trailing slash so path
/// joining stays uniform.
fn validate_base_url(name: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            name.to_owned(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            name.to_owned(),
            "URL must have a host".to_owned(),
        ));
    }

    Ok(value.trim_end_matches('/').to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url_strips_trailing_slash() {
        let url = validate_base_url("TEST", "https://api.example.com/api/v1/").unwrap();
        assert_eq!(url, "https://api.example.com/api/v1");
    }

    #[test]
    fn test_validate_base_url_rejects_garbage() {
        assert!(matches!(
            validate_base_url("TEST", "not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_validate_base_url_rejects_non_http_scheme() {
        let err = validate_base_url("TEST", "ftp://api.example.com").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
