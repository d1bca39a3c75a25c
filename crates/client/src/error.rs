//! Error types for the API client.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::credentials::CredentialStoreError;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (timeout, DNS, connection refused). Not
    /// retried at this layer; retry policy belongs to the caller.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON the endpoint promised.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// 401 that does not match the expired-access-token signature, or a
    /// request that was already replayed once. Never refreshed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403: authenticated but not allowed. Never refreshed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-level validation failure, keyed by field name.
    #[error("Validation failed: {}", format_validation_errors(.0))]
    Validation(BTreeMap<String, Vec<String>>),

    /// Token refresh failed; the session is no longer authenticated.
    /// All requests queued behind the refresh receive this same error.
    #[error("Session expired: {0}")]
    SessionExpired(#[from] RefreshError),

    /// The credential store could not be read or written.
    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialStoreError),

    /// Any other failure envelope from the backend.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Errors during the token-refresh exchange.
///
/// Cloneable because one refresh outcome fans out to every request
/// queued behind it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token is available; fail closed without a network call.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// Network-level failure during the refresh call. The rendered
    /// message is kept because the underlying error is not cloneable.
    #[error("refresh request failed: {0}")]
    Http(String),

    /// The backend rejected the refresh token.
    #[error("refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The refresh response was missing a token or was not JSON.
    #[error("malformed refresh response: {0}")]
    MalformedResponse(String),

    /// The refreshed pair could not be written to the credential store.
    #[error("failed to store refreshed credentials: {0}")]
    CredentialStore(String),
}

fn format_validation_errors(errors: &BTreeMap<String, Vec<String>>) -> String {
    if errors.is_empty() {
        return "(no field details provided)".to_owned();
    }

    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
