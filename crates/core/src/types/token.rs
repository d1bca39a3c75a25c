//! Bearer credential pair issued by the backend.
//!
//! The backend authenticates requests with a short-lived access token and
//! renews it by exchanging a longer-lived refresh token. The two always
//! travel together: replacing one without the other would leave the
//! session half-rotated, so [`TokenPair`] is replaced as a unit.
//!
//! Token values are wrapped in [`SecretString`] so they never leak
//! through `Debug` output or tracing. Persisting them (the CLI keeps a
//! credentials file) requires an explicit conversion through
//! [`StoredTokenPair`], which makes the exposure visible at the call
//! site.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing a [`TokenPair`] from wire or stored data.
#[derive(Debug, Error)]
pub enum TokenPairError {
    /// The access token field was missing or empty.
    #[error("missing access token")]
    MissingAccessToken,

    /// The refresh token field was missing or empty.
    #[error("missing refresh token")]
    MissingRefreshToken,
}

/// An access/refresh token pair.
///
/// Implements `Debug` manually to redact both fields.
#[derive(Clone, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential attached to API requests.
    pub access_token: SecretString,
    /// Longer-lived credential exchanged for a new access token.
    pub refresh_token: SecretString,
}

impl TokenPair {
    /// Build a pair from raw token strings, rejecting empty values.
    ///
    /// The refresh endpoint's contract is that both tokens are returned
    /// together; a response missing either one is malformed.
    ///
    /// # Errors
    ///
    /// Returns `TokenPairError` if either token is empty.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self, TokenPairError> {
        let access_token: String = access_token.into();
        let refresh_token: String = refresh_token.into();

        if access_token.is_empty() {
            return Err(TokenPairError::MissingAccessToken);
        }
        if refresh_token.is_empty() {
            return Err(TokenPairError::MissingRefreshToken);
        }

        Ok(Self {
            access_token: SecretString::from(access_token),
            refresh_token: SecretString::from(refresh_token),
        })
    }

    /// Validate a deserialized pair (wire responses can carry empty
    /// strings, which `Deserialize` alone does not reject).
    ///
    /// # Errors
    ///
    /// Returns `TokenPairError` if either token is empty.
    pub fn validated(self) -> Result<Self, TokenPairError> {
        if self.access_token.expose_secret().is_empty() {
            return Err(TokenPairError::MissingAccessToken);
        }
        if self.refresh_token.expose_secret().is_empty() {
            return Err(TokenPairError::MissingRefreshToken);
        }
        Ok(self)
    }

    /// Convert to the plain serializable form for persistence.
    ///
    /// This is the single place where both secrets are exposed; callers
    /// own the responsibility of where the result is written.
    #[must_use]
    pub fn to_stored(&self) -> StoredTokenPair {
        StoredTokenPair {
            access_token: self.access_token.expose_secret().to_owned(),
            refresh_token: self.refresh_token.expose_secret().to_owned(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Plain-text form of a [`TokenPair`] for durable storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TryFrom<StoredTokenPair> for TokenPair {
    type Error = TokenPairError;

    fn try_from(stored: StoredTokenPair) -> Result<Self, Self::Error> {
        Self::new(stored.access_token, stored.refresh_token)
    }
}
