//! Generic JSON response envelope used by every backend endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// The backend's uniform response shape:
/// `{ success, data?, message?, error?, errors? }`.
///
/// `errors` carries field-level validation messages keyed by field name
/// and is only present on validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

// `#[serde(default)]` on `data` would require `T: Default`; a free
// function keeps the bound at `DeserializeOwned`.
fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T>
where
    T: DeserializeOwned,
{
    /// Best human-readable failure description carried by the envelope.
    #[must_use]
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request failed".to_owned())
    }
}
