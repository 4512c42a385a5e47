//! SDK configuration.
//!
//! [`SdkConfig`] is what the caller supplies when constructing a context.
//! [`ConfigBlob`] is what the backend hands back during `init`; the SDK only
//! logs and stores it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Default backend endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.example-crypto.com/v1";

/// Caller-supplied SDK configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    /// Backend endpoint every session is bound to
    pub api_endpoint: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self { api_endpoint: DEFAULT_API_ENDPOINT.to_string() }
    }
}

impl SdkConfig {
    /// Replace the backend endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }
}

/// Opaque configuration document returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigBlob(serde_json::Value);

impl ConfigBlob {
    /// Wrap an already-parsed JSON document.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Parse a JSON document as sent over the wire.
    ///
    /// # Errors
    ///
    /// - `BackendError::Protocol` if the text is not valid JSON
    pub fn from_json(text: &str) -> Result<Self, BackendError> {
        serde_json::from_str(text)
            .map(Self)
            .map_err(|e| BackendError::Protocol { reason: format!("invalid config JSON: {e}") })
    }

    /// `api_version` field, if present and a string.
    pub fn api_version(&self) -> Option<&str> {
        self.0.get("api_version").and_then(serde_json::Value::as_str)
    }

    /// String entries of the `features` array. Empty if absent.
    pub fn features(&self) -> Vec<&str> {
        self.0
            .get("features")
            .and_then(serde_json::Value::as_array)
            .map(|features| features.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Underlying JSON document.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl fmt::Display for ConfigBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
