//! Error types for the Gowalla client

use std::time::Duration;

use compact_str::CompactString;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON from {endpoint}: {message}")]
    JsonParse {
        endpoint: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Gowalla API error: {message}")]
    Api { message: CompactString },

    #[error("Invalid configuration: {field}: {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Authentication failed")]
    Authentication,

    #[error("Request timed out")]
    Timeout,

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Rate limit exceeded")]
    RateLimit { retry_after: Option<Duration> },

    #[error("Poll interval must be positive, got {0:?}")]
    InvalidInterval(Duration),
}

impl ClientError {
    pub fn json_parse(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::JsonParse {
            endpoint: endpoint.into(),
            message: message.into(),
            source,
        }
    }

    pub fn api(message: impl Into<CompactString>) -> Self {
        Self::Api { message: message.into() }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn rate_limit(retry_after: Option<Duration>) -> Self {
        Self::RateLimit { retry_after }
    }

    /// Errors worth retrying on the next scheduled tick, as opposed to
    /// configuration mistakes that will fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Timeout | Self::RateLimit { .. } | Self::Api { .. }
        )
    }
}
