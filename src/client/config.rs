//! Configuration management for the Gowalla client

use std::time::Duration;

use compact_str::CompactString;

use super::error::{ClientError, Result};

/// Main configuration for the Gowalla client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL
    pub base_url: CompactString,
    /// Application API key, sent as `X-Gowalla-API-Key`
    pub api_key: CompactString,
    /// Optional HTTP Basic credentials for user-scoped endpoints
    pub credentials: Option<Credentials>,
    /// Polling configuration
    pub polling: PollingConfig,
    /// Request configuration
    pub request: RequestConfig,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: CompactString,
    pub password: CompactString,
}

/// Polling defaults applied when a subscription does not override them
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Default interval between ticks
    pub interval: Duration,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Page size for stamp listings; 20 is the server default
    pub stamps_limit: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(60) }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            stamps_limit: 20,
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_BASE_URL: &str = "https://api.gowalla.com";

    /// Create a new client configuration against the public API host
    pub fn new(api_key: impl Into<CompactString>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            credentials: None,
            polling: PollingConfig::default(),
            request: RequestConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config_validation(
                "base_url",
                "Base URL cannot be empty",
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config_validation(
                "base_url",
                "Base URL must start with http:// or https://",
            ));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ClientError::config_validation(
                "base_url",
                "Base URL is not a valid URL format",
            ));
        }

        if self.api_key.is_empty() {
            return Err(ClientError::config_validation(
                "api_key",
                "API key cannot be empty",
            ));
        }

        if let Some(credentials) = &self.credentials
            && credentials.username.is_empty()
        {
            return Err(ClientError::config_validation(
                "credentials",
                "Username cannot be empty when credentials are set",
            ));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation(
                "timeout",
                "Timeout must be greater than zero",
            ));
        }

        if self.polling.interval.is_zero() {
            return Err(ClientError::config_validation(
                "interval",
                "Polling interval must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Set the base URL, e.g. for a staging host or a test server
    pub fn with_base_url(mut self, base_url: impl Into<CompactString>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set HTTP Basic credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<CompactString>,
        password: impl Into<CompactString>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Set polling configuration
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Set request configuration
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ClientConfig::new("key").validate().is_ok());
    }

    #[test]
    fn rejects_empty_api_key() {
        assert!(ClientConfig::new("").validate().is_err());
    }

    #[test]
    fn rejects_bad_base_url() {
        let config = ClientConfig::new("key").with_base_url("api.gowalla.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = ClientConfig::new("key");
        config.request.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
