//! Configuration module
//!
//! Backend location, polling cadence and the HTTP settings shared by every
//! command.

use anyhow::{Context, Result};
use fairscope_client::{DEFAULT_POLL_INTERVAL, Endpoints, FairnessClient};
use reqwest::header::HeaderName;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL (e.g., "http://localhost:5000")
    pub base_url: String,

    /// Delay between two status polls
    pub poll_interval: Duration,

    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,

    /// Response headers that may carry the status URL, tried in order
    pub status_headers: Vec<String>,
}

impl Config {
    /// Creates a configuration with default intervals
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(30),
            status_headers: Endpoints::default().status_headers,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.status_headers.is_empty() {
            anyhow::bail!("at least one status header is required");
        }

        for name in &self.status_headers {
            HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes())
                .with_context(|| format!("invalid status header name `{}`", name))?;
        }

        Ok(())
    }

    /// Build the backend client for this configuration
    pub fn client(&self) -> Result<FairnessClient> {
        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let endpoints = Endpoints {
            status_headers: self.status_headers.clone(),
            ..Endpoints::default()
        };

        Ok(FairnessClient::with_client(&self.base_url, http).with_endpoints(endpoints))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.status_headers, vec!["Location", "status"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.base_url = "localhost:5000".to_string();
        assert!(config.validate().is_err());
        config.base_url = "https://fairness.example.org".to_string();
        assert!(config.validate().is_ok());

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_millis(250);

        config.status_headers = vec![];
        assert!(config.validate().is_err());

        config.status_headers = vec!["bad header".to_string()];
        assert!(config.validate().is_err());

        config.status_headers = vec!["X-Status-Url".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_uses_configured_headers() {
        let mut config = Config::new("http://localhost:5000/");
        config.status_headers = vec!["status".to_string()];

        let client = config.client().unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.endpoints().status_headers, vec!["status"]);
        assert_eq!(client.endpoints().submit, "/task/fairness");
    }
}
