//! Fairscope HTTP Client
//!
//! A type-safe client for the subgroup-fairness backend: dataset and
//! clustering metadata, task submission, status polling, and the
//! [`TaskPoller`] that drives a task from submission to its terminal state.
//!
//! # Example
//!
//! ```no_run
//! use fairscope_client::FairnessClient;
//! use fairscope_core::dto::task::TaskRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = FairnessClient::new("http://localhost:5000");
//!
//!     let request = TaskRequest::builder("d1").threshold(0.5).build()?;
//!     let handle = client.submit_task(&request).await?;
//!     let snapshot = client.poll_task(&handle).await?;
//!
//!     println!("{}", snapshot.describe());
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
mod metadata;
pub mod poller;
mod tasks;

// Re-export commonly used types
pub use api::TaskApi;
pub use error::{ClientError, LoopError, PollError, Result, SubmissionError};
pub use poller::{DEFAULT_POLL_INTERVAL, PollObserver, PollOutcome, PollSession, TaskPoller};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Paths and headers of the backend job API
///
/// Paths are relative to the client's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Task submission endpoint (form POST)
    pub submit: String,
    /// Dataset column metadata, queried with `?id=<dataset>`
    pub columns_info: String,
    /// Clustering algorithm catalog
    pub clustering_info: String,
    /// Response headers that may carry the status URL, tried in order
    pub status_headers: Vec<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            submit: "/task/fairness".to_string(),
            columns_info: "/dataset/columns".to_string(),
            clustering_info: "/clustering/info".to_string(),
            status_headers: vec!["Location".to_string(), "status".to_string()],
        }
    }
}

/// HTTP client for the fairness backend
///
/// Methods are organized into logical groups:
/// - Task lifecycle (submit, poll)
/// - Metadata (dataset columns, clustering catalog)
#[derive(Debug, Clone)]
pub struct FairnessClient {
    /// Base URL of the backend (e.g., "http://localhost:5000")
    base_url: String,
    /// Endpoint paths and status headers
    endpoints: Endpoints,
    /// HTTP client instance
    client: Client,
}

impl FairnessClient {
    /// Create a new client with the default endpoints
    ///
    /// # Example
    /// ```
    /// use fairscope_client::FairnessClient;
    ///
    /// let client = FairnessClient::new("http://localhost:5000");
    /// assert_eq!(client.base_url(), "http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, cookies
    /// for an authenticated session, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints: Endpoints::default(),
            client,
        }
    }

    /// Replace the endpoint configuration
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Absolute URL for a path or URL
    ///
    /// Absolute URLs pass through untouched; anything else is joined to the
    /// base URL.
    fn url_for(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url,
                path_or_url.trim_start_matches('/')
            )
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = FairnessClient::new("http://localhost:5000");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.endpoints(), &Endpoints::default());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = FairnessClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_url_for_joins_relative_paths() {
        let client = FairnessClient::new("http://localhost:5000/app/");
        assert_eq!(
            client.url_for("/task/fairness"),
            "http://localhost:5000/app/task/fairness"
        );
        assert_eq!(
            client.url_for("task/abc"),
            "http://localhost:5000/app/task/abc"
        );
        assert_eq!(
            client.url_for("https://other/task/abc"),
            "https://other/task/abc"
        );
    }

    #[test]
    fn test_custom_endpoints() {
        let endpoints = Endpoints {
            status_headers: vec!["status".to_string()],
            ..Endpoints::default()
        };
        let client =
            FairnessClient::with_client("http://localhost:5000", Client::new()).with_endpoints(endpoints);
        assert_eq!(client.endpoints().status_headers, vec!["status"]);
        assert_eq!(client.endpoints().submit, "/task/fairness");
    }
}
