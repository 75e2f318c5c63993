//! Task-related API endpoints

use fairscope_core::domain::task::{TaskHandle, TaskStatusSnapshot};
use fairscope_core::dto::task::TaskRequest;
use reqwest::header::HeaderMap;
use tracing::{debug, info};

use crate::FairnessClient;
use crate::error::{PollError, SubmissionError};

impl FairnessClient {
    // =============================================================================
    // Task Lifecycle
    // =============================================================================

    /// Submit a fairness task
    ///
    /// The request is sent as form data. The backend answers with the URL to
    /// poll in one of the configured status headers; relative URLs are
    /// resolved against the submission URL.
    ///
    /// # Example
    /// ```no_run
    /// # use fairscope_client::FairnessClient;
    /// # use fairscope_core::dto::task::TaskRequest;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = FairnessClient::new("http://localhost:5000");
    /// let request = TaskRequest::automatic("d1", 1, 0.65)?;
    /// let handle = client.submit_task(&request).await?;
    /// println!("polling {}", handle);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_task(&self, request: &TaskRequest) -> Result<TaskHandle, SubmissionError> {
        let url = self.url_for(&self.endpoints.submit);
        debug!("Submitting fairness task for dataset {} to {}", request.dataset_id(), url);

        let response = self
            .client
            .post(&url)
            .form(&request.form_fields())
            .send()
            .await
            .map_err(SubmissionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let location = self.status_location(response.headers())?;
        let status_url = response
            .url()
            .join(&location)
            .map_err(|e| SubmissionError::InvalidStatusUrl {
                url: location.clone(),
                reason: e.to_string(),
            })?;

        info!("Fairness task accepted, status URL: {}", status_url);
        Ok(TaskHandle::new(status_url.to_string()))
    }

    /// Fetch the current status of a task
    pub async fn poll_task(&self, handle: &TaskHandle) -> Result<TaskStatusSnapshot, PollError> {
        let url = self.url_for(handle.as_str());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(PollError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PollError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(PollError::Transport)?;
        let snapshot: TaskStatusSnapshot =
            serde_json::from_str(&body).map_err(|e| PollError::MalformedBody(e.to_string()))?;

        debug!("Polled {}: {}", url, snapshot.describe());
        Ok(snapshot)
    }

    /// First non-empty configured status header
    fn status_location(&self, headers: &HeaderMap) -> Result<String, SubmissionError> {
        self.endpoints
            .status_headers
            .iter()
            .filter_map(|name| headers.get(name.to_ascii_lowercase().as_str()))
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                SubmissionError::MissingStatusHeader(self.endpoints.status_headers.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_status_location_prefers_configured_order() {
        let client = FairnessClient::new("http://localhost:5000");
        let mut headers = HeaderMap::new();
        headers.insert("status", HeaderValue::from_static("/task/from-status"));
        headers.insert("location", HeaderValue::from_static("/task/from-location"));

        assert_eq!(
            client.status_location(&headers).unwrap(),
            "/task/from-location"
        );
    }

    #[test]
    fn test_status_location_falls_back() {
        let client = FairnessClient::new("http://localhost:5000");
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("   "));
        headers.insert("status", HeaderValue::from_static("/task/abc"));

        assert_eq!(client.status_location(&headers).unwrap(), "/task/abc");
    }

    #[test]
    fn test_missing_status_header() {
        let client = FairnessClient::new("http://localhost:5000");
        let err = client.status_location(&HeaderMap::new()).unwrap_err();

        assert!(matches!(err, SubmissionError::MissingStatusHeader(ref names) if names == "Location, status"));
    }
}
