//! Task API seam used by the poller

use async_trait::async_trait;
use fairscope_core::domain::task::{TaskHandle, TaskStatusSnapshot};
use fairscope_core::dto::task::TaskRequest;

use crate::FairnessClient;
use crate::error::{PollError, SubmissionError};

/// The two backend calls a polling loop needs
///
/// Implemented by [`FairnessClient`]; tests drive the poller with scripted
/// implementations.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Submit a task and return the handle to poll
    async fn submit(&self, request: &TaskRequest) -> Result<TaskHandle, SubmissionError>;

    /// Fetch one status snapshot
    async fn poll_once(&self, handle: &TaskHandle) -> Result<TaskStatusSnapshot, PollError>;
}

#[async_trait]
impl TaskApi for FairnessClient {
    async fn submit(&self, request: &TaskRequest) -> Result<TaskHandle, SubmissionError> {
        self.submit_task(request).await
    }

    async fn poll_once(&self, handle: &TaskHandle) -> Result<TaskStatusSnapshot, PollError> {
        self.poll_task(handle).await
    }
}
