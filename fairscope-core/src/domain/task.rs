//! Task domain types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::result::{FairnessResult, ResultParseError};

/// State of a fairness task as reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Progress,
    Success,
    /// A revoked task never produces a result, so it ends the same way
    #[serde(alias = "REVOKED")]
    Failure,
    /// Any other backend state (`STARTED`, `RETRY`, ...); polling continues
    #[serde(other)]
    Other,
}

impl TaskState {
    /// Whether the polling loop stops after observing this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Progress => "PROGRESS",
            TaskState::Success => "SUCCESS",
            TaskState::Failure => "FAILURE",
            TaskState::Other => "OTHER",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer of the status endpoint
///
/// Superseded by the next poll; only the terminal snapshot carries a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusSnapshot {
    pub state: TaskState,
    pub status: String,
    /// JSON-encoded fairness result, present once the task succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
}

impl TaskStatusSnapshot {
    pub fn new(state: TaskState, status: impl Into<String>) -> Self {
        Self {
            state,
            status: status.into(),
            result: None,
        }
    }

    pub fn with_result(mut self, result: impl Into<JsonValue>) -> Self {
        self.result = Some(result.into());
        self
    }

    /// Human-readable progress line, e.g. `State=PROGRESS: Loading data ...`
    pub fn describe(&self) -> String {
        format!("State={}: {}", self.state, self.status)
    }

    /// Parse the result payload carried by a successful snapshot
    ///
    /// The payload is normally a string holding JSON; an already-decoded
    /// object is accepted as well.
    pub fn parse_result(&self) -> Result<FairnessResult, ResultParseError> {
        match &self.result {
            None | Some(JsonValue::Null) => Err(ResultParseError::MissingPayload),
            Some(JsonValue::String(payload)) => FairnessResult::from_json(payload),
            Some(value) => FairnessResult::from_value(value.clone()),
        }
    }
}

/// Status-check URL returned when a task is submitted
///
/// Opaque to everything but the poller that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(status_url: impl Into<String>) -> Self {
        Self(status_url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
