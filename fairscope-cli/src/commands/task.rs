//! Task command handlers
//!
//! Resume polling of an already submitted task, or look at it once.

use anyhow::{Context, Result, anyhow};
use colored::*;
use fairscope_client::{ClientError, PollOutcome, TaskPoller};
use fairscope_core::domain::task::{TaskHandle, TaskState};
use fairscope_core::session::AnalysisSession;
use std::sync::Arc;

use crate::config::Config;
use crate::controller::{ConsoleObserver, ViewController, ViewOptions};
use crate::render;

/// Poll an existing task until it ends and show its result
pub async fn watch_task(config: &Config, status_url: &str, view: ViewOptions) -> Result<()> {
    let client = config.client()?;
    let poller = TaskPoller::new(Arc::new(client)).with_interval(config.poll_interval);
    let mut controller = ViewController::new();

    println!("{} Watching {}", "▸".cyan(), status_url.dimmed());
    let observer = ConsoleObserver::default();
    let session = poller.start(TaskHandle::new(status_url), observer.clone());
    let outcome = controller.follow(&poller, session, observer, None).await;

    if outcome == PollOutcome::Succeeded {
        controller.show(&view);
    }
    outcome_to_result(outcome)
}

/// Poll a task once
pub async fn task_status(config: &Config, status_url: &str) -> Result<()> {
    let client = config.client()?;
    let snapshot = client
        .poll_task(&TaskHandle::new(status_url))
        .await
        .map_err(|e| status_error(ClientError::from(e), status_url))?;

    render::print_snapshot(&snapshot);

    if snapshot.state == TaskState::Success {
        let result = snapshot
            .parse_result()
            .context("Task succeeded but its result is unusable")?;
        let mut controller = ViewController::new();
        controller.install(AnalysisSession::new(0, None, result));
        controller.show(&ViewOptions::default());
    } else if !snapshot.state.is_terminal() {
        println!(
            "{}",
            "Task still running; use `fairscope watch` to follow it.".dimmed()
        );
    }

    Ok(())
}

/// Explain a failed status request; an unknown task is usually an expired one
fn status_error(error: ClientError, status_url: &str) -> anyhow::Error {
    if error.is_not_found() {
        anyhow!("Task {} not found, it may have expired", status_url)
    } else if error.is_server_error() {
        anyhow::Error::new(error).context("Backend failed to report the task status")
    } else {
        anyhow::Error::new(error).context("Failed to fetch task status")
    }
}

/// Map a loop outcome to the command's exit status
pub fn outcome_to_result(outcome: PollOutcome) -> Result<()> {
    match outcome {
        PollOutcome::Succeeded => Ok(()),
        PollOutcome::Failed(_) => anyhow::bail!("Fairness task failed"),
        PollOutcome::Aborted(reason) => anyhow::bail!("Polling aborted: {}", reason),
        PollOutcome::Cancelled => anyhow::bail!("Polling cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairscope_client::PollError;

    fn rejected(status: u16) -> ClientError {
        ClientError::from(PollError::Rejected {
            status,
            message: "nope".to_string(),
        })
    }

    #[test]
    fn test_status_error_messages() {
        let err = status_error(rejected(404), "http://backend/task/7");
        assert_eq!(
            err.to_string(),
            "Task http://backend/task/7 not found, it may have expired"
        );

        let err = status_error(rejected(503), "http://backend/task/7");
        assert_eq!(err.to_string(), "Backend failed to report the task status");

        let err = status_error(rejected(400), "http://backend/task/7");
        assert_eq!(err.to_string(), "Failed to fetch task status");
        assert!(format!("{:#}", err).contains("status 400"));
    }

    #[test]
    fn test_outcome_to_result() {
        assert!(outcome_to_result(PollOutcome::Succeeded).is_ok());
        assert!(outcome_to_result(PollOutcome::Cancelled).is_err());

        let err = outcome_to_result(PollOutcome::Aborted("timeout".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "Polling aborted: timeout");
    }
}
