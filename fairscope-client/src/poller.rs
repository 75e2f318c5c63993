//! Task poller
//!
//! Drives a fairness task from submission to a terminal state: polls the
//! status URL at a fixed interval, reports every snapshot, and hands the
//! parsed result (or the failure message) to an observer exactly once.
//!
//! Only one loop per poller is live at a time. Each loop gets a generation
//! number; starting a new loop or cancelling bumps the active generation, and
//! observer callbacks only fire while their loop's generation is still the
//! active one. Callbacks run under the generation lock, so once `cancel()`
//! returns no callback of the cancelled loop can fire.

use fairscope_core::domain::result::FairnessResult;
use fairscope_core::domain::task::{TaskHandle, TaskState, TaskStatusSnapshot};
use fairscope_core::dto::task::TaskRequest;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::TaskApi;
use crate::error::{LoopError, PollError, SubmissionError};

/// Delay between two status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Receives the events of one polling loop
///
/// Callbacks are invoked while the poller's generation lock is held and must
/// not call back into the poller.
pub trait PollObserver: Send + 'static {
    /// Called after every successful poll
    fn on_update(&mut self, snapshot: &TaskStatusSnapshot);

    /// Called once when the task succeeded and its result was parsed
    fn on_result(&mut self, result: FairnessResult);

    /// Called once when the task failed, with the backend's status message
    fn on_failure(&mut self, status: &str);

    /// Called once when the loop gives up on a poll or result error
    fn on_error(&mut self, error: &LoopError) {
        let _ = error;
    }
}

/// How a polling loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The result was delivered
    Succeeded,
    /// The backend reported failure with this status message
    Failed(String),
    /// A poll or the result payload failed; no retry was attempted
    Aborted(String),
    /// The loop was cancelled or superseded by a newer loop
    Cancelled,
}

#[derive(Debug, Default)]
struct Generations {
    active: u64,
    token: Option<CancellationToken>,
}

fn lock(state: &Mutex<Generations>) -> MutexGuard<'_, Generations> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ties one loop to the generation it was started with
#[derive(Debug, Clone)]
struct Gate {
    generation: u64,
    state: Arc<Mutex<Generations>>,
    token: CancellationToken,
}

impl Gate {
    /// Run `callback` only if this loop is still the active one
    fn fire(&self, callback: impl FnOnce()) -> bool {
        let state = lock(&self.state);
        if state.active != self.generation || self.token.is_cancelled() {
            return false;
        }
        callback();
        true
    }

    fn cancel(&self) {
        let mut state = lock(&self.state);
        if state.active == self.generation {
            state.active += 1;
            state.token = None;
        }
        self.token.cancel();
    }
}

/// A polling loop running on the tokio runtime
#[derive(Debug)]
pub struct PollSession {
    gate: Gate,
    join: JoinHandle<PollOutcome>,
}

impl PollSession {
    pub fn generation(&self) -> u64 {
        self.gate.generation
    }

    /// Stop the loop; no callback fires after this returns
    pub fn cancel(&self) {
        debug!("Cancelling polling loop {}", self.gate.generation);
        self.gate.cancel();
    }

    /// Wait for the loop to end
    pub async fn join(self) -> PollOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Polling task panicked: {}", e);
                PollOutcome::Aborted(e.to_string())
            }
        }
    }
}

/// Submits fairness tasks and polls them to completion
pub struct TaskPoller<A: ?Sized> {
    api: Arc<A>,
    interval: Duration,
    state: Arc<Mutex<Generations>>,
}

impl<A: ?Sized> Clone for TaskPoller<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            interval: self.interval,
            state: Arc::clone(&self.state),
        }
    }
}

impl<A> TaskPoller<A>
where
    A: TaskApi + ?Sized + 'static,
{
    /// Creates a poller using [`DEFAULT_POLL_INTERVAL`]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            interval: DEFAULT_POLL_INTERVAL,
            state: Arc::new(Mutex::new(Generations::default())),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Generation of the most recently started loop (0 before any)
    pub fn active_generation(&self) -> u64 {
        lock(&self.state).active
    }

    /// Submit a task; a failure here means there is nothing to poll
    pub async fn submit(&self, request: &TaskRequest) -> Result<TaskHandle, SubmissionError> {
        self.api.submit(request).await
    }

    /// Issue a single status request
    pub async fn poll_once(&self, handle: &TaskHandle) -> Result<TaskStatusSnapshot, PollError> {
        self.api.poll_once(handle).await
    }

    /// Invalidate whichever loop is currently active
    pub fn cancel_active(&self) {
        let mut state = lock(&self.state);
        state.active += 1;
        if let Some(token) = state.token.take() {
            token.cancel();
        }
    }

    /// Submit a task and start polling it
    ///
    /// The previous loop is invalidated before the submission goes out, so a
    /// late result from it can no longer reach the observer of either loop.
    pub async fn submit_and_start<O: PollObserver>(
        &self,
        request: &TaskRequest,
        observer: O,
    ) -> Result<PollSession, SubmissionError> {
        self.cancel_active();
        let handle = self.submit(request).await?;
        Ok(self.start(handle, observer))
    }

    /// Spawn a polling loop for `handle`, superseding any active loop
    pub fn start<O: PollObserver>(&self, handle: TaskHandle, observer: O) -> PollSession {
        let gate = self.begin();
        info!(
            "Starting polling loop {} for {} (interval: {:?})",
            gate.generation, handle, self.interval
        );

        let api = Arc::clone(&self.api);
        let interval = self.interval;
        let loop_gate = gate.clone();
        let join = tokio::spawn(async move {
            poll_loop(api, handle, interval, loop_gate, observer).await
        });

        PollSession { gate, join }
    }

    /// Poll `handle` in the current task until a terminal state
    ///
    /// Supersedes any active loop; a later `start`, `run` or `cancel_active`
    /// stops this one.
    pub async fn run<O: PollObserver>(&self, handle: TaskHandle, observer: O) -> PollOutcome {
        let gate = self.begin();
        info!("Polling {} in loop {}", handle, gate.generation);
        poll_loop(Arc::clone(&self.api), handle, self.interval, gate, observer).await
    }

    fn begin(&self) -> Gate {
        let token = CancellationToken::new();
        let mut state = lock(&self.state);
        state.active += 1;
        if let Some(previous) = state.token.replace(token.clone()) {
            previous.cancel();
        }

        Gate {
            generation: state.active,
            state: Arc::clone(&self.state),
            token,
        }
    }
}

async fn poll_loop<A, O>(
    api: Arc<A>,
    handle: TaskHandle,
    interval: Duration,
    gate: Gate,
    mut observer: O,
) -> PollOutcome
where
    A: TaskApi + ?Sized,
    O: PollObserver,
{
    loop {
        let polled = tokio::select! {
            biased;
            _ = gate.token.cancelled() => return PollOutcome::Cancelled,
            polled = api.poll_once(&handle) => polled,
        };

        let snapshot = match polled {
            Ok(snapshot) => snapshot,
            Err(e) => return abort(&gate, &mut observer, LoopError::from(e)),
        };

        if !gate.fire(|| observer.on_update(&snapshot)) {
            return PollOutcome::Cancelled;
        }

        match snapshot.state {
            TaskState::Success => {
                return match snapshot.parse_result() {
                    Ok(result) => {
                        if gate.fire(|| observer.on_result(result)) {
                            info!("Task {} succeeded", handle);
                            PollOutcome::Succeeded
                        } else {
                            PollOutcome::Cancelled
                        }
                    }
                    Err(e) => abort(&gate, &mut observer, LoopError::from(e)),
                };
            }
            TaskState::Failure => {
                warn!("Task {} failed: {}", handle, snapshot.status);
                return if gate.fire(|| observer.on_failure(&snapshot.status)) {
                    PollOutcome::Failed(snapshot.status)
                } else {
                    PollOutcome::Cancelled
                };
            }
            TaskState::Pending | TaskState::Progress | TaskState::Other => {
                debug!("Task {} not finished, next poll in {:?}", handle, interval);
            }
        }

        tokio::select! {
            biased;
            _ = gate.token.cancelled() => return PollOutcome::Cancelled,
            _ = time::sleep(interval) => {}
        }
    }
}

fn abort<O: PollObserver>(gate: &Gate, observer: &mut O, error: LoopError) -> PollOutcome {
    warn!("Polling loop {} aborted: {}", gate.generation, error);
    let message = error.to_string();
    if gate.fire(|| observer.on_error(&error)) {
        PollOutcome::Aborted(message)
    } else {
        PollOutcome::Cancelled
    }
}
