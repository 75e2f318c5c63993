//! View controller
//!
//! Owns the analysis session shown to the user and follows polling loops to
//! their end. Progress is printed as it arrives; a successful result becomes
//! the new session only if it comes from a loop at least as recent as the
//! one that produced the current session.

use anyhow::Result;
use colored::*;
use fairscope_client::{LoopError, PollObserver, PollOutcome, PollSession, TaskApi, TaskPoller};
use fairscope_core::domain::result::{FairnessResult, Metric};
use fairscope_core::domain::task::TaskStatusSnapshot;
use fairscope_core::dto::task::TaskRequest;
use fairscope_core::session::AnalysisSession;
use fairscope_core::view::{RankingChart, SortOrder};
use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::render;

/// Which views to print once a result is in
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    /// Group shown in the selection chart and expanded in the table
    pub select: usize,
    /// Metric to rank groups by; no ranking chart when unset
    pub rank_by: Option<Metric>,
    pub order: SortOrder,
    pub top: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            select: 0,
            rank_by: None,
            order: SortOrder::Ascending,
            top: RankingChart::DEFAULT_TOP,
        }
    }
}

type Delivery = Arc<Mutex<Option<FairnessResult>>>;

/// Prints loop events and keeps the delivered result for the controller
#[derive(Clone, Default)]
pub struct ConsoleObserver {
    delivered: Delivery,
}

impl PollObserver for ConsoleObserver {
    fn on_update(&mut self, snapshot: &TaskStatusSnapshot) {
        render::print_snapshot(snapshot);
    }

    fn on_result(&mut self, result: FairnessResult) {
        *self.delivered.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }

    fn on_failure(&mut self, status: &str) {
        println!("{} {}", "✗ Task failed:".red().bold(), status);
    }

    fn on_error(&mut self, error: &LoopError) {
        println!("{} {}", "✗ Polling stopped:".red().bold(), error);
    }
}

impl ConsoleObserver {
    fn take(&self) -> Option<FairnessResult> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Holds the current analysis session
#[derive(Debug, Default)]
pub struct ViewController {
    session: Option<AnalysisSession>,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&AnalysisSession> {
        self.session.as_ref()
    }

    /// Replace the session unless `session` comes from an older loop
    pub fn install(&mut self, session: AnalysisSession) -> bool {
        if let Some(current) = &self.session {
            if current.generation() > session.generation() {
                debug!(
                    "Ignoring result of loop {}, loop {} is newer",
                    session.generation(),
                    current.generation()
                );
                return false;
            }
        }

        self.session = Some(session);
        true
    }

    /// Submit `request`, follow the loop, and install its result
    ///
    /// Ctrl-C while submitting or polling cancels with [`PollOutcome::Cancelled`].
    pub async fn evaluate<A>(
        &mut self,
        poller: &TaskPoller<A>,
        request: TaskRequest,
    ) -> Result<PollOutcome>
    where
        A: TaskApi + ?Sized + 'static,
    {
        self.evaluate_until(poller, request, pin!(interrupted())).await
    }

    async fn evaluate_until<A, I>(
        &mut self,
        poller: &TaskPoller<A>,
        request: TaskRequest,
        mut interrupt: Pin<&mut I>,
    ) -> Result<PollOutcome>
    where
        A: TaskApi + ?Sized + 'static,
        I: Future<Output = ()>,
    {
        let observer = ConsoleObserver::default();
        let session = tokio::select! {
            submitted = poller.submit_and_start(&request, observer.clone()) => submitted?,
            _ = interrupt.as_mut() => {
                warn!("Interrupted while submitting task for dataset {}", request.dataset_id());
                poller.cancel_active();
                return Ok(PollOutcome::Cancelled);
            }
        };
        println!(
            "{} Task submitted for dataset {}",
            "✓".green(),
            request.dataset_id().cyan()
        );

        Ok(self
            .follow_until(poller, session, observer, Some(request), interrupt)
            .await)
    }

    /// Follow an already started loop until it ends or the user interrupts
    pub async fn follow<A>(
        &mut self,
        poller: &TaskPoller<A>,
        session: PollSession,
        observer: ConsoleObserver,
        request: Option<TaskRequest>,
    ) -> PollOutcome
    where
        A: TaskApi + ?Sized + 'static,
    {
        self.follow_until(poller, session, observer, request, pin!(interrupted()))
            .await
    }

    async fn follow_until<A, I>(
        &mut self,
        poller: &TaskPoller<A>,
        session: PollSession,
        observer: ConsoleObserver,
        request: Option<TaskRequest>,
        mut interrupt: Pin<&mut I>,
    ) -> PollOutcome
    where
        A: TaskApi + ?Sized + 'static,
        I: Future<Output = ()>,
    {
        let generation = session.generation();
        let outcome = tokio::select! {
            outcome = session.join() => outcome,
            _ = interrupt.as_mut() => {
                warn!("Interrupted, cancelling polling loop {}", generation);
                poller.cancel_active();
                PollOutcome::Cancelled
            }
        };

        if outcome == PollOutcome::Succeeded {
            if let Some(result) = observer.take() {
                self.install(AnalysisSession::new(generation, request, result));
            }
        }

        outcome
    }

    /// Print every view of the current session
    pub fn show(&self, options: &ViewOptions) {
        let Some(session) = self.session() else {
            println!("{}", "No analysis available.".yellow());
            return;
        };

        render::print_session_header(session);
        render::print_radar(&session.radar());
        render::print_group_sizes(&session.group_sizes());
        render::print_selection(&session.selection(options.select));
        let pattern = session.result().subgroups.pattern(options.select);
        render::print_pattern(options.select, &pattern);
        render::print_table(&session.table(), options.select);

        if let Some(metric) = options.rank_by {
            let ranking = session.ranking(metric, options.order, options.top);
            render::print_ranking(&ranking);
            if let Some(leader) = ranking.group_at(0) {
                if leader != options.select {
                    let hint = format!(
                        "Group {} ranks first; pass --select {} to expand it.",
                        leader, leader
                    );
                    println!("{}", hint.dimmed());
                }
            }
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be watched
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fairscope_client::{PollError, SubmissionError};
    use fairscope_core::domain::task::{TaskHandle, TaskState};
    use std::time::Duration;

    const SAMPLE: &str = include_str!("../../fixtures/fairness_result.json");

    struct Immediate;

    #[async_trait]
    impl TaskApi for Immediate {
        async fn submit(&self, _request: &TaskRequest) -> Result<TaskHandle, SubmissionError> {
            Ok(TaskHandle::new("http://backend/task/1"))
        }

        async fn poll_once(&self, _handle: &TaskHandle) -> Result<TaskStatusSnapshot, PollError> {
            Ok(TaskStatusSnapshot::new(TaskState::Success, "done").with_result(SAMPLE))
        }
    }

    /// Submission never gets an answer
    #[derive(Default)]
    struct Stalled {
        polls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl TaskApi for Stalled {
        async fn submit(&self, _request: &TaskRequest) -> Result<TaskHandle, SubmissionError> {
            std::future::pending().await
        }

        async fn poll_once(&self, _handle: &TaskHandle) -> Result<TaskStatusSnapshot, PollError> {
            self.polls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(TaskStatusSnapshot::new(TaskState::Pending, "waiting"))
        }
    }

    fn session(generation: u64) -> AnalysisSession {
        let result = FairnessResult::from_json(SAMPLE).unwrap();
        AnalysisSession::new(generation, None, result)
    }

    #[test]
    fn test_install_keeps_newest_generation() {
        let mut controller = ViewController::new();
        assert!(controller.session().is_none());

        assert!(controller.install(session(2)));
        assert!(!controller.install(session(1)));
        assert_eq!(controller.session().unwrap().generation(), 2);

        assert!(controller.install(session(3)));
        assert_eq!(controller.session().unwrap().generation(), 3);
    }

    #[tokio::test]
    async fn test_evaluate_installs_session() {
        let poller = TaskPoller::new(Arc::new(Immediate)).with_interval(Duration::from_millis(10));
        let mut controller = ViewController::new();
        let request = TaskRequest::builder("d1").build().unwrap();

        let outcome = controller.evaluate(&poller, request).await.unwrap();

        assert_eq!(outcome, PollOutcome::Succeeded);
        let session = controller.session().unwrap();
        assert_eq!(session.request().unwrap().dataset_id(), "d1");
        assert_eq!(session.group_sizes().clusters, vec![3, 1, 2]);
        controller.show(&ViewOptions {
            rank_by: Some(Metric::ClusterAccuracy),
            ..ViewOptions::default()
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_submission_cancels() {
        let api = Arc::new(Stalled::default());
        let poller = TaskPoller::new(Arc::clone(&api));
        let mut controller = ViewController::new();
        let request = TaskRequest::builder("d1").build().unwrap();
        let before = poller.active_generation();

        let interrupt = pin!(tokio::time::sleep(Duration::from_secs(1)));
        let outcome = controller
            .evaluate_until(&poller, request, interrupt)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert!(controller.session().is_none());
        assert!(poller.active_generation() > before);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.polls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
