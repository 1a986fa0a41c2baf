//! Task runner: one research provider call with isolated failure handling
//!
//! The runner is the engine's failure boundary around a provider. Whatever
//! the provider does (errors, timeouts, malformed output), the runner's only
//! outputs are queue items: zero or more progress items followed by exactly
//! one completion item carrying the terminal [`TaskState`]. Nothing a
//! provider does can abort a sibling task or the orchestrator.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use edge_core::{MarketSnapshot, ResearchFindings};
use edge_research::{ProgressSink, ProviderEvent, ResearchProvider, ResearchTask};

/// Lifecycle of one research task within one request
///
/// Exactly one terminal transition happens per task: `Pending → Running →
/// {Succeeded | Failed}`.
#[derive(Debug, Clone)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded(ResearchFindings),
    Failed(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

/// Terminal record of one task
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: ResearchTask,
    pub state: TaskState,
    pub elapsed_seconds: f64,
}

/// Item pushed into the orchestrator's shared queue
#[derive(Debug)]
pub enum QueueItem {
    /// Mid-flight progress from a task
    Progress {
        task: ResearchTask,
        event: ProviderEvent,
    },

    /// The task settled; sent exactly once per task
    Complete(TaskOutcome),
}

/// Runs one provider call to a terminal state
pub struct TaskRunner {
    provider: Arc<dyn ResearchProvider>,
    timeout: Duration,
}

impl TaskRunner {
    pub fn new(provider: Arc<dyn ResearchProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Drive the provider call, forwarding progress into `queue`
    ///
    /// Returns when the task settles or `cancel` flips; a cancelled task
    /// sends no completion item (the request is over, nobody is collecting).
    pub async fn run(
        &self,
        snapshot: Arc<MarketSnapshot>,
        queue: mpsc::UnboundedSender<QueueItem>,
        mut cancel: watch::Receiver<bool>,
    ) {
        let task = self.provider.task();
        let started = Instant::now();
        let deadline = started + self.timeout;
        debug!(task = %task, "Task runner starting");

        let (sink, mut progress_rx) = ProgressSink::channel();
        let research = self.provider.research(&snapshot, &sink);
        tokio::pin!(research);

        let state = loop {
            tokio::select! {
                outcome = &mut research => {
                    break match outcome {
                        Ok(findings) => TaskState::Succeeded(findings),
                        Err(err) => {
                            warn!(task = %task, error = %err, "Research task failed");
                            TaskState::Failed(err.to_string())
                        }
                    };
                }
                maybe_event = progress_rx.recv() => {
                    if let Some(event) = maybe_event {
                        let _ = queue.send(QueueItem::Progress { task, event });
                    }
                }
                () = tokio::time::sleep_until(deadline.into()) => {
                    warn!(task = %task, timeout_secs = self.timeout.as_secs(), "Research task timed out");
                    break TaskState::Failed(format!(
                        "timed out after {}s",
                        self.timeout.as_secs()
                    ));
                }
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        debug!(task = %task, "Task runner cancelled");
                        return;
                    }
                }
            }
        };

        // The provider settled; flush any progress it emitted right before
        // finishing so per-task causal order is preserved. The sink sends
        // synchronously, so everything it sent is already buffered.
        while let Ok(event) = progress_rx.try_recv() {
            let _ = queue.send(QueueItem::Progress { task, event });
        }

        let elapsed_seconds = started.elapsed().as_secs_f64();
        debug!(task = %task, elapsed_seconds, "Task runner settled");
        let _ = queue.send(QueueItem::Complete(TaskOutcome {
            task,
            state,
            elapsed_seconds,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edge_core::{OutcomeSnapshot, Sentiment, SentimentFindings};
    use edge_research::ResearchError;

    fn snapshot() -> Arc<MarketSnapshot> {
        Arc::new(MarketSnapshot {
            title: "T".to_string(),
            source_url: None,
            total_volume: None,
            outcomes: vec![OutcomeSnapshot::named("Yes")],
        })
    }

    fn findings() -> ResearchFindings {
        ResearchFindings::Sentiment(SentimentFindings {
            overall_sentiment: Sentiment::Neutral,
            signal_strength: 0.0,
            alpha_count: 0,
            tweets_analyzed: 0,
            figure_count: 0,
            summary: String::new(),
        })
    }

    struct ChattyProvider;

    #[async_trait]
    impl ResearchProvider for ChattyProvider {
        fn task(&self) -> ResearchTask {
            ResearchTask::Sentiment
        }

        async fn research(
            &self,
            _snapshot: &MarketSnapshot,
            progress: &ProgressSink,
        ) -> edge_research::Result<ResearchFindings> {
            progress.log("step one");
            progress.log("step two");
            Ok(findings())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ResearchProvider for FailingProvider {
        fn task(&self) -> ResearchTask {
            ResearchTask::Historical
        }

        async fn research(
            &self,
            _snapshot: &MarketSnapshot,
            _progress: &ProgressSink,
        ) -> edge_research::Result<ResearchFindings> {
            Err(ResearchError::RequestFailed("503".to_string()))
        }
    }

    struct StuckProvider;

    #[async_trait]
    impl ResearchProvider for StuckProvider {
        fn task(&self) -> ResearchTask {
            ResearchTask::Foundational
        }

        async fn research(
            &self,
            _snapshot: &MarketSnapshot,
            _progress: &ProgressSink,
        ) -> edge_research::Result<ResearchFindings> {
            std::future::pending().await
        }
    }

    async fn collect(mut rx: mpsc::UnboundedReceiver<QueueItem>) -> Vec<QueueItem> {
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_progress_precedes_single_completion() {
        let runner = TaskRunner::new(Arc::new(ChattyProvider), Duration::from_secs(5));
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        runner.run(snapshot(), queue_tx, cancel_rx).await;
        let items = collect(queue_rx).await;

        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], QueueItem::Progress { .. }));
        assert!(matches!(items[1], QueueItem::Progress { .. }));
        match &items[2] {
            QueueItem::Complete(outcome) => {
                assert!(matches!(outcome.state, TaskState::Succeeded(_)));
                assert_eq!(outcome.task, ResearchTask::Sentiment);
            }
            QueueItem::Progress { .. } => panic!("expected completion last"),
        }
    }

    #[tokio::test]
    async fn test_provider_error_becomes_failed_state() {
        let runner = TaskRunner::new(Arc::new(FailingProvider), Duration::from_secs(5));
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        runner.run(snapshot(), queue_tx, cancel_rx).await;
        let items = collect(queue_rx).await;

        assert_eq!(items.len(), 1);
        match &items[0] {
            QueueItem::Complete(outcome) => match &outcome.state {
                TaskState::Failed(msg) => assert!(msg.contains("503")),
                other => panic!("expected failure, got {other:?}"),
            },
            QueueItem::Progress { .. } => panic!("expected completion"),
        }
    }

    #[tokio::test]
    async fn test_stuck_provider_times_out() {
        let runner = TaskRunner::new(Arc::new(StuckProvider), Duration::from_millis(50));
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        runner.run(snapshot(), queue_tx, cancel_rx).await;
        let items = collect(queue_rx).await;

        assert_eq!(items.len(), 1);
        match &items[0] {
            QueueItem::Complete(outcome) => {
                assert!(matches!(outcome.state, TaskState::Failed(_)));
            }
            QueueItem::Progress { .. } => panic!("expected completion"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_suppresses_completion() {
        let runner = TaskRunner::new(Arc::new(StuckProvider), Duration::from_secs(60));
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            runner.run(snapshot(), queue_tx, cancel_rx).await;
        });
        cancel_tx.send(true).expect("cancel");
        handle.await.expect("join");

        assert!(collect(queue_rx).await.is_empty());
    }
}
