//! Analysis orchestrator: one request from snapshot to terminal event
//!
//! [`Orchestrator::analyze`] validates the snapshot, computes its
//! fingerprint and returns an event receiver; a spawned driver task does the
//! rest. The driver checks the result cache, de-duplicates against other
//! in-flight runs for the same fingerprint, launches the three research
//! runners, relays their progress into the ordered stream, synthesizes the
//! estimates and caches the completed result.
//!
//! A closed event receiver (the client went away) cancels the whole run and
//! writes nothing to the cache.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use edge_core::{
    fingerprint, AnalysisResult, Fingerprint, FoundationalFindings, HistoricalFindings,
    MarketSnapshot, ResearchFindings, SentimentFindings,
};
use edge_research::{ProviderEvent, ResearchProvider};

use crate::cache::{await_leader, CacheStore, Inflight, InflightGuard, InflightTable};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::EventKind;
use crate::runner::{QueueItem, TaskRunner, TaskState};
use crate::stream::{EventReceiver, EventStream};
use crate::synthesize::synthesize;

/// Drives analysis requests end to end
#[derive(Clone)]
pub struct Orchestrator {
    providers: Vec<Arc<dyn ResearchProvider>>,
    cache: Arc<dyn CacheStore>,
    inflight: Arc<InflightTable>,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(
        providers: Vec<Arc<dyn ResearchProvider>>,
        cache: Arc<dyn CacheStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            providers,
            cache,
            inflight: Arc::new(InflightTable::new()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start an analysis for `snapshot`
    ///
    /// Validation happens synchronously; a bad snapshot is an `Err` here and
    /// never produces a stream. On success the caller gets the snapshot's
    /// fingerprint and the receiving end of the event stream; dropping the
    /// receiver cancels the run.
    pub fn analyze(
        &self,
        snapshot: MarketSnapshot,
        force_refresh: bool,
    ) -> Result<(Fingerprint, EventReceiver)> {
        snapshot.validate()?;
        let fingerprint = fingerprint(&snapshot);
        let (stream, rx) = EventStream::channel(self.config.event_buffer);

        let driver = Driver {
            providers: self.providers.clone(),
            cache: Arc::clone(&self.cache),
            inflight: Arc::clone(&self.inflight),
            config: self.config.clone(),
        };
        let fp = fingerprint.clone();
        tokio::spawn(async move {
            driver.run(Arc::new(snapshot), fp, stream, force_refresh).await;
        });

        Ok((fingerprint, rx))
    }

    /// Fetch a completed result straight from the cache
    pub async fn cached_result(&self, fingerprint: &Fingerprint) -> Result<Option<AnalysisResult>> {
        self.cache.get(fingerprint).await
    }
}

struct Driver {
    providers: Vec<Arc<dyn ResearchProvider>>,
    cache: Arc<dyn CacheStore>,
    inflight: Arc<InflightTable>,
    config: EngineConfig,
}

/// Findings collected from settled tasks, one slot per task kind
#[derive(Default)]
struct Collected {
    foundational: Option<FoundationalFindings>,
    historical: Option<HistoricalFindings>,
    sentiment: Option<SentimentFindings>,
}

impl Collected {
    fn absorb(&mut self, findings: ResearchFindings) {
        match findings {
            ResearchFindings::Foundational(f) => self.foundational = Some(f),
            ResearchFindings::Historical(f) => self.historical = Some(f),
            ResearchFindings::Sentiment(f) => self.sentiment = Some(f),
        }
    }

    fn count(&self) -> usize {
        usize::from(self.foundational.is_some())
            + usize::from(self.historical.is_some())
            + usize::from(self.sentiment.is_some())
    }
}

impl Driver {
    async fn run(
        self,
        snapshot: Arc<MarketSnapshot>,
        fingerprint: Fingerprint,
        mut stream: EventStream,
        force_refresh: bool,
    ) {
        let started = Instant::now();

        if !force_refresh {
            match self.cache.get(&fingerprint).await {
                Ok(Some(result)) => {
                    info!(fingerprint = %fingerprint, "Serving cached analysis");
                    let _ = stream
                        .emit(EventKind::Cached {
                            fingerprint: fingerprint.clone(),
                        })
                        .await;
                    let _ = stream
                        .emit(EventKind::Result {
                            result: Box::new(result),
                            total_time_seconds: started.elapsed().as_secs_f64(),
                        })
                        .await;
                    let _ = stream.emit(EventKind::Done).await;
                    return;
                }
                Ok(None) => {}
                Err(err) => {
                    // An unreachable cache backend is an orchestration fault,
                    // not a miss; fail the request before launching any task.
                    warn!(fingerprint = %fingerprint, error = %err, "Cache backend failed");
                    let _ = stream
                        .emit(EventKind::Error {
                            source: None,
                            message: format!("cache backend error: {err}"),
                        })
                        .await;
                    return;
                }
            }
        }

        // De-duplicate against a run already in flight for this fingerprint.
        // A forced refresh always leads its own run.
        let guard = if force_refresh {
            None
        } else {
            match self.inflight.join(&fingerprint) {
                Inflight::Leader(guard) => Some(guard),
                Inflight::Follower(rx) => {
                    debug!(fingerprint = %fingerprint, "Following in-flight analysis");
                    if let Some(result) = await_leader(rx).await {
                        let _ = stream
                            .emit(EventKind::Cached {
                                fingerprint: fingerprint.clone(),
                            })
                            .await;
                        let _ = stream
                            .emit(EventKind::Result {
                                result: Box::new(result),
                                total_time_seconds: started.elapsed().as_secs_f64(),
                            })
                            .await;
                        let _ = stream.emit(EventKind::Done).await;
                        return;
                    }
                    // Leader vanished without publishing; run unguarded
                    None
                }
            }
        };

        self.run_analysis(snapshot, fingerprint, stream, guard, started)
            .await;
    }

    async fn run_analysis(
        &self,
        snapshot: Arc<MarketSnapshot>,
        fingerprint: Fingerprint,
        mut stream: EventStream,
        guard: Option<InflightGuard>,
        started: Instant,
    ) {
        info!(
            fingerprint = %fingerprint,
            title = %snapshot.title,
            tasks = self.providers.len(),
            "Starting analysis"
        );
        if !stream
            .emit(EventKind::Status {
                stage: "init".to_string(),
                message: format!("Starting analysis for '{}'", snapshot.title),
            })
            .await
        {
            return;
        }

        let (queue_tx, mut queue_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        for provider in &self.providers {
            let runner = TaskRunner::new(Arc::clone(provider), self.config.task_timeout);
            let snapshot = Arc::clone(&snapshot);
            let queue = queue_tx.clone();
            let cancel = cancel_rx.clone();
            tokio::spawn(async move {
                runner.run(snapshot, queue, cancel).await;
            });
        }
        drop(queue_tx);

        let deadline = tokio::time::Instant::now() + self.config.request_timeout;
        let mut pending = self.providers.len();
        let mut collected = Collected::default();

        while pending > 0 {
            let item = tokio::select! {
                item = queue_rx.recv() => item,
                () = tokio::time::sleep_until(deadline) => {
                    warn!(fingerprint = %fingerprint, "Analysis deadline exceeded");
                    let _ = cancel_tx.send(true);
                    let _ = stream
                        .emit(EventKind::Error {
                            source: None,
                            message: format!(
                                "analysis timed out after {}s",
                                self.config.request_timeout.as_secs()
                            ),
                        })
                        .await;
                    return;
                }
            };

            let Some(item) = item else {
                // Every sender is gone but not every task settled; a runner
                // panicked or was aborted out from under us.
                let _ = stream
                    .emit(EventKind::Error {
                        source: None,
                        message: "analysis aborted: a research task vanished".to_string(),
                    })
                    .await;
                return;
            };

            let delivered = match item {
                QueueItem::Progress { task, event } => {
                    stream.emit(progress_kind(task.label(), event)).await
                }
                QueueItem::Complete(outcome) => {
                    pending -= 1;
                    let mut delivered = true;
                    match outcome.state {
                        TaskState::Succeeded(findings) => collected.absorb(findings),
                        TaskState::Failed(message) => {
                            delivered = stream
                                .emit(EventKind::Error {
                                    source: Some(outcome.task.label().to_string()),
                                    message,
                                })
                                .await;
                        }
                        TaskState::Pending | TaskState::Running => {
                            debug!(task = %outcome.task, "Non-terminal completion state");
                        }
                    }
                    delivered
                        && stream
                            .emit(EventKind::TaskComplete {
                                task: outcome.task.label().to_string(),
                                elapsed_seconds: outcome.elapsed_seconds,
                            })
                            .await
                }
            };

            if !delivered {
                debug!(fingerprint = %fingerprint, "Client went away, cancelling analysis");
                let _ = cancel_tx.send(true);
                return;
            }
        }

        if !stream
            .emit(EventKind::Status {
                stage: "synthesis".to_string(),
                message: "Generating outcome estimates".to_string(),
            })
            .await
        {
            let _ = cancel_tx.send(true);
            return;
        }

        let estimates = synthesize(
            &snapshot,
            collected.foundational.as_ref(),
            collected.historical.as_ref(),
            collected.sentiment.as_ref(),
        );

        let now = chrono::Utc::now();
        let ttl = chrono::Duration::seconds(self.config.cache_ttl.as_secs() as i64);
        let total_elapsed_seconds = started.elapsed().as_secs_f64();
        let result = AnalysisResult {
            fingerprint: fingerprint.clone(),
            created_at: now,
            expires_at: now + ttl,
            market_title: snapshot.title.clone(),
            foundational: collected.foundational,
            historical: collected.historical,
            sentiment: collected.sentiment,
            outcome_estimates: Some(estimates),
            total_elapsed_seconds,
        };

        // Completed runs are cached regardless of how many tasks succeeded;
        // a write failure is fatal for the request.
        if let Err(err) = self.cache.put(fingerprint.clone(), result.clone()).await {
            warn!(fingerprint = %fingerprint, error = %err, "Cache backend failed");
            let _ = stream
                .emit(EventKind::Error {
                    source: None,
                    message: format!("cache backend error: {err}"),
                })
                .await;
            return;
        }

        if let Some(guard) = &guard {
            guard.publish(&result);
        }

        info!(
            fingerprint = %fingerprint,
            findings = result.findings_count(),
            total_elapsed_seconds,
            "Analysis complete"
        );
        let _ = stream
            .emit(EventKind::Result {
                result: Box::new(result),
                total_time_seconds: total_elapsed_seconds,
            })
            .await;
        let _ = stream.emit(EventKind::Done).await;
    }
}

/// Tag a provider event with its task source
fn progress_kind(source: &str, event: ProviderEvent) -> EventKind {
    let source = source.to_string();
    match event {
        ProviderEvent::Status { message } => EventKind::Status {
            stage: source,
            message,
        },
        ProviderEvent::Log { message } => EventKind::Log { source, message },
        ProviderEvent::ToolCall { tool } => EventKind::ToolCall { source, tool },
        ProviderEvent::Thinking { tokens } => EventKind::Thinking { source, tokens },
        ProviderEvent::Citations { urls } => EventKind::Citations { source, urls },
    }
}
