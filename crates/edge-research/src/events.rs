//! Provider-side progress events
//!
//! Providers push zero or more [`ProviderEvent`]s through a [`ProgressSink`]
//! while a research call is in flight. The engine tags them with their task
//! source and relays them into the per-request event stream.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The three research tasks run per analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchTask {
    Foundational,
    Historical,
    Sentiment,
}

impl ResearchTask {
    /// Stable wire label used as the `source`/`task` field of events
    pub fn label(self) -> &'static str {
        match self {
            Self::Foundational => "foundational",
            Self::Historical => "historical",
            Self::Sentiment => "x_sentiment",
        }
    }

    /// All tasks, in launch order
    pub fn all() -> [Self; 3] {
        [Self::Foundational, Self::Historical, Self::Sentiment]
    }
}

impl std::fmt::Display for ResearchTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A progress event produced by a provider mid-flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Stage transition within the provider's own pipeline
    Status { message: String },

    /// Free-text progress line
    Log { message: String },

    /// The provider invoked an external tool (search, data API, ...)
    ToolCall { tool: String },

    /// Reasoning-token volume reported by the backing model
    Thinking { tokens: u64 },

    /// A batch of source URLs the provider consulted
    Citations { urls: Vec<String> },
}

/// Sending half of a provider's progress side channel
///
/// Send failures are deliberately swallowed: a closed channel means the
/// request was cancelled, and providers should not fail because nobody is
/// listening anymore.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProviderEvent>,
}

impl ProgressSink {
    /// Create a sink and the receiving half the runner drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProviderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn status(&self, message: impl Into<String>) {
        let _ = self.tx.send(ProviderEvent::Status {
            message: message.into(),
        });
    }

    pub fn log(&self, message: impl Into<String>) {
        let _ = self.tx.send(ProviderEvent::Log {
            message: message.into(),
        });
    }

    pub fn tool_call(&self, tool: impl Into<String>) {
        let _ = self.tx.send(ProviderEvent::ToolCall { tool: tool.into() });
    }

    pub fn thinking(&self, tokens: u64) {
        let _ = self.tx.send(ProviderEvent::Thinking { tokens });
    }

    pub fn citations(&self, urls: Vec<String>) {
        if !urls.is_empty() {
            let _ = self.tx.send(ProviderEvent::Citations { urls });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_labels() {
        assert_eq!(ResearchTask::Foundational.label(), "foundational");
        assert_eq!(ResearchTask::Historical.label(), "historical");
        assert_eq!(ResearchTask::Sentiment.label(), "x_sentiment");
    }

    #[tokio::test]
    async fn test_sink_forwards_events_in_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.status("starting");
        sink.log("working");
        sink.citations(vec!["https://example.com".to_string()]);

        assert_eq!(
            rx.recv().await,
            Some(ProviderEvent::Status {
                message: "starting".to_string()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(ProviderEvent::Log {
                message: "working".to_string()
            })
        );
        assert!(matches!(
            rx.recv().await,
            Some(ProviderEvent::Citations { .. })
        ));
    }

    #[tokio::test]
    async fn test_sink_drops_empty_citations() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.citations(Vec::new());
        sink.log("done");
        assert!(matches!(rx.recv().await, Some(ProviderEvent::Log { .. })));
    }

    #[test]
    fn test_sink_survives_closed_receiver() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.log("into the void");
    }
}
