//! Typed progress events for one analysis request
//!
//! Every event carries a sequence number assigned by the
//! [`EventStream`](crate::stream::EventStream) at emission time, strictly
//! increasing within one request. The wire payload shapes mirror the SSE
//! frames the server sends.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use edge_core::{AnalysisResult, Fingerprint};

/// Event payload, one variant per wire event type
#[derive(Debug, Clone)]
pub enum EventKind {
    /// Orchestrator stage transition
    Status { stage: String, message: String },

    /// Free-text progress line from a research task
    Log { source: String, message: String },

    /// A research task invoked an external tool
    ToolCall { source: String, tool: String },

    /// Reasoning-token volume reported by a research task
    Thinking { source: String, tokens: u64 },

    /// Source URLs a research task consulted
    Citations { source: String, urls: Vec<String> },

    /// One research task reached a terminal state
    TaskComplete { task: String, elapsed_seconds: f64 },

    /// The request was served from the result cache
    Cached { fingerprint: Fingerprint },

    /// The completed analysis
    Result {
        result: Box<AnalysisResult>,
        total_time_seconds: f64,
    },

    /// Terminal marker; nothing follows
    Done,

    /// A task-scoped failure (`source` set) or a fatal orchestration fault
    /// (`source` empty, terminal)
    Error {
        source: Option<String>,
        message: String,
    },
}

impl EventKind {
    /// Wire event type, used as the SSE `event:` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Log { .. } => "log",
            Self::ToolCall { .. } => "tool_call",
            Self::Thinking { .. } => "thinking",
            Self::Citations { .. } => "citations",
            Self::TaskComplete { .. } => "task_complete",
            Self::Cached { .. } => "cached",
            Self::Result { .. } => "result",
            Self::Done => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Wire payload, used as the SSE `data:` field
    pub fn data(&self) -> Value {
        match self {
            Self::Status { stage, message } => json!({ "stage": stage, "message": message }),
            Self::Log { source, message } => json!({ "source": source, "message": message }),
            Self::ToolCall { source, tool } => json!({ "source": source, "tool": tool }),
            Self::Thinking { source, tokens } => json!({ "source": source, "tokens": tokens }),
            Self::Citations { source, urls } => json!({ "source": source, "urls": urls }),
            Self::TaskComplete {
                task,
                elapsed_seconds,
            } => json!({ "task": task, "elapsed_seconds": elapsed_seconds }),
            Self::Cached { fingerprint } => json!({ "fingerprint": fingerprint }),
            Self::Result {
                result,
                total_time_seconds,
            } => {
                let mut value = serde_json::to_value(result).unwrap_or_else(|_| json!({}));
                if let Some(map) = value.as_object_mut() {
                    map.insert("total_time_seconds".to_string(), json!(total_time_seconds));
                }
                value
            }
            Self::Done => json!({}),
            Self::Error { source, message } => match source {
                Some(source) => json!({ "source": source, "message": message }),
                None => json!({ "message": message }),
            },
        }
    }

    /// Whether this event terminates the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { source: None, .. })
    }
}

/// One sequenced, timestamped event in a request's stream
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Monotonic per-request sequence number, assigned at emission
    pub seq: u64,

    pub timestamp: DateTime<Utc>,

    pub kind: EventKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_match_wire_types() {
        assert_eq!(
            EventKind::Status {
                stage: "init".to_string(),
                message: String::new()
            }
            .name(),
            "status"
        );
        assert_eq!(
            EventKind::TaskComplete {
                task: "historical".to_string(),
                elapsed_seconds: 1.0
            }
            .name(),
            "task_complete"
        );
        assert_eq!(EventKind::Done.name(), "done");
    }

    #[test]
    fn test_error_payload_omits_absent_source() {
        let fatal = EventKind::Error {
            source: None,
            message: "boom".to_string(),
        };
        assert!(fatal.data().get("source").is_none());
        assert!(fatal.is_terminal());

        let scoped = EventKind::Error {
            source: Some("historical".to_string()),
            message: "boom".to_string(),
        };
        assert_eq!(scoped.data()["source"], "historical");
        assert!(!scoped.is_terminal());
    }

    #[test]
    fn test_task_complete_payload_shape() {
        let kind = EventKind::TaskComplete {
            task: "foundational".to_string(),
            elapsed_seconds: 12.5,
        };
        let data = kind.data();
        assert_eq!(data["task"], "foundational");
        assert_eq!(data["elapsed_seconds"], 12.5);
    }
}
