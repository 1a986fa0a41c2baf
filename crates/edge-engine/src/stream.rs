//! Ordered per-request event stream
//!
//! A single [`EventStream`] exists per analysis request and is the only place
//! sequence numbers are assigned: the orchestrator relay emits every event
//! through it, so the numbering needs no shared counter across tasks and is
//! strictly increasing in emission order.

use chrono::Utc;
use tokio::sync::mpsc;

use crate::events::{EventKind, ProgressEvent};

/// Receiving half handed to the consumer (the SSE adapter or a test)
pub type EventReceiver = mpsc::Receiver<ProgressEvent>;

/// Sequencing sender for one request's events
pub struct EventStream {
    tx: mpsc::Sender<ProgressEvent>,
    next_seq: u64,
}

impl EventStream {
    /// Create a stream and its consumer half
    pub fn channel(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, next_seq: 0 }, rx)
    }

    /// Emit one event, assigning the next sequence number
    ///
    /// Returns `false` when the consumer has gone away (client disconnect);
    /// the caller must treat that as cancellation of the whole request.
    pub async fn emit(&mut self, kind: EventKind) -> bool {
        let event = ProgressEvent {
            seq: self.next_seq,
            timestamp: Utc::now(),
            kind,
        };
        self.next_seq += 1;
        self.tx.send(event).await.is_ok()
    }

    /// Sequence number the next event will get
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}
