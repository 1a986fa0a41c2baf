//! Analysis orchestration engine for edge-rs
//!
//! This crate owns the lifecycle of one analysis request:
//!
//! 1. Compute the snapshot's [`Fingerprint`](edge_core::Fingerprint) and check
//!    the [result cache](cache); a hit replays the cached result and stops.
//! 2. On a miss, launch the three research [task runners](runner)
//!    concurrently and relay their progress into a single ordered
//!    [event stream](events).
//! 3. Wait for all three tasks to settle (a failure never cancels siblings),
//!    then [synthesize](synthesize) per-outcome trading estimates.
//! 4. Cache the completed result and terminate the stream.
//!
//! The [`Orchestrator`](orchestrator::Orchestrator) drives all of this; the
//! HTTP layer in `edge-server` is a thin adapter over it.

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod runner;
pub mod stream;
pub mod synthesize;

pub use cache::{CacheStore, InflightTable, MemoryCache};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use events::{EventKind, ProgressEvent};
pub use orchestrator::Orchestrator;
pub use runner::{QueueItem, TaskOutcome, TaskRunner, TaskState};
pub use stream::{EventReceiver, EventStream};
pub use synthesize::synthesize;
