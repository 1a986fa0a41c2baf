//! Research provider trait definition

use async_trait::async_trait;

use edge_core::{MarketSnapshot, ResearchFindings};

use crate::events::{ProgressSink, ResearchTask};
use crate::Result;

/// Trait for research providers
///
/// Each implementation performs one of the three research tasks for a market
/// snapshot. Implementations must be cancel-safe: the engine may drop the
/// returned future at any time when a request is cancelled or times out.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Which research task this provider performs
    fn task(&self) -> ResearchTask;

    /// Run the research task for a snapshot
    ///
    /// Progress may be streamed through `progress` while the call is in
    /// flight. Errors are returned, never panicked; the engine converts them
    /// into a failed task state without touching sibling tasks.
    async fn research(
        &self,
        snapshot: &MarketSnapshot,
        progress: &ProgressSink,
    ) -> Result<ResearchFindings>;
}
