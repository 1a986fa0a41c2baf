//! Core domain types for the edge-rs analysis engine
//!
//! This crate defines the shared vocabulary used throughout the workspace:
//!
//! - Market snapshots submitted by callers ([`MarketSnapshot`], [`OutcomeSnapshot`])
//! - Stable cache fingerprints derived from market identity ([`Fingerprint`])
//! - Structured research findings produced by the three research tasks
//! - Completed analysis results and per-outcome trading estimates
//!
//! Everything here is plain data: no I/O, no concurrency. The orchestration
//! engine lives in `edge-engine`.

pub mod error;
pub mod findings;
pub mod fingerprint;
pub mod market;
pub mod result;

pub use error::{Error, Result};
pub use findings::{
    Confidence, FoundationalFindings, HistoricalFindings, MarketOdds, ResearchFindings,
    Sentiment, SentimentFindings, Signal,
};
pub use fingerprint::{Fingerprint, fingerprint};
pub use market::{MarketSnapshot, OutcomeSnapshot};
pub use result::{AnalysisResult, OutcomeEstimate, Recommendation};
