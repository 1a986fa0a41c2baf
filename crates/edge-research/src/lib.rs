//! Research provider abstraction layer for edge-rs
//!
//! The engine treats the three research tasks (foundational context,
//! historical reference classes, public-figure sentiment) as black boxes
//! behind the [`ResearchProvider`] trait: they take a market snapshot, stream
//! progress through a [`ProgressSink`], and either return structured
//! [`ResearchFindings`](edge_core::ResearchFindings) or fail.
//!
//! This crate also ships the default chat-completions-backed implementations
//! ([`providers`]) and the shared HTTP client they use ([`ResearchClient`]).

pub mod client;
pub mod error;
pub mod events;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use client::{CompletionOutput, ResearchClient, ResearchClientConfig};
pub use error::{ResearchError, Result};
pub use events::{ProgressSink, ProviderEvent, ResearchTask};
pub use provider::ResearchProvider;
pub use providers::{FoundationalProvider, HistoricalProvider, SentimentProvider};
