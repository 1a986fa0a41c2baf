//! Default chat-completions-backed research providers

pub mod foundational;
pub mod historical;
pub mod sentiment;

pub use foundational::FoundationalProvider;
pub use historical::HistoricalProvider;
pub use sentiment::SentimentProvider;
