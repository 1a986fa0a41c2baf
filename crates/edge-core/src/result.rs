//! Completed analysis results and per-outcome estimates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::findings::{FoundationalFindings, HistoricalFindings, SentimentFindings};
use crate::fingerprint::Fingerprint;

/// Trading recommendation for one outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

/// Delta threshold (in probability points) separating HOLD from BUY/SELL
pub const RECOMMENDATION_THRESHOLD: f64 = 5.0;

impl Recommendation {
    /// Map a model-vs-market delta to a recommendation
    ///
    /// Fixed policy: `delta > 5` buys, `delta < -5` sells, everything in
    /// between holds.
    pub fn from_delta(delta: f64) -> Self {
        if delta > RECOMMENDATION_THRESHOLD {
            Self::Buy
        } else if delta < -RECOMMENDATION_THRESHOLD {
            Self::Sell
        } else {
            Self::Hold
        }
    }
}

/// Model estimate for a single outcome
///
/// Produced only by the synthesizer; `outcome_name` always matches one
/// snapshot outcome case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEstimate {
    pub outcome_name: String,

    /// Model-estimated probability, 0-100
    pub model_probability: f64,

    /// Market-implied probability, 0-100
    pub market_probability: f64,

    /// `model_probability - market_probability`; positive means the market
    /// looks undervalued
    pub delta: f64,

    pub reasoning: String,
    pub recommendation: Recommendation,
}

/// Completed analysis for one market snapshot
///
/// Any of the three findings fields may be absent when its task failed; the
/// result is still valid and cacheable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub fingerprint: Fingerprint,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub market_title: String,

    #[serde(default)]
    pub foundational: Option<FoundationalFindings>,

    #[serde(default)]
    pub historical: Option<HistoricalFindings>,

    #[serde(default)]
    pub sentiment: Option<SentimentFindings>,

    #[serde(default)]
    pub outcome_estimates: Option<Vec<OutcomeEstimate>>,

    /// Wall-clock seconds the full analysis took
    pub total_elapsed_seconds: f64,
}

impl AnalysisResult {
    /// Whether the entry has outlived its TTL at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// How many of the three research tasks produced findings
    pub fn findings_count(&self) -> usize {
        usize::from(self.foundational.is_some())
            + usize::from(self.historical.is_some())
            + usize::from(self.sentiment.is_some())
    }
}
