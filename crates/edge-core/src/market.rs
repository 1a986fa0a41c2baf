//! Market snapshot input types
//!
//! A [`MarketSnapshot`] is the immutable input to one analysis request. It is
//! produced by an external collaborator (browser extension, API poller, test
//! fixture) and never mutated by the engine.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single outcome of a prediction market at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSnapshot {
    /// Outcome name, unique within the snapshot (case-insensitive)
    pub name: String,

    /// Market-implied probability on a 0-100 scale, if known
    #[serde(default)]
    pub probability: Option<f64>,

    /// Yes-share price as a 0-1 decimal, if known
    #[serde(default)]
    pub yes_price: Option<f64>,

    /// No-share price as a 0-1 decimal, if known
    #[serde(default)]
    pub no_price: Option<f64>,

    /// Outcome trading volume in USD, if known
    #[serde(default)]
    pub volume: Option<f64>,
}

impl OutcomeSnapshot {
    /// Create an outcome with only a name, all numeric fields unknown
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probability: None,
            yes_price: None,
            no_price: None,
            volume: None,
        }
    }

    /// Market probability on a 0-100 scale
    ///
    /// Falls back to `yes_price * 100` when the probability field is absent,
    /// and to 50 when neither is known.
    pub fn market_probability(&self) -> f64 {
        self.probability
            .or_else(|| self.yes_price.map(|p| p * 100.0))
            .unwrap_or(50.0)
    }
}

/// Immutable snapshot of a prediction market's outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Market title as displayed by the venue
    pub title: String,

    /// URL the snapshot was taken from, if any
    #[serde(default)]
    pub source_url: Option<String>,

    /// Total market volume in USD, if known
    #[serde(default)]
    pub total_volume: Option<f64>,

    /// Ordered list of outcomes
    pub outcomes: Vec<OutcomeSnapshot>,
}

impl MarketSnapshot {
    /// Validate the snapshot before any analysis work is started
    ///
    /// Rules:
    /// - title must be non-empty after trimming
    /// - at least one outcome
    /// - outcome names unique after trimming and lowercasing
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnapshot`] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidSnapshot("market title is empty".to_string()));
        }

        if self.outcomes.is_empty() {
            return Err(Error::InvalidSnapshot(
                "snapshot has no outcomes".to_string(),
            ));
        }

        let mut seen: Vec<String> = Vec::with_capacity(self.outcomes.len());
        for outcome in &self.outcomes {
            let normalized = outcome.name.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(Error::InvalidSnapshot(
                    "outcome with empty name".to_string(),
                ));
            }
            if seen.contains(&normalized) {
                return Err(Error::InvalidSnapshot(format!(
                    "duplicate outcome name: {}",
                    outcome.name
                )));
            }
            seen.push(normalized);
        }

        Ok(())
    }

    /// Names of all outcomes in snapshot order
    pub fn outcome_names(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(names: &[&str]) -> MarketSnapshot {
        MarketSnapshot {
            title: "Will X happen by Jan 1?".to_string(),
            source_url: None,
            total_volume: Some(125_000.0),
            outcomes: names.iter().copied().map(OutcomeSnapshot::named).collect(),
        }
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(snapshot(&["Yes", "No"]).validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut s = snapshot(&["Yes", "No"]);
        s.title = "   ".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_no_outcomes_rejected() {
        assert!(snapshot(&[]).validate().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected_case_insensitive() {
        assert!(snapshot(&["Yes", " YES "]).validate().is_err());
    }

    #[test]
    fn test_market_probability_fallbacks() {
        let mut o = OutcomeSnapshot::named("Yes");
        assert_eq!(o.market_probability(), 50.0);

        o.yes_price = Some(0.75);
        assert_eq!(o.market_probability(), 75.0);

        o.probability = Some(80.0);
        assert_eq!(o.market_probability(), 80.0);
    }

    #[test]
    fn test_deserialize_minimal_payload() {
        let raw = r#"{"title":"T","outcomes":[{"name":"Yes"}]}"#;
        let s: MarketSnapshot = serde_json::from_str(raw).expect("minimal payload parses");
        assert_eq!(s.outcomes.len(), 1);
        assert!(s.outcomes[0].probability.is_none());
    }
}
