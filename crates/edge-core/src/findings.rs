//! Structured findings returned by the three research tasks
//!
//! Each research provider returns one of these payloads. The engine treats
//! them as opaque data until synthesis, where the historical probability
//! estimate and the sentiment direction drive per-outcome estimates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Directional market sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
    Mixed,
}

impl Sentiment {
    /// Parse loosely: research models are inconsistent about casing and
    /// occasionally invent variants, which collapse to `Mixed`.
    pub fn from_str_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "bullish" => Self::Bullish,
            "bearish" => Self::Bearish,
            "neutral" => Self::Neutral,
            _ => Self::Mixed,
        }
    }

    /// Signed direction used for sentiment blending: bullish pushes estimates
    /// up, bearish down, everything else not at all
    pub fn direction(self) -> f64 {
        match self {
            Self::Bullish => 1.0,
            Self::Bearish => -1.0,
            Self::Neutral | Self::Mixed => 0.0,
        }
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_str_loose(&raw))
    }
}

/// Confidence level attached to findings and signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Parse loosely; unrecognized strings normalize to `Medium`
    pub fn from_str_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_str_loose(&raw))
    }
}

/// One directional signal from historical research
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub description: String,
    /// Signal strength on a 0-100 scale
    pub strength: f64,
    pub confidence: Confidence,
}

/// Odds for a related market surfaced by foundational research
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOdds {
    pub market_title: String,
    /// Probability of the yes side on a 0-100 scale
    pub yes_probability: f64,
}

/// Findings from the foundational-context research task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundationalFindings {
    /// Narrative summary of the market's context
    pub summary: String,

    /// Key factors likely to drive resolution
    #[serde(default)]
    pub key_factors: Vec<String>,

    /// Odds observed for this or closely related markets
    #[serde(default)]
    pub current_odds: Vec<MarketOdds>,

    /// Source URLs cited during the search
    #[serde(default)]
    pub citations: Vec<String>,

    /// When the findings were generated
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Findings from the historical reference-class research task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalFindings {
    /// Overall probability estimate for the market's primary outcome, 0-100
    pub probability_estimate: f64,

    /// Reasoning behind the probability estimate
    pub probability_reasoning: String,

    pub overall_sentiment: Sentiment,
    pub overall_confidence: Confidence,

    #[serde(default)]
    pub bullish_signals: Vec<Signal>,

    #[serde(default)]
    pub bearish_signals: Vec<Signal>,

    /// Free-text trading recommendation
    #[serde(default)]
    pub recommendation: String,
}

/// Findings from the public-figure sentiment research task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentFindings {
    pub overall_sentiment: Sentiment,

    /// Aggregate signal strength on a 0-100 scale
    pub signal_strength: f64,

    /// Count of posts judged to carry tradeable information
    #[serde(default)]
    pub alpha_count: u32,

    #[serde(default)]
    pub tweets_analyzed: u32,

    /// How many prominent figures were identified and queried
    #[serde(default)]
    pub figure_count: u32,

    /// Narrative summary of the sentiment read
    #[serde(default)]
    pub summary: String,
}

/// Terminal payload of one research task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResearchFindings {
    Foundational(FoundationalFindings),
    Historical(HistoricalFindings),
    Sentiment(SentimentFindings),
}

impl ResearchFindings {
    pub fn as_foundational(&self) -> Option<&FoundationalFindings> {
        match self {
            Self::Foundational(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_historical(&self) -> Option<&HistoricalFindings> {
        match self {
            Self::Historical(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_sentiment(&self) -> Option<&SentimentFindings> {
        match self {
            Self::Sentiment(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_loose_parsing() {
        assert_eq!(Sentiment::from_str_loose(" Bullish "), Sentiment::Bullish);
        assert_eq!(Sentiment::from_str_loose("BEARISH"), Sentiment::Bearish);
        assert_eq!(Sentiment::from_str_loose("sideways"), Sentiment::Mixed);
    }

    #[test]
    fn test_confidence_unknown_normalizes_to_medium() {
        assert_eq!(Confidence::from_str_loose("very high"), Confidence::Medium);
        assert_eq!(Confidence::from_str_loose("HIGH"), Confidence::High);
    }

    #[test]
    fn test_sentiment_direction() {
        assert_eq!(Sentiment::Bullish.direction(), 1.0);
        assert_eq!(Sentiment::Bearish.direction(), -1.0);
        assert_eq!(Sentiment::Neutral.direction(), 0.0);
        assert_eq!(Sentiment::Mixed.direction(), 0.0);
    }

    #[test]
    fn test_historical_findings_deserialize() {
        let raw = r#"{
            "probability_estimate": 15.0,
            "probability_reasoning": "base rates are low",
            "overall_sentiment": "Bearish",
            "overall_confidence": "HIGH",
            "bearish_signals": [
                {"description": "no precedent", "strength": 80.0, "confidence": "high"}
            ]
        }"#;
        let f: HistoricalFindings = serde_json::from_str(raw).expect("parses");
        assert_eq!(f.overall_sentiment, Sentiment::Bearish);
        assert_eq!(f.overall_confidence, Confidence::High);
        assert!(f.bullish_signals.is_empty());
        assert_eq!(f.bearish_signals.len(), 1);
    }
}
