//! Synthesizer: research findings → per-outcome trading estimates
//!
//! Pure function over the snapshot and whichever findings survived. Every
//! outcome in the snapshot gets exactly one estimate; missing findings
//! degrade the estimate toward the market price, never drop the outcome.

use tracing::debug;

use edge_core::{
    FoundationalFindings, HistoricalFindings, MarketSnapshot, OutcomeEstimate, Recommendation,
    SentimentFindings,
};

/// Maximum probability-point shift the sentiment bias can apply
const MAX_SENTIMENT_SHIFT: f64 = 10.0;

/// Model probabilities are clamped into this band; a research model claiming
/// certainty is noise, not signal
const PROBABILITY_FLOOR: f64 = 5.0;
const PROBABILITY_CEILING: f64 = 95.0;

/// Combine the three research outputs into per-outcome estimates
///
/// For each outcome: the market probability comes from the snapshot, the
/// model probability from foundational odds (exact-market match) or the
/// historical estimate, shifted by the sentiment bias. The shift is monotone:
/// stronger bullish sentiment never lowers a model probability, stronger
/// bearish never raises one. Fixed recommendation policy: `delta > 5` BUY,
/// `delta < -5` SELL, otherwise HOLD.
///
/// Output is sorted by `|delta|` descending (biggest mispricing first); the
/// sort is stable so ties keep snapshot order.
pub fn synthesize(
    snapshot: &MarketSnapshot,
    foundational: Option<&FoundationalFindings>,
    historical: Option<&HistoricalFindings>,
    sentiment: Option<&SentimentFindings>,
) -> Vec<OutcomeEstimate> {
    let outcome_count = snapshot.outcomes.len();
    let mut estimates: Vec<OutcomeEstimate> = snapshot
        .outcomes
        .iter()
        .enumerate()
        .map(|(idx, outcome)| {
            estimate_outcome(
                idx,
                outcome_count,
                &outcome.name,
                outcome.market_probability(),
                foundational,
                historical,
                sentiment,
            )
        })
        .collect();

    estimates.sort_by(|a, b| {
        b.delta
            .abs()
            .partial_cmp(&a.delta.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(estimates = estimates.len(), "Synthesis complete");
    estimates
}

fn estimate_outcome(
    idx: usize,
    outcome_count: usize,
    name: &str,
    market_probability: f64,
    foundational: Option<&FoundationalFindings>,
    historical: Option<&HistoricalFindings>,
    sentiment: Option<&SentimentFindings>,
) -> OutcomeEstimate {
    let mut reasons: Vec<String> = Vec::new();

    // Foundational odds for an exact market match beat the historical
    // estimate when present.
    let mut model = foundational.and_then(|f| {
        let matched = matching_odds(f, name);
        if matched.is_some() {
            reasons.push("Matched odds from foundational research".to_string());
        }
        matched
    });

    if model.is_none() {
        if let Some(historical) = historical {
            let p = historical.probability_estimate;
            model = match outcome_count {
                1 => {
                    reasons.push(format!(
                        "Historical estimate ({:?} sentiment): {}",
                        historical.overall_sentiment, historical.probability_reasoning
                    ));
                    Some(p)
                }
                2 => {
                    reasons.push(format!(
                        "Binary market estimate based on {:?} historical sentiment",
                        historical.overall_sentiment
                    ));
                    Some(if idx == 0 { p } else { 100.0 - p })
                }
                _ => {
                    // Multi-outcome markets get no per-outcome split from the
                    // overall estimate; start from the market and let the
                    // sentiment bias move it.
                    reasons.push(format!(
                        "Multi-outcome market, {:?} historical sentiment",
                        historical.overall_sentiment
                    ));
                    Some(market_probability)
                }
            };
        }
    }

    // Sentiment bias: a directional shift proportional to signal strength.
    let mut model = match model {
        Some(base) => {
            if let Some(sentiment) = sentiment {
                let shift = sentiment.overall_sentiment.direction()
                    * (sentiment.signal_strength / 100.0)
                    * MAX_SENTIMENT_SHIFT;
                if shift != 0.0 {
                    reasons.push(format!(
                        "{:?} expert sentiment shifted the estimate by {shift:+.1}",
                        sentiment.overall_sentiment
                    ));
                }
                (base + shift).clamp(PROBABILITY_FLOOR, PROBABILITY_CEILING)
            } else {
                base.clamp(PROBABILITY_FLOOR, PROBABILITY_CEILING)
            }
        }
        None => {
            reasons.push(if has_any(foundational, historical, sentiment) {
                "No outcome-specific data; using market price as estimate".to_string()
            } else {
                "Insufficient data; using market price as estimate".to_string()
            });
            market_probability
        }
    };

    model = round1(model);
    let delta = round1(model - market_probability);
    let recommendation = Recommendation::from_delta(delta);

    match recommendation {
        Recommendation::Buy => {
            reasons.push(format!("Undervalued by {delta}% - consider buying YES"));
        }
        Recommendation::Sell => {
            reasons.push(format!(
                "Overvalued by {}% - consider selling YES or buying NO",
                delta.abs()
            ));
        }
        Recommendation::Hold => reasons.push(format!("Fair value (delta: {delta}%)")),
    }

    OutcomeEstimate {
        outcome_name: name.to_string(),
        model_probability: model,
        market_probability: round1(market_probability),
        delta,
        reasoning: reasons.join(". "),
        recommendation,
    }
}

/// Look for foundational odds whose market title matches the outcome name
/// (substring match either way, case-insensitive)
fn matching_odds(foundational: &FoundationalFindings, outcome_name: &str) -> Option<f64> {
    let needle = outcome_name.trim().to_lowercase();
    foundational.current_odds.iter().find_map(|odds| {
        let title = odds.market_title.trim().to_lowercase();
        (title.contains(&needle) || needle.contains(&title)).then_some(odds.yes_probability)
    })
}

fn has_any(
    foundational: Option<&FoundationalFindings>,
    historical: Option<&HistoricalFindings>,
    sentiment: Option<&SentimentFindings>,
) -> bool {
    foundational.is_some() || historical.is_some() || sentiment.is_some()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
