//! Historical reference-class research provider
//!
//! Anchors the market in comparable past events: identifies the right
//! reference class, weighs bullish against bearish signals, and produces the
//! overall probability estimate the synthesizer builds on.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use edge_core::{HistoricalFindings, MarketSnapshot, ResearchFindings};

use crate::client::{extract_json, ResearchClient};
use crate::events::{ProgressSink, ResearchTask};
use crate::prompt::market_context;
use crate::provider::ResearchProvider;
use crate::Result;

const SYSTEM_PROMPT: &str = "\
You are a superforecaster. Identify the correct class of historical events to \
compare this market against, distinguish possibility from probability, and \
respond with a single JSON object of the shape:
{
  \"probability_estimate\": 0.0,
  \"probability_reasoning\": \"...\",
  \"overall_sentiment\": \"bullish|bearish|neutral|mixed\",
  \"overall_confidence\": \"high|medium|low\",
  \"bullish_signals\": [{\"description\": \"...\", \"strength\": 0.0, \"confidence\": \"medium\"}],
  \"bearish_signals\": [{\"description\": \"...\", \"strength\": 0.0, \"confidence\": \"medium\"}],
  \"recommendation\": \"...\"
}
probability_estimate is for the market's primary outcome on a 0-100 scale.";

/// Historical reference-class research provider
pub struct HistoricalProvider {
    client: Arc<ResearchClient>,
}

impl HistoricalProvider {
    pub fn new(client: Arc<ResearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResearchProvider for HistoricalProvider {
    fn task(&self) -> ResearchTask {
        ResearchTask::Historical
    }

    async fn research(
        &self,
        snapshot: &MarketSnapshot,
        progress: &ProgressSink,
    ) -> Result<ResearchFindings> {
        progress.status("Starting historical research...");

        let user = format!(
            "{}\n\nResearch the historical reference classes for this market.",
            market_context(snapshot)
        );
        let output = self.client.complete(SYSTEM_PROMPT, &user).await?;
        if let Some(tokens) = output.reasoning_tokens {
            progress.thinking(tokens);
        }

        let value = extract_json(&output.content)?;
        let findings: HistoricalFindings = serde_json::from_value(value)?;

        info!(
            probability = findings.probability_estimate,
            sentiment = ?findings.overall_sentiment,
            "Historical research complete"
        );
        progress.log(format!(
            "Historical estimate: {:.1}% ({:?} sentiment, {} bullish / {} bearish signals)",
            findings.probability_estimate,
            findings.overall_sentiment,
            findings.bullish_signals.len(),
            findings.bearish_signals.len(),
        ));

        Ok(ResearchFindings::Historical(findings))
    }
}
