//! Public-figure sentiment research provider
//!
//! Two-stage pipeline: first identify the prominent figures whose public
//! statements actually move this market, then read their recent output for
//! directional sentiment and tradeable signals.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use edge_core::{MarketSnapshot, ResearchFindings, Sentiment, SentimentFindings};

use crate::client::{extract_json, ResearchClient};
use crate::events::{ProgressSink, ResearchTask};
use crate::prompt::market_context;
use crate::provider::ResearchProvider;
use crate::Result;

const FIGURES_SYSTEM_PROMPT: &str = "\
You identify domain experts and decision-makers for prediction markets. \
Respond with a single JSON object of the shape:
{
  \"prominent_figures\": [{\"name\": \"...\", \"handle\": \"...\", \"relevance\": \"...\"}]
}
List at most 10 figures whose public statements are likely to move this market.";

const SENTIMENT_SYSTEM_PROMPT: &str = "\
You analyze the recent public statements of named figures for prediction-market \
signal. Respond with a single JSON object of the shape:
{
  \"overall_sentiment\": \"bullish|bearish|neutral|mixed\",
  \"signal_strength\": 0.0,
  \"alpha_count\": 0,
  \"tweets_analyzed\": 0,
  \"summary\": \"...\"
}
signal_strength is on a 0-100 scale; alpha_count is the number of statements \
carrying tradeable information.";

#[derive(Debug, Deserialize)]
struct FiguresResponse {
    #[serde(default)]
    prominent_figures: Vec<Figure>,
}

#[derive(Debug, Deserialize)]
struct Figure {
    name: String,
    #[serde(default)]
    handle: Option<String>,
}

/// Public-figure sentiment research provider
pub struct SentimentProvider {
    client: Arc<ResearchClient>,
}

impl SentimentProvider {
    pub fn new(client: Arc<ResearchClient>) -> Self {
        Self { client }
    }

    fn neutral_findings(figure_count: u32, summary: impl Into<String>) -> SentimentFindings {
        SentimentFindings {
            overall_sentiment: Sentiment::Neutral,
            signal_strength: 0.0,
            alpha_count: 0,
            tweets_analyzed: 0,
            figure_count,
            summary: summary.into(),
        }
    }
}

#[async_trait]
impl ResearchProvider for SentimentProvider {
    fn task(&self) -> ResearchTask {
        ResearchTask::Sentiment
    }

    async fn research(
        &self,
        snapshot: &MarketSnapshot,
        progress: &ProgressSink,
    ) -> Result<ResearchFindings> {
        // Stage 1: figure identification
        progress.status("Identifying prominent figures...");
        let context = market_context(snapshot);
        let figures_user = format!("{context}\n\nIdentify the prominent figures for this market.");
        let output = self
            .client
            .complete(FIGURES_SYSTEM_PROMPT, &figures_user)
            .await?;
        if let Some(tokens) = output.reasoning_tokens {
            progress.thinking(tokens);
        }

        let figures: FiguresResponse = serde_json::from_value(extract_json(&output.content)?)?;
        let figure_count = figures.prominent_figures.len() as u32;
        progress.status(format!("Identified {figure_count} experts"));

        if figures.prominent_figures.is_empty() {
            info!("No prominent figures identified, skipping sentiment analysis");
            return Ok(ResearchFindings::Sentiment(Self::neutral_findings(
                0,
                "No prominent figures identified for this market",
            )));
        }

        // Stage 2: sentiment read over the identified figures
        progress.status(format!(
            "Analyzing recent statements from {figure_count} experts..."
        ));
        progress.tool_call("x_search");

        let roster: Vec<String> = figures
            .prominent_figures
            .iter()
            .map(|f| match &f.handle {
                Some(handle) => format!("- {} ({handle})", f.name),
                None => format!("- {}", f.name),
            })
            .collect();
        let sentiment_user = format!(
            "{context}\n\nFigures to analyze:\n{}\n\nAnalyze their recent public statements.",
            roster.join("\n")
        );

        let output = self
            .client
            .complete(SENTIMENT_SYSTEM_PROMPT, &sentiment_user)
            .await?;
        if let Some(tokens) = output.reasoning_tokens {
            progress.thinking(tokens);
        }

        let mut findings: SentimentFindings =
            serde_json::from_value(extract_json(&output.content)?)?;
        findings.figure_count = figure_count;

        info!(
            sentiment = ?findings.overall_sentiment,
            strength = findings.signal_strength,
            alpha = findings.alpha_count,
            "Sentiment research complete"
        );
        progress.log(format!(
            "Sentiment: {:?} ({} alpha signals from {} statements)",
            findings.overall_sentiment, findings.alpha_count, findings.tweets_analyzed
        ));

        Ok(ResearchFindings::Sentiment(findings))
    }
}
