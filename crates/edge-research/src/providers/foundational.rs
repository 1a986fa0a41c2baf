//! Foundational-context research provider
//!
//! Asks the research model for the background a trader needs before looking
//! at prices: what the market is actually about, which factors drive
//! resolution, and any odds observed elsewhere for the same question.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use edge_core::{FoundationalFindings, MarketSnapshot, ResearchFindings};

use crate::client::{extract_json, ResearchClient};
use crate::events::{ProgressSink, ResearchTask};
use crate::prompt::market_context;
use crate::provider::ResearchProvider;
use crate::Result;

const SYSTEM_PROMPT: &str = "\
You are a prediction-market research analyst. Search your knowledge for the \
background of the given market and respond with a single JSON object of the \
shape:
{
  \"summary\": \"...\",
  \"key_factors\": [\"...\"],
  \"current_odds\": [{\"market_title\": \"...\", \"yes_probability\": 0.0}],
  \"citations\": [\"https://...\"]
}
Probabilities are on a 0-100 scale. Cite only sources you actually used.";

/// Foundational-context research provider
pub struct FoundationalProvider {
    client: Arc<ResearchClient>,
}

impl FoundationalProvider {
    pub fn new(client: Arc<ResearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResearchProvider for FoundationalProvider {
    fn task(&self) -> ResearchTask {
        ResearchTask::Foundational
    }

    async fn research(
        &self,
        snapshot: &MarketSnapshot,
        progress: &ProgressSink,
    ) -> Result<ResearchFindings> {
        progress.status("Gathering foundational context...");
        progress.tool_call("web_search");

        let user = format!(
            "{}\n\nProvide the foundational context for this market.",
            market_context(snapshot)
        );
        let output = self.client.complete(SYSTEM_PROMPT, &user).await?;
        if let Some(tokens) = output.reasoning_tokens {
            progress.thinking(tokens);
        }

        let value = extract_json(&output.content)?;
        let mut findings: FoundationalFindings = serde_json::from_value(value)?;
        findings.generated_at = Some(Utc::now());

        info!(
            factors = findings.key_factors.len(),
            citations = findings.citations.len(),
            "Foundational research complete"
        );
        progress.citations(findings.citations.clone());
        progress.log(format!(
            "Foundational context ready ({} key factors)",
            findings.key_factors.len()
        ));

        Ok(ResearchFindings::Foundational(findings))
    }
}
