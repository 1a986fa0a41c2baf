//! Prompt construction for the default research providers
//!
//! All three providers share a market-context block that lists the snapshot's
//! outcomes with their current prices and pins the model to exactly that
//! outcome set.

use edge_core::MarketSnapshot;

/// Render the shared market-context block for a snapshot
pub fn market_context(snapshot: &MarketSnapshot) -> String {
    let outcomes_text: Vec<String> = snapshot
        .outcomes
        .iter()
        .map(|o| {
            format!(
                "- {}: {}% (Yes ${}, No ${}, Vol ${})",
                o.name,
                fmt_opt(o.probability),
                fmt_opt(o.yes_price),
                fmt_opt(o.no_price),
                fmt_opt(o.volume),
            )
        })
        .collect();

    let valid_names = serde_json::to_string(&snapshot.outcome_names()).unwrap_or_default();

    let url_context = snapshot
        .source_url
        .as_deref()
        .map(|url| format!("\nMarket URL: {url}\n"))
        .unwrap_or_default();

    format!(
        "Market: {title}\n\
         Total Volume: ${volume}\n\
         {url_context}\n\
         CURRENT OUTCOMES (ONLY THESE ARE VALID):\n\
         {outcomes}\n\n\
         CRITICAL INSTRUCTION: Only analyze the outcomes listed above.\n\
         Do NOT reference any outcome that is not in this exact list: {valid_names}",
        title = snapshot.title,
        volume = fmt_opt(snapshot.total_volume),
        outcomes = outcomes_text.join("\n"),
    )
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v}"))
}
