//! edge-server binary: market analysis over HTTP
//!
//! Wires the research providers, cache and orchestrator together and serves
//! the SSE analysis API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use edge_engine::{EngineConfig, MemoryCache, Orchestrator};
use edge_research::{
    FoundationalProvider, HistoricalProvider, ResearchClient, ResearchClientConfig,
    ResearchProvider, SentimentProvider,
};

mod routes;

use routes::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "edge-server")]
#[command(about = "Prediction market analysis server", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "EDGE_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Result cache TTL in seconds
    #[arg(long, env = "EDGE_CACHE_TTL_SECS", default_value_t = 1800)]
    cache_ttl_secs: u64,

    /// Upper bound on one full analysis request, in seconds
    #[arg(long, env = "EDGE_REQUEST_TIMEOUT_SECS", default_value_t = 240)]
    request_timeout_secs: u64,

    /// Upper bound on a single research task, in seconds
    #[arg(long, env = "EDGE_TASK_TIMEOUT_SECS", default_value_t = 200)]
    task_timeout_secs: u64,

    /// API key for the research backend
    #[arg(long, env = "XAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the research backend
    #[arg(long, env = "XAI_API_BASE")]
    api_base: Option<String>,

    /// Model identifier for research completions
    #[arg(long, env = "XAI_MODEL")]
    model: Option<String>,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            task_timeout: Duration::from_secs(self.task_timeout_secs),
            ..EngineConfig::default()
        }
    }

    fn client_config(&self) -> ResearchClientConfig {
        let mut config = ResearchClientConfig::new(&self.api_key);
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    edge_utils::init_tracing();

    let args = Args::parse();
    let engine_config = args.engine_config();

    let client = Arc::new(
        ResearchClient::with_config(args.client_config())
            .context("failed to build research client")?,
    );
    let providers: Vec<Arc<dyn ResearchProvider>> = vec![
        Arc::new(FoundationalProvider::new(Arc::clone(&client))),
        Arc::new(HistoricalProvider::new(Arc::clone(&client))),
        Arc::new(SentimentProvider::new(client)),
    ];

    let cache = Arc::new(MemoryCache::new(engine_config.cache_ttl));
    let orchestrator = Arc::new(Orchestrator::new(providers, cache, engine_config));
    let app = router(AppState { orchestrator });

    info!(bind = %args.bind, "Starting edge-server");
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
