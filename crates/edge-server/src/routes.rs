//! HTTP routes: analysis SSE stream, cached-result lookup, health probe

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use edge_core::{Fingerprint, MarketSnapshot};
use edge_engine::{Orchestrator, ProgressEvent};

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Body of `POST /analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub snapshot: MarketSnapshot,

    /// Skip the result cache and re-run the research tasks
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/analyze/:fingerprint", get(cached_result))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}

/// POST /analyze - run (or replay) an analysis as an SSE stream
async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let (fingerprint, rx) = match state
        .orchestrator
        .analyze(request.snapshot, request.force_refresh)
    {
        Ok(started) => started,
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };
    info!(fingerprint = %fingerprint, force_refresh = request.force_refresh, "Analysis stream opened");

    let stream = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(sse_frame(&event)));
    let sse = Sse::new(stream).keep_alive(KeepAlive::default());

    ([("x-cache-key", fingerprint.as_str().to_string())], sse).into_response()
}

/// GET /analyze/{fingerprint} - cached result lookup
async fn cached_result(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Response {
    let fingerprint = Fingerprint::from_raw(fingerprint);
    match state.orchestrator.cached_result(&fingerprint).await {
        Ok(Some(result)) => Json(result).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("no cached analysis for {fingerprint}"),
        ),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Render one engine event as an SSE frame
fn sse_frame(event: &ProgressEvent) -> Event {
    Event::default()
        .id(event.seq.to_string())
        .event(event.kind.name())
        .data(event.kind.data().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use edge_core::{ResearchFindings, Sentiment, SentimentFindings};
    use edge_engine::{EngineConfig, MemoryCache};
    use edge_research::{ProgressSink, ResearchProvider, ResearchTask};
    use tower::ServiceExt;

    struct InstantProvider(ResearchTask);

    #[async_trait]
    impl ResearchProvider for InstantProvider {
        fn task(&self) -> ResearchTask {
            self.0
        }

        async fn research(
            &self,
            _snapshot: &MarketSnapshot,
            _progress: &ProgressSink,
        ) -> edge_research::Result<ResearchFindings> {
            Ok(ResearchFindings::Sentiment(SentimentFindings {
                overall_sentiment: Sentiment::Neutral,
                signal_strength: 0.0,
                alpha_count: 0,
                tweets_analyzed: 0,
                figure_count: 0,
                summary: String::new(),
            }))
        }
    }

    fn test_router() -> Router {
        let providers: Vec<Arc<dyn ResearchProvider>> = ResearchTask::all()
            .into_iter()
            .map(|task| Arc::new(InstantProvider(task)) as Arc<dyn ResearchProvider>)
            .collect();
        let cache = Arc::new(MemoryCache::new(std::time::Duration::from_secs(60)));
        let orchestrator = Arc::new(Orchestrator::new(
            providers,
            cache,
            EngineConfig::default(),
        ));
        router(AppState { orchestrator })
    }

    fn snapshot_body() -> serde_json::Value {
        json!({
            "title": "Team A wins the final",
            "outcomes": [
                { "name": "Yes", "yes_price": 0.75 },
                { "name": "No", "yes_price": 0.25 }
            ]
        })
    }

    fn post_analyze(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024).await.expect("body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(value["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_streams_events_with_cache_key() {
        let response = test_router()
            .oneshot(post_analyze(&snapshot_body()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let cache_key = response
            .headers()
            .get("x-cache-key")
            .and_then(|v| v.to_str().ok())
            .expect("cache key header")
            .to_string();
        assert_eq!(cache_key.len(), 16);

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .expect("content type");
        assert!(content_type.starts_with("text/event-stream"));

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("event: status"));
        assert!(text.contains("event: result"));
        assert!(text.contains("event: done"));
    }

    #[tokio::test]
    async fn test_invalid_snapshot_is_422() {
        let body = json!({ "title": "  ", "outcomes": [{ "name": "Yes" }] });
        let response = test_router()
            .oneshot(post_analyze(&body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_fingerprint_is_404() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/analyze/deadbeefdeadbeef")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_completed_analysis_is_fetchable() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(post_analyze(&snapshot_body()))
            .await
            .expect("response");
        let cache_key = response
            .headers()
            .get("x-cache-key")
            .and_then(|v| v.to_str().ok())
            .expect("cache key header")
            .to_string();
        // Drain the stream so the analysis runs to completion
        to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/analyze/{cache_key}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(value["fingerprint"], cache_key.as_str());
        assert!(value["outcome_estimates"].is_array());
    }
}
