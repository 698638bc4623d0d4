//! Read-only HTTP façade over the search index.
//!
//! Three endpoints: ranked search with highlights, prefix autocomplete, and
//! cached-document display by logical URL. No mutation routes exist; index
//! production is strictly offline.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::search::{self, DocRecord, SearchEngine, SearchError, SearchResults};

type AppState = Arc<SearchEngine>;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// The search query string
    q: String,
    #[serde(default)]
    offset: usize,
    /// Maximum number of results (default: 20)
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    q: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct DocParams {
    url: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub num_docs: u64,
}

fn error_status(e: &SearchError) -> StatusCode {
    match e {
        SearchError::QueryParsing(_) => StatusCode::BAD_REQUEST,
        SearchError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn search_handler(
    State(engine): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, (StatusCode, String)> {
    let limit = params.limit.clamp(1, 200);
    search::search(&engine, &params.q, params.offset, limit)
        .map(Json)
        .map_err(|e| (error_status(&e), e.to_string()))
}

async fn suggest_handler(
    State(engine): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestResponse>, (StatusCode, String)> {
    let limit = params.limit.clamp(1, 50);
    search::suggest(&engine, &params.q, limit)
        .map(|suggestions| {
            Json(SuggestResponse {
                suggestions,
                query: params.q,
            })
        })
        .map_err(|e| (error_status(&e), e.to_string()))
}

async fn doc_handler(
    State(engine): State<AppState>,
    Query(params): Query<DocParams>,
) -> Result<Json<DocRecord>, (StatusCode, String)> {
    engine
        .doc_by_url(&params.url)
        .map(Json)
        .map_err(|e| (error_status(&e), e.to_string()))
}

async fn health_handler(State(engine): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        num_docs: engine.num_docs(),
    })
}

/// Build the router; separated from `serve` so tests can drive it directly.
#[must_use]
pub fn router(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/search", get(search_handler))
        .route("/suggest", get(suggest_handler))
        .route("/doc", get(doc_handler))
        .route("/healthz", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Bind and serve until the process is stopped.
pub async fn serve(engine: Arc<SearchEngine>, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind to {addr}: {e}"))?;
    info!(addr = %addr, "search façade listening");
    axum::serve(listener, router(engine)).await?;
    Ok(())
}
