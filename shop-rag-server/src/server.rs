use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shop_rag::{IngestOutcome, QueryService, ServiceState};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(service: Arc<QueryService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/rag/search", post(search))
        .route("/rag/reindex", post(reindex))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve `service` on `addr` until Ctrl-C.
pub async fn run_server(addr: SocketAddr, service: Arc<QueryService>) -> anyhow::Result<()> {
    let app = app_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("shop-rag-server listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok"}))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let answer = state.service.ask(&request.query).await;
    info!(outcome = ?answer.outcome, "answered query");
    Json(QueryResponse { answer: answer.text })
}

async fn reindex(State(state): State<AppState>) -> (StatusCode, Json<ReindexResponse>) {
    match state.service.initialize().await {
        Ok(outcome) => {
            let chunks = match outcome {
                IngestOutcome::Ready { chunks, .. } | IngestOutcome::Restored { chunks } => chunks,
                IngestOutcome::NoDocuments => 0,
            };
            let status = match state.service.state().await {
                ServiceState::Ready => "ready",
                ServiceState::Uninitialized => "uninitialized",
            };
            (
                StatusCode::OK,
                Json(ReindexResponse {
                    status: status.to_string(),
                    chunks: Some(chunks),
                    message: None,
                }),
            )
        }
        Err(e) => {
            error!(error = %e, "manual reindex failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ReindexResponse {
                    status: "error".to_string(),
                    chunks: None,
                    message: Some(e.to_string()),
                }),
            )
        }
    }
}
