//! `shop-rag-server` exposes the `shop-rag` query service over HTTP.
//! `POST /rag/search` answers questions and `GET /health` reports liveness.

pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::{AppState, QueryRequest, QueryResponse, ReindexResponse, app_router, run_server};
