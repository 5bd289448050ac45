//! Web UI: upload a PDF, get the mindmap and its markdown back.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /`              | upload form |
//! | `POST /mindmap`      | multipart `pdf` → two-tab result page |
//! | `POST /api/mindmap`  | multipart `pdf` → JSON |
//! | `POST /download`     | form field `markdown` → `mindmap.md` attachment |
//! | `GET /health`        | liveness and provider name |
//!
//! Requests are independent: nothing from one upload is stored or visible to
//! another.

pub mod handlers;
pub mod page;
pub mod upload;

use crate::convert::MindmapPipeline;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Default upload limit: 50 MB.
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MindmapPipeline>,
}

impl AppState {
    pub fn new(pipeline: MindmapPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the router with all endpoints.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/mindmap", post(handlers::mindmap_page))
        .route("/api/mindmap", post(handlers::mindmap_api))
        .route("/download", post(handlers::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let app = build_router(state, DEFAULT_BODY_LIMIT);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
