//! HTTP request handlers for the web UI and the JSON endpoint.

use super::page;
use super::upload::{parse_multipart, UploadError};
use super::AppState;
use crate::error::{MindmapError, Severity, Warning};
use crate::output::{MindmapOutput, MindmapStats, OutlineStats, DOWNLOAD_FILE_NAME, DOWNLOAD_MEDIA_TYPE};
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// HTTP status for a failed run.
pub fn status_for(err: &MindmapError) -> StatusCode {
    match err {
        MindmapError::UnsupportedUpload { .. }
        | MindmapError::InvalidInput { .. }
        | MindmapError::FileNotFound { .. }
        | MindmapError::PermissionDenied { .. } => StatusCode::BAD_REQUEST,
        MindmapError::MalformedDocument { .. } | MindmapError::ExtractionEmpty { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        MindmapError::ServiceError { .. }
        | MindmapError::EmptyGeneration { .. }
        | MindmapError::DownloadFailed { .. }
        | MindmapError::DownloadTimeout { .. } => StatusCode::BAD_GATEWAY,
        MindmapError::ConfigurationMissing { .. }
        | MindmapError::InvalidConfig(_)
        | MindmapError::PdfiumBindingFailed(_)
        | MindmapError::OutputWriteFailed { .. }
        | MindmapError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Upload form.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render_index(&state.pipeline.config().effective_model()))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.pipeline.provider().to_string(),
    })
}

/// `POST /mindmap`: upload → result page.
pub async fn mindmap_page(State(state): State<AppState>, multipart: Multipart) -> Response {
    let document = match parse_multipart(multipart).await {
        Ok(doc) => doc,
        Err(UploadError::Rejected(e)) => return error_page(&e),
        Err(e @ UploadError::BadForm(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Html(page::render_message(Severity::Error, &e.to_string())),
            )
                .into_response()
        }
    };

    let name = document.name.clone();
    match state.pipeline.run(document).await {
        Ok(output) => {
            info!("Served mindmap for '{}'", name);
            Html(page::render_result(&name, &output)).into_response()
        }
        Err(e) => error_page(&e),
    }
}

/// `POST /api/mindmap`: upload → JSON.
pub async fn mindmap_api(State(state): State<AppState>, multipart: Multipart) -> Response {
    let document = match parse_multipart(multipart).await {
        Ok(doc) => doc,
        Err(UploadError::Rejected(e)) => return error_json(&e),
        Err(e @ UploadError::BadForm(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "bad_form",
                    severity: Severity::Error,
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    };

    match state.pipeline.run(document).await {
        Ok(output) => Json(MindmapResponse::from(output)).into_response(),
        Err(e) => error_json(&e),
    }
}

/// Form body of `POST /download`.
#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    pub markdown: String,
}

/// `POST /download`: the outline as an attachment named `mindmap.md`.
///
/// Browsers submit textarea values with CRLF line breaks; they are turned
/// back into the LF breaks of the outline.
pub async fn download(Form(form): Form<DownloadForm>) -> Response {
    if form.markdown.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Nothing to download").into_response();
    }
    let markdown = form.markdown.replace("\r\n", "\n");
    (
        [
            (
                header::CONTENT_TYPE,
                format!("{DOWNLOAD_MEDIA_TYPE}; charset=utf-8"),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        markdown,
    )
        .into_response()
}

fn error_page(err: &MindmapError) -> Response {
    warn!("Request failed ({}): {}", err.kind(), err);
    (status_for(err), Html(page::render_error(err))).into_response()
}

fn error_json(err: &MindmapError) -> Response {
    warn!("Request failed ({}): {}", err.kind(), err);
    (
        status_for(err),
        Json(ErrorResponse {
            error: err.kind(),
            severity: err.severity(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

// ── Response bodies ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MindmapResponse {
    pub markdown: String,
    pub html: String,
    pub frame_height: u32,
    pub warnings: Vec<Warning>,
    pub stats: MindmapStats,
    pub outline_stats: OutlineStats,
}

impl From<MindmapOutput> for MindmapResponse {
    fn from(output: MindmapOutput) -> Self {
        Self {
            markdown: output.outline.into_string(),
            html: output.view.html,
            frame_height: output.view.frame_height,
            warnings: output.warnings,
            stats: output.stats,
            outline_stats: output.outline_stats,
        }
    }
}
