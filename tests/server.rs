//! Router tests: requests go through the real axum stack via
//! `tower::ServiceExt::oneshot`, with stand-ins behind the pipeline.

#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use edgequake_pdf2mindmap::server::{build_router, AppState, DEFAULT_BODY_LIMIT};
use edgequake_pdf2mindmap::{
    Completion, CompletionService, MindmapConfig, MindmapError, MindmapPipeline, PageText,
    TextExtractor,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "mindmap-test-boundary";

struct FixedPages(Vec<String>);

impl TextExtractor for FixedPages {
    fn extract_pages(&self, _name: &str, _pdf: &[u8]) -> Result<Vec<PageText>, MindmapError> {
        Ok(self.0.iter().cloned().map(Ok).collect())
    }
}

struct Canned {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionService for Canned {
    fn provider(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _prompt: &str) -> Result<Completion, MindmapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                ..Default::default()
            }),
            Err(detail) => Err(MindmapError::ServiceError {
                provider: "canned".into(),
                detail: detail.clone(),
            }),
        }
    }
}

fn app_with(pages: &[&str], reply: Result<&str, &str>) -> (Router, Arc<Canned>) {
    let service = Arc::new(Canned {
        reply: reply.map(str::to_string).map_err(str::to_string),
        calls: AtomicUsize::new(0),
    });
    let extractor = Arc::new(FixedPages(pages.iter().map(|p| p.to_string()).collect()));
    let pipeline = MindmapPipeline::new(
        MindmapConfig::builder().build().unwrap(),
        extractor,
        service.clone(),
    );
    (build_router(AppState::new(pipeline), DEFAULT_BODY_LIMIT), service)
}

fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    multipart_to("/mindmap", field, filename, content_type, data)
}

fn multipart_to(
    uri: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn index_serves_upload_form() {
    let (app, _) = app_with(&["x"], Ok("# X"));
    let res = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_string(res).await;
    assert!(html.contains(r#"enctype="multipart/form-data""#));
}

#[tokio::test]
async fn health_reports_provider() {
    let (app, _) = app_with(&["x"], Ok("# X"));
    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["provider"], "canned");
}

#[tokio::test]
async fn upload_renders_both_tabs() {
    let (app, _) = app_with(&["Project Alpha"], Ok("# Project Alpha\n## Goals\n## Timeline"));
    let res = app
        .oneshot(multipart("pdf", "alpha.pdf", "application/pdf", b"%PDF-1.4"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let html = body_string(res).await;
    assert!(html.contains("Successfully extracted 13 characters from PDF"));
    assert!(html.contains("<iframe"));
    assert!(html.contains(r#"height="700""#));
    assert!(html.contains("markmap-lib@0.14.3"));
    assert!(html.contains(r#"action="/download""#));
    assert!(html.contains("# Project Alpha\n## Goals\n## Timeline</textarea>"));
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_before_generation() {
    let (app, service) = app_with(&["x"], Ok("# X"));
    let res = app
        .oneshot(multipart("pdf", "notes.txt", "text/plain", b"hello"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let (app, _) = app_with(&["x"], Ok("# X"));
    let res = app
        .oneshot(multipart("other", "a.pdf", "application/pdf", b"%PDF"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(res).await.contains("No PDF file uploaded"));
}

#[tokio::test]
async fn image_only_pdf_shows_warning() {
    let (app, service) = app_with(&["", "  "], Ok("# X"));
    let res = app
        .oneshot(multipart("pdf", "scan.pdf", "application/pdf", b"%PDF"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(res).await;
    assert!(html.contains(r#"class="notice warning""#));
    assert!(html.contains("scanned or image-based"));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn service_failure_is_bad_gateway_json() {
    let (app, _) = app_with(&["text"], Err("quota exceeded"));
    let res = app
        .oneshot(multipart_to("/api/mindmap", "pdf", "a.pdf", "application/pdf", b"%PDF"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(json["error"], "service_error");
    assert_eq!(json["severity"], "error");
    assert!(json["message"].as_str().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn api_returns_outline_and_view() {
    let (app, _) = app_with(&["body"], Ok("# Root\n## Leaf"));
    let res = app
        .oneshot(multipart_to("/api/mindmap", "pdf", "a.pdf", "application/pdf", b"%PDF"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(json["markdown"], "# Root\n## Leaf");
    assert_eq!(json["frame_height"], 700);
    assert_eq!(json["stats"]["extracted_chars"], 4);
    assert!(json["html"].as_str().unwrap().contains("new markmap.Markmap"));
}

#[tokio::test]
async fn download_is_markdown_attachment() {
    let (app, _) = app_with(&["x"], Ok("# X"));
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/download")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("markdown=%23+Root%0A%23%23+Leaf"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"mindmap.md\""
    );
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/markdown"));
    assert_eq!(body_string(res).await, "# Root\n## Leaf");
}

#[tokio::test]
async fn download_restores_outline_line_breaks() {
    let (app, _) = app_with(&["x"], Ok("# X"));
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/download")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("markdown=%23+A%0D%0A%23%23+B%0D%0A-+point"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "# A\n## B\n- point");
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let service = Arc::new(Canned {
        reply: Ok("# X".into()),
        calls: AtomicUsize::new(0),
    });
    let pipeline = MindmapPipeline::new(
        MindmapConfig::builder().build().unwrap(),
        Arc::new(FixedPages(vec!["x".into()])),
        service.clone(),
    );
    let app = build_router(AppState::new(pipeline), 1024);
    let res = app
        .oneshot(multipart("pdf", "big.pdf", "application/pdf", &vec![b'x'; 4096]))
        .await
        .unwrap();
    assert!(res.status().is_client_error());
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}
