//! Pipeline integration tests with in-process stand-ins for pdfium and the
//! completion service. No network and no pdfium library are needed.

use async_trait::async_trait;
use edgequake_pdf2mindmap::{
    Completion, CompletionService, MindmapConfig, MindmapError, MindmapPipeline, PageError,
    PageText, PipelineProgressCallback, PipelineStage, SourceDocument, TextExtractor, Warning,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Stand-ins ────────────────────────────────────────────────────────────────

struct StubExtractor {
    pages: Vec<PageText>,
    calls: AtomicUsize,
}

impl StubExtractor {
    fn with_pages(pages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.iter().map(|p| Ok(p.to_string())).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

impl TextExtractor for StubExtractor {
    fn extract_pages(&self, _name: &str, _pdf: &[u8]) -> Result<Vec<PageText>, MindmapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.clone())
    }
}

struct StubService {
    reply: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubService {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionService for StubService {
    fn provider(&self) -> &str {
        "stub"
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, MindmapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Completion {
            text: self.reply.clone(),
            input_tokens: 42,
            output_tokens: 7,
        })
    }
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<PipelineStage>>,
    warnings: Mutex<Vec<Warning>>,
    extracted: Mutex<Option<usize>>,
}

impl PipelineProgressCallback for Recorder {
    fn on_stage(&self, stage: &PipelineStage) {
        self.stages.lock().unwrap().push(stage.clone());
    }
    fn on_text_extracted(&self, chars: usize, _pages_with_text: usize, _total_pages: usize) {
        *self.extracted.lock().unwrap() = Some(chars);
    }
    fn on_warning(&self, warning: &Warning) {
        self.warnings.lock().unwrap().push(warning.clone());
    }
}

fn pipeline(
    extractor: Arc<StubExtractor>,
    service: Arc<StubService>,
    recorder: Option<Arc<Recorder>>,
) -> MindmapPipeline {
    let mut builder = MindmapConfig::builder();
    if let Some(r) = recorder {
        builder = builder.progress_callback(r);
    }
    MindmapPipeline::new(builder.build().unwrap(), extractor, service)
}

fn doc() -> SourceDocument {
    SourceDocument::new("report.pdf", b"%PDF-1.7 stub".to_vec())
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_page_document_becomes_a_mindmap() {
    let extractor = StubExtractor::with_pages(&["Project Alpha\nGoals and timeline"]);
    let service = StubService::replying("# Project Alpha\n## Goals\n## Timeline\n");
    let recorder = Arc::new(Recorder::default());
    let p = pipeline(extractor.clone(), service.clone(), Some(recorder.clone()));

    let out = p.run(doc()).await.unwrap();

    assert_eq!(out.outline.as_str(), "# Project Alpha\n## Goals\n## Timeline");
    assert!(out.warnings.is_empty());
    assert_eq!(out.stats.extracted_chars, "Project Alpha\nGoals and timeline".chars().count());
    assert_eq!(out.stats.input_tokens, 42);
    assert_eq!(out.outline_stats.main_topics, 1);
    assert_eq!(out.outline_stats.subtopics, 2);
    assert_eq!(out.view.frame_height, 700);
    assert!(out.view.html.contains("# Project Alpha\n## Goals\n## Timeline"));

    let download = out.download();
    assert_eq!(download.file_name, "mindmap.md");
    assert_eq!(download.content, out.outline.as_str());

    let prompts = service.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Text to analyze: Project Alpha\nGoals and timeline\n\n"));

    use PipelineStage::*;
    let stages = recorder.stages.lock().unwrap();
    assert_eq!(*stages, vec![Extracting, Generating, Rendering, Done]);
    let mut prev = AwaitingUpload;
    for s in stages.iter() {
        assert!(prev.can_transition_to(s), "{prev:?} → {s:?}");
        prev = s.clone();
    }
    assert_eq!(*recorder.extracted.lock().unwrap(), Some(out.stats.extracted_chars));
}

#[tokio::test]
async fn blank_pages_stop_before_generation() {
    let extractor = StubExtractor::with_pages(&["   ", "\n\n"]);
    let service = StubService::replying("# never");
    let recorder = Arc::new(Recorder::default());
    let p = pipeline(extractor, service.clone(), Some(recorder.clone()));

    let err = p.run(doc()).await.unwrap_err();

    assert!(matches!(err, MindmapError::ExtractionEmpty { total_pages: 2 }));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    let stages = recorder.stages.lock().unwrap();
    assert!(matches!(stages.last(), Some(PipelineStage::Failed(_))));
    assert!(!stages.contains(&PipelineStage::Generating));
}

#[tokio::test]
async fn long_text_is_truncated_with_warning() {
    let long = "a".repeat(45_000);
    let extractor = StubExtractor::with_pages(&[long.as_str()]);
    let service = StubService::replying("# Long\n## Part");
    let recorder = Arc::new(Recorder::default());
    let p = pipeline(extractor, service.clone(), Some(recorder.clone()));

    let out = p.run(doc()).await.unwrap();

    let prompts = service.prompts.lock().unwrap();
    let expected = format!("Text to analyze: {}...\n", "a".repeat(30_000));
    assert!(prompts[0].contains(&expected));
    assert!(!prompts[0].contains(&"a".repeat(30_001)));

    assert_eq!(
        out.warnings,
        vec![Warning::LengthTruncated {
            original_chars: 45_000,
            max_chars: 30_000
        }]
    );
    assert!(out.stats.truncated);
    assert_eq!(out.stats.submitted_chars, 30_003);
    assert_eq!(recorder.warnings.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn text_at_the_cap_is_sent_whole() {
    let exact = "b".repeat(30_000);
    let extractor = StubExtractor::with_pages(&[exact.as_str()]);
    let service = StubService::replying("# B");
    let p = pipeline(extractor, service.clone(), None);

    let out = p.run(doc()).await.unwrap();

    assert!(out.warnings.is_empty());
    assert!(!service.prompts.lock().unwrap()[0].contains("b..."));
}

#[tokio::test]
async fn empty_generation_produces_no_view() {
    let extractor = StubExtractor::with_pages(&["content"]);
    let service = StubService::replying("  \n ");
    let recorder = Arc::new(Recorder::default());
    let p = pipeline(extractor, service.clone(), Some(recorder.clone()));

    let err = p.run(doc()).await.unwrap_err();

    assert!(matches!(err, MindmapError::EmptyGeneration { .. }));
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    assert!(!recorder.stages.lock().unwrap().contains(&PipelineStage::Rendering));
}

#[tokio::test]
async fn failed_pages_are_skipped() {
    let extractor = Arc::new(StubExtractor {
        pages: vec![
            Ok("first".into()),
            Err(PageError::TextFailed {
                page: 2,
                detail: "broken".into(),
            }),
            Ok("third".into()),
        ],
        calls: AtomicUsize::new(0),
    });
    let service = StubService::replying("# T");
    let p = pipeline(extractor, service.clone(), None);

    let out = p.run(doc()).await.unwrap();

    assert_eq!(out.stats.pages_with_text, 2);
    assert_eq!(out.stats.total_pages, 3);
    assert!(service.prompts.lock().unwrap()[0].contains("first\nthird"));
}

#[tokio::test]
async fn requests_do_not_share_state() {
    let service = StubService::replying("# Same");
    let p1 = pipeline(StubExtractor::with_pages(&["one"]), service.clone(), None);
    let p2 = pipeline(StubExtractor::with_pages(&["two"]), service.clone(), None);

    let (a, b) = tokio::join!(p1.run(doc()), p2.run(doc()));
    assert_eq!(a.unwrap().stats.extracted_chars, 3);
    assert_eq!(b.unwrap().stats.extracted_chars, 3);
    assert_eq!(service.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_key_is_reported_at_construction() {
    let config = MindmapConfig::builder().build().unwrap();
    let err = MindmapPipeline::from_config(config).unwrap_err();
    assert!(matches!(err, MindmapError::ConfigurationMissing { .. }));
    assert!(err.to_string().contains("gemini"));
}

#[test]
fn prebuilt_parts_need_no_key_or_pdfium() {
    let config = MindmapConfig::builder()
        .completion_service(StubService::replying("# X"))
        .text_extractor(StubExtractor::with_pages(&["x"]))
        .build()
        .unwrap();
    let p = MindmapPipeline::from_config(config).unwrap();
    assert_eq!(p.provider(), "stub");
}
