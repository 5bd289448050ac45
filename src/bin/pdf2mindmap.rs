//! CLI binary for edgequake-pdf2mindmap.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `MindmapConfig`, then either converts one document or starts the web UI.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2mindmap::pipeline::input::resolve_input;
use edgequake_pdf2mindmap::server::{self, AppState, DEFAULT_BIND};
use edgequake_pdf2mindmap::{
    write_outputs, MindmapConfig, MindmapOutput, MindmapPipeline, PipelineProgressCallback,
    PipelineStage, ProgressCallback, Warning,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner whose message follows the pipeline stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// The bar stays hidden until the first stage, so a startup error
    /// leaves no spinner behind.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Mindmap");
        Arc::new(Self { bar })
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: &PipelineStage) {
        if stage.is_terminal() {
            self.bar.finish_and_clear();
            return;
        }
        if *stage == PipelineStage::Extracting {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
            self.bar.enable_steady_tick(Duration::from_millis(80));
        }
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_text_extracted(&self, chars: usize, pages_with_text: usize, total_pages: usize) {
        self.bar.println(format!(
            "  {} Successfully extracted {} characters from PDF  {}",
            green("✓"),
            bold(&chars.to_string()),
            dim(&format!("({pages_with_text}/{total_pages} pages)")),
        ));
    }

    fn on_warning(&self, warning: &Warning) {
        self.bar.println(format!("  {} {}", yellow("⚠"), warning));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Outline to stdout
  pdf2mindmap convert paper.pdf

  # Write mindmap.md and mindmap.html into ./out
  pdf2mindmap convert paper.pdf -o out

  # From a URL, as JSON
  pdf2mindmap convert https://arxiv.org/pdf/1706.03762 --json > attention.json

  # Another provider (reads OPENAI_API_KEY)
  pdf2mindmap --provider openai --model gpt-4.1-mini convert paper.pdf

  # Web UI on http://127.0.0.1:8501
  pdf2mindmap serve

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (GOOGLE_API_KEY also accepted)
  PDF2MINDMAP_PROVIDER    Provider: gemini (default), openai, anthropic, ollama, …
  PDF2MINDMAP_MODEL       Model ID (default for gemini: gemini-2.0-flash)
  PDF2MINDMAP_MAX_CHARS   Characters of text sent to the model (default 30000)
  PDF2MINDMAP_BIND        Listen address for `serve`
  PDFIUM_LIB_PATH         Directory or file of the pdfium shared library
  RUST_LOG                Log filter, overrides -v / -q

  A .env file in the working directory is loaded first.
"#;

/// Turn PDF documents into interactive Markmap mindmaps.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2mindmap",
    version,
    about = "Turn PDF documents into interactive Markmap mindmaps using LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// API key for the Gemini provider.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion provider: gemini, openai, anthropic, ollama, …
    #[arg(long, global = true, env = "PDF2MINDMAP_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Model ID. Defaults to the provider's default model.
    #[arg(long, global = true, env = "PDF2MINDMAP_MODEL")]
    model: Option<String>,

    /// Characters of extracted text sent to the model.
    #[arg(long, global = true, env = "PDF2MINDMAP_MAX_CHARS", default_value_t = 30_000)]
    max_chars: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PDF2MINDMAP_TEMPERATURE")]
    temperature: Option<f32>,

    /// Timeout for the completion call in seconds. No timeout if unset.
    #[arg(long, global = true, env = "PDF2MINDMAP_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "PDF2MINDMAP_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Directory or file holding the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a mindmap for one PDF file or URL.
    Convert(ConvertArgs),
    /// Start the web UI.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write mindmap.md and mindmap.html into this directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full result (outline, view, warnings, stats) as JSON.
    #[arg(long, conflicts_with = "output")]
    json: bool,

    /// With --output, write only mindmap.md.
    #[arg(long, requires = "output")]
    markdown_only: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PDF2MINDMAP_BIND", default_value = DEFAULT_BIND)]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries progress for `convert`, so library INFO logs are
    // only shown for `serve` or with -v.
    let show_progress = matches!(&cli.command, Command::Convert(a) if !a.json) && !g.quiet;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    // Missing credentials end the program before any input is read.
    let config = build_config(g, progress)?;
    let pipeline = MindmapPipeline::from_config(config).context("Cannot start")?;

    match cli.command {
        Command::Convert(ref args) => run_convert(&pipeline, args, g).await,
        Command::Serve(ref args) => {
            if !g.quiet {
                eprintln!(
                    "{} Serving mindmaps with {} on {}",
                    green("◆"),
                    bold(pipeline.provider()),
                    bold(&format!("http://{}", args.bind))
                );
            }
            server::serve(&args.bind, AppState::new(pipeline))
                .await
                .with_context(|| format!("Server on {} stopped", args.bind))
        }
    }
}

async fn run_convert(pipeline: &MindmapPipeline, args: &ConvertArgs, g: &GlobalArgs) -> Result<()> {
    let document = resolve_input(&args.input, g.download_timeout)
        .await
        .with_context(|| format!("Cannot read '{}'", args.input))?;
    let output = pipeline
        .run(document)
        .await
        .context("Mindmap generation failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    match args.output {
        Some(ref dir) if args.markdown_only => {
            let path = dir.join(edgequake_pdf2mindmap::output::DOWNLOAD_FILE_NAME);
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            tokio::fs::write(&path, output.outline.as_str())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !g.quiet {
                eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
            }
        }
        Some(ref dir) => {
            let files = write_outputs(&output, dir)
                .await
                .context("Failed to write output files")?;
            if !g.quiet {
                eprintln!("{} {}", green("✔"), bold(&files.markdown.display().to_string()));
                eprintln!("{} {}", green("✔"), bold(&files.html.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.outline.as_str().as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
        }
    }

    if !g.quiet {
        print_summary(&output);
    }
    Ok(())
}

fn print_summary(output: &MindmapOutput) {
    let s = &output.stats;
    let o = &output.outline_stats;
    eprintln!(
        "   {} main topics, {} subtopics, {} details, {} key points",
        o.main_topics, o.subtopics, o.details, o.key_points
    );
    eprintln!(
        "   {} tokens in  /  {} tokens out  ·  {}ms total",
        dim(&s.input_tokens.to_string()),
        dim(&s.output_tokens.to_string()),
        s.total_duration_ms,
    );
}

/// Map CLI args to `MindmapConfig`.
fn build_config(g: &GlobalArgs, progress: Option<ProgressCallback>) -> Result<MindmapConfig> {
    let api_key = g
        .api_key
        .clone()
        .or_else(|| std::env::var("GOOGLE_API_KEY").ok());

    let mut builder = MindmapConfig::builder()
        .provider_name(&g.provider)
        .max_input_chars(g.max_chars)
        .download_timeout_secs(g.download_timeout);

    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = g.model {
        builder = builder.model(model);
    }
    if let Some(t) = g.temperature {
        builder = builder.temperature(t);
    }
    if let Some(secs) = g.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = g.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
