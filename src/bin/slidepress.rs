//! CLI binary for slidepress.
//!
//! A thin shim over the library crate: `serve` runs the HTTP server,
//! `convert` runs the conversion chain once, `export` packages an edited
//! folder.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use slidepress::{
    convert, export, ConversionAttempt, ConversionProgressCallback, ExportFormat, PipelineConfig,
    ProgressCallback, ServerConfig, SlideOrder, SlidepressError, Workspace,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner showing the running tool, with one log line per finished attempt.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_attempt_start(&self, step: usize, command: &str) {
        self.bar.set_prefix(format!("Step {step}"));
        self.bar.set_message(command.trim_end_matches(" 2>&1").to_string());
    }

    fn on_attempt_complete(&self, step: usize, attempt: &ConversionAttempt) {
        let mark = if attempt.succeeded() { green("✓") } else { red("✗") };
        self.bar.println(format!(
            "  {} Step {}  {}  {}",
            mark,
            step,
            dim(&format!("rc={}", attempt.exit_code)),
            attempt.command
        ));
    }

    fn on_conversion_complete(&self, slide_count: usize, attempts: usize) {
        self.bar.finish_and_clear();
        if slide_count > 0 {
            eprintln!(
                "{} {} slides after {} tool runs",
                green("✔"),
                bold(&slide_count.to_string()),
                attempts
            );
        } else {
            eprintln!("{} no slides after {} tool runs", red("✘"), attempts);
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the editor API on port 8080, workspace in ./data
  slidepress serve --base-dir ./data

  # Convert one deck and list the slides
  slidepress convert deck.pptx -o out/deck

  # Same, as JSON including the attempt log
  slidepress convert deck.pptx -o out/deck --json

  # Package edited slides
  slidepress export my_session --format pptx --base-dir ./data

REQUIRED TOOLS:
  unoconv    (LibreOffice)   deck → PDF / PNG
  pdftoppm   (poppler-utils) PDF → PNG
  convert    (ImageMagick)   PDF → PNG fallback

ENVIRONMENT VARIABLES:
  Every flag has a SLIDEPRESS_* equivalent (e.g. SLIDEPRESS_PORT, SLIDEPRESS_DPI).
  RUST_LOG overrides the log filter.
"#;

/// Convert PowerPoint decks into PNG slides and back.
#[derive(Parser, Debug)]
#[command(
    name = "slidepress",
    version,
    about = "Convert PowerPoint decks into PNG slides and export edited slides",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SLIDEPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SLIDEPRESS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Convert a single deck into PNG slides.
    Convert(ConvertArgs),
    /// Export an edited folder as ZIP or PPTX.
    Export(ExportArgs),
}

/// Conversion-chain flags shared by `serve` and `convert`.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// pdftoppm rendering DPI (72–600).
    #[arg(long, env = "SLIDEPRESS_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// ImageMagick -density for the fallback step (72–600).
    #[arg(long, env = "SLIDEPRESS_DENSITY", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    density: u32,

    /// Order slides numerically by digit runs (slide-2 before slide-10).
    #[arg(long, env = "SLIDEPRESS_NATURAL_ORDER")]
    natural_order: bool,

    /// Kill a tool that runs longer than this many seconds.
    #[arg(long, env = "SLIDEPRESS_TOOL_TIMEOUT")]
    tool_timeout: Option<u64>,

    /// unoconv binary.
    #[arg(long, env = "SLIDEPRESS_UNOCONV", default_value = "unoconv")]
    unoconv: String,

    /// pdftoppm binary.
    #[arg(long, env = "SLIDEPRESS_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm: String,

    /// ImageMagick convert binary (e.g. `magick`).
    #[arg(long, env = "SLIDEPRESS_CONVERT", default_value = "convert")]
    convert_bin: String,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "SLIDEPRESS_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "SLIDEPRESS_PORT", default_value_t = 8080)]
    port: u16,

    /// Workspace directory (uploads/, slides/, edited/, exports/).
    #[arg(long, env = "SLIDEPRESS_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// CSV with Question/Answer columns for the chat endpoints.
    #[arg(long, env = "SLIDEPRESS_QA_CSV")]
    qa_csv: Option<PathBuf>,

    /// Maximum request body in MiB.
    #[arg(long, env = "SLIDEPRESS_MAX_UPLOAD_MB", default_value_t = 64)]
    max_upload_mb: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = "SLIDEPRESS_JSON_LOGS")]
    json_logs: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// The .ppt / .pptx to convert.
    input: PathBuf,

    /// Output directory for the PDF and PNGs. Default: ./<input stem>/
    #[arg(short, long, env = "SLIDEPRESS_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the ConversionOutput as JSON instead of slide names.
    #[arg(long, env = "SLIDEPRESS_JSON")]
    json: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Folder under edited/.
    folder: String,

    #[arg(long, value_enum, default_value = "zip")]
    format: FormatArg,

    /// Workspace directory.
    #[arg(long, env = "SLIDEPRESS_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Order slides numerically by digit runs.
    #[arg(long, env = "SLIDEPRESS_NATURAL_ORDER")]
    natural_order: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Zip,
    Pptx,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Zip => ExportFormat::Zip,
            FormatArg::Pptx => ExportFormat::Pptx,
        }
    }
}

fn slide_order(natural: bool) -> SlideOrder {
    if natural {
        SlideOrder::Natural
    } else {
        SlideOrder::Lexicographic
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers `convert`, so library INFO logs are muted there.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let json_logs = matches!(&cli.command, Command::Serve(args) if args.json_logs);
    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    }

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args, show_progress, cli.quiet).await,
        Command::Export(args) => run_export(args, cli.quiet).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let pipeline = build_pipeline(&args.pipeline, None)?;
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        base_dir: args.base_dir,
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
        qa_csv: args.qa_csv,
        pipeline,
    };
    slidepress::serve(&config).await.context("Server failed")
}

async fn run_convert(args: ConvertArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_pipeline(&args.pipeline, progress_cb)?;

    let out_dir = match args.output {
        Some(dir) => dir,
        None => PathBuf::from(
            args.input
                .file_stem()
                .context("Input path has no file name")?,
        ),
    };

    match convert(&args.input, &out_dir, &config).await {
        Ok(output) => {
            if args.json {
                let json =
                    serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
                println!("{json}");
            } else {
                for path in output.slides.paths() {
                    println!("{}", path.display());
                }
                if !quiet && !show_progress {
                    eprintln!(
                        "Converted into {} slides in {}ms",
                        output.slides.len(),
                        output.duration_ms
                    );
                }
            }
            Ok(())
        }
        Err(SlidepressError::ConversionFailed { attempts }) => {
            if args.json {
                let json = serde_json::json!({
                    "ok": false,
                    "error": "Conversion failed or no PNGs produced",
                    "cmds": attempts,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                eprintln!("{}", red("Conversion failed or no PNGs produced"));
                for attempt in &attempts {
                    eprintln!("  $ {}", attempt.command);
                    eprintln!("    {}", dim(&format!("exit code {}", attempt.exit_code)));
                    for line in &attempt.captured_output {
                        eprintln!("    {}", dim(line));
                    }
                }
            }
            std::process::exit(1);
        }
        Err(e) => Err(e).context("Conversion failed"),
    }
}

async fn run_export(args: ExportArgs, quiet: bool) -> Result<()> {
    let workspace = Workspace::open(&args.base_dir)
        .with_context(|| format!("Failed to open workspace {:?}", args.base_dir))?;
    let artifact = export(
        &workspace,
        &args.folder,
        args.format.into(),
        slide_order(args.natural_order),
    )
    .await
    .context("Export failed")?;

    println!("{}", artifact.path.display());
    if !quiet {
        eprintln!(
            "{} {} images  →  {}",
            green("✔"),
            artifact.image_count,
            bold(&artifact.web_path)
        );
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_pipeline(args: &PipelineArgs, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .dpi(args.dpi)
        .fallback_density(args.density)
        .unoconv_bin(&args.unoconv)
        .pdftoppm_bin(&args.pdftoppm)
        .convert_bin(&args.convert_bin)
        .tool_timeout_secs(args.tool_timeout)
        .slide_order(slide_order(args.natural_order));

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
