//! Conversion entry points: turn a `.ppt`/`.pptx` into PNG slides.
//!
//! The fallback chain is fixed:
//!
//! ```text
//! unoconv -f pdf ──▶ PDF exists? ──yes──▶ pdftoppm -png ──┐
//!                         │                               │
//!                         no ──▶ unoconv -f png ──────────┤
//!                                                         ▼
//!                                  no PNGs and PDF exists? ──yes──▶ convert -density
//!                                                         │
//!                                                         ▼
//!                                            PNGs? ok : ConversionFailed
//! ```
//!
//! Exit codes never short-circuit the chain. A tool may exit non-zero and
//! still have written usable output (unoconv does this when the office
//! listener prints warnings), so the only success criterion is "at least one
//! `.png` file exists in the output directory".

use crate::config::PipelineConfig;
use crate::debug_log::DebugLog;
use crate::error::SlidepressError;
use crate::output::{ConversionOutput, SlideImageSet};
use crate::pipeline::attempt::ConversionAttempt;
use crate::pipeline::input::file_stem;
use crate::pipeline::scan::{is_file, scan_slides_async};
use crate::pipeline::tool::{CommandRunner, ToolInvocation};
use crate::progress::ProgressCallback;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Prefix of the page images written by pdftoppm and ImageMagick.
pub const SLIDE_PREFIX: &str = "slide";

/// Convert a presentation into PNG slides inside `out_dir`.
///
/// # Arguments
/// * `source`: the uploaded `.ppt`/`.pptx`
/// * `out_dir`: the slide folder; created if missing, expected to be empty
/// * `config`: tool binaries, resolutions, runner, ordering
///
/// # Errors
/// [`SlidepressError::ConversionFailed`] with the attempt log when no PNG was
/// produced, [`SlidepressError::Io`] when `out_dir` cannot be created.
pub async fn convert(
    source: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, SlidepressError> {
    convert_logged(source, out_dir, config, &DebugLog::disabled()).await
}

/// Same as [`convert`], additionally writing every attempt to `log`.
pub async fn convert_logged(
    source: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &PipelineConfig,
    log: &DebugLog,
) -> Result<ConversionOutput, SlidepressError> {
    let start = Instant::now();
    let source = source.as_ref();
    let out_dir = out_dir.as_ref();
    info!("Starting conversion: {}", source.display());

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| SlidepressError::io(out_dir, e))?;

    let stem = source
        .file_name()
        .and_then(|n| n.to_str())
        .map(file_stem)
        .unwrap_or("deck");
    let pdf = out_dir.join(format!("{stem}.pdf"));

    let mut chain = AttemptChain {
        runner: config.runner(),
        timeout: config.tool_timeout(),
        log,
        callback: config.progress_callback.clone(),
        attempts: Vec::new(),
    };

    // ── Step 1: document → PDF ───────────────────────────────────────────
    chain
        .run("Running", unoconv_to_pdf(config, source, &pdf))
        .await;

    // ── Step 2/3: PDF → PNG, or direct document → PNG ────────────────────
    let pdf_exists = is_file(&pdf).await;
    let mut names = if pdf_exists {
        chain
            .run("Running", pdftoppm_to_png(config, &pdf, out_dir))
            .await;
        scan_slides_async(out_dir, config.slide_order).await?
    } else {
        chain
            .run(
                "PDF missing; trying direct PNG",
                unoconv_to_png(config, source, out_dir),
            )
            .await;
        scan_slides_async(out_dir, config.slide_order).await?
    };

    // ── Step 4: last-resort ImageMagick on the PDF ───────────────────────
    if names.is_empty() && is_file(&pdf).await {
        chain
            .run(
                "Trying ImageMagick convert",
                imagemagick_to_png(config, &pdf, out_dir),
            )
            .await;
        names = scan_slides_async(out_dir, config.slide_order).await?;
    }

    let attempts = chain.attempts;
    if names.is_empty() {
        warn!(
            "Conversion of {} produced no PNGs after {} attempts",
            source.display(),
            attempts.len()
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_conversion_complete(0, attempts.len());
        }
        return Err(SlidepressError::ConversionFailed { attempts });
    }

    // ── Step 6: final scan defines slide order ───────────────────────────
    let names = scan_slides_async(out_dir, config.slide_order).await?;
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} slides, {} attempts, {}ms",
        names.len(),
        attempts.len(),
        duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(names.len(), attempts.len());
    }

    let pdf_kept = is_file(&pdf).await;
    Ok(ConversionOutput {
        slides: SlideImageSet::new(out_dir, names),
        attempts,
        pdf: pdf_kept.then_some(pdf),
        duration_ms,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    source: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, SlidepressError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SlidepressError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, out_dir, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Runs tools one after another and accumulates the attempt log.
struct AttemptChain<'a> {
    runner: Arc<dyn CommandRunner>,
    timeout: Option<Duration>,
    log: &'a DebugLog,
    callback: Option<ProgressCallback>,
    attempts: Vec<ConversionAttempt>,
}

impl AttemptChain<'_> {
    async fn run(&mut self, label: &str, invocation: ToolInvocation) {
        let command = invocation.command_line();
        let step = self.attempts.len() + 1;
        self.log.append(&format!("{label}: {command}"));
        if let Some(ref cb) = self.callback {
            cb.on_attempt_start(step, &command);
        }

        let output = self.runner.run(&invocation, self.timeout).await;
        let attempt = ConversionAttempt::new(command, output.exit_code, output.lines);
        self.log.append(&format!(
            "Exit code: {}; Output: {}",
            attempt.exit_code,
            attempt.joined_output()
        ));
        if let Some(ref cb) = self.callback {
            cb.on_attempt_complete(step, &attempt);
        }
        self.attempts.push(attempt);
    }
}

fn unoconv_to_pdf(config: &PipelineConfig, source: &Path, pdf: &Path) -> ToolInvocation {
    ToolInvocation::new(&config.unoconv_bin)
        .arg("-f")
        .arg("pdf")
        .arg("-o")
        .path_arg(pdf)
        .path_arg(source)
}

fn unoconv_to_png(config: &PipelineConfig, source: &Path, out_dir: &Path) -> ToolInvocation {
    ToolInvocation::new(&config.unoconv_bin)
        .arg("-f")
        .arg("png")
        .arg("-o")
        .path_arg(out_dir)
        .path_arg(source)
}

fn pdftoppm_to_png(config: &PipelineConfig, pdf: &Path, out_dir: &Path) -> ToolInvocation {
    let dpi = config.dpi.to_string();
    ToolInvocation::new(&config.pdftoppm_bin)
        .arg("-png")
        .arg("-rx")
        .arg(dpi.clone())
        .arg("-ry")
        .arg(dpi)
        .path_arg(pdf)
        .path_arg(&out_dir.join(SLIDE_PREFIX))
}

fn imagemagick_to_png(config: &PipelineConfig, pdf: &Path, out_dir: &Path) -> ToolInvocation {
    let pattern: PathBuf = out_dir.join(format!("{SLIDE_PREFIX}-%03d.png"));
    ToolInvocation::new(&config.convert_bin)
        .arg("-density")
        .arg(config.fallback_density.to_string())
        .path_arg(pdf)
        .path_arg(&pattern)
}
