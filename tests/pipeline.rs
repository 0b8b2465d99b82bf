//! Conversion-chain tests driven by a scripted runner.

mod common;

use common::{FakeRunner, Script};
use slidepress::pipeline::scan::scan_slides;
use slidepress::{
    convert, convert_logged, ConversionAttempt, ConversionProgressCallback, DebugLog,
    PipelineConfig, SlideOrder, SlidepressError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    source: PathBuf,
    out_dir: PathBuf,
    runner: Arc<FakeRunner>,
}

fn fixture(script: Script) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("1700000000_deck.pptx");
    std::fs::write(&source, common::PPTX_BYTES).unwrap();
    let out_dir = tmp.path().join("slides").join("1700000000_deck");
    Fixture {
        source,
        out_dir,
        runner: Arc::new(FakeRunner::new(script)),
        _tmp: tmp,
    }
}

fn config_for(fx: &Fixture) -> PipelineConfig {
    PipelineConfig::builder()
        .runner(fx.runner.clone())
        .build()
        .unwrap()
}

fn expect_failure(result: Result<slidepress::ConversionOutput, SlidepressError>) -> Vec<ConversionAttempt> {
    match result {
        Err(SlidepressError::ConversionFailed { attempts }) => attempts,
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn pdf_then_pdftoppm_returns_sorted_slides() {
    let fx = fixture(Script {
        pdf: true,
        pdftoppm_pages: 3,
        pad: true,
        ..Script::default()
    });
    let output = convert(&fx.source, &fx.out_dir, &config_for(&fx)).await.unwrap();

    assert_eq!(
        output.slides.names,
        vec!["slide-01.png", "slide-02.png", "slide-03.png"]
    );
    assert_eq!(output.attempts.len(), 2);
    assert!(output.attempts[0].command.starts_with("unoconv -f pdf -o "));
    assert!(output.attempts[1].command.starts_with("pdftoppm -png -rx 150 -ry 150 "));
    assert_eq!(output.pdf, Some(fx.out_dir.join("1700000000_deck.pdf")));
}

#[tokio::test]
async fn missing_pdf_falls_back_to_direct_png() {
    let fx = fixture(Script {
        direct_pages: 2,
        ..Script::default()
    });
    let output = convert(&fx.source, &fx.out_dir, &config_for(&fx)).await.unwrap();

    assert_eq!(output.slides.names, vec!["deck1.png", "deck2.png"]);
    assert_eq!(output.attempts.len(), 2);
    assert_eq!(output.attempts[0].exit_code, 1);
    assert!(output.attempts[1].command.starts_with("unoconv -f png -o "));
    assert!(output.pdf.is_none());
}

#[tokio::test]
async fn imagemagick_rescues_empty_pdftoppm_run() {
    let fx = fixture(Script {
        pdf: true,
        magick_pages: 2,
        ..Script::default()
    });
    let output = convert(&fx.source, &fx.out_dir, &config_for(&fx)).await.unwrap();

    assert_eq!(output.slides.names, vec!["slide-000.png", "slide-001.png"]);
    assert_eq!(output.attempts.len(), 3);
    assert!(output.attempts[2].command.starts_with("convert -density 200 "));
    assert!(output.attempts[2].command.contains("slide-%03d.png"));
}

#[tokio::test]
async fn failure_without_pdf_logs_two_attempts() {
    let fx = fixture(Script::default());
    let attempts = expect_failure(convert(&fx.source, &fx.out_dir, &config_for(&fx)).await);

    assert_eq!(attempts.len(), 2);
    assert!(attempts[0].command.contains("-f pdf"));
    assert!(attempts[1].command.contains("-f png"));
    assert_eq!(
        attempts[0].captured_output,
        vec!["Error: Unable to connect or start own listener."]
    );
    // ImageMagick is never tried without a PDF.
    assert!(fx.runner.calls().iter().all(|c| !c.starts_with("convert")));
}

#[tokio::test]
async fn failure_with_pdf_logs_three_attempts() {
    let fx = fixture(Script {
        pdf: true,
        ..Script::default()
    });
    let err = convert(&fx.source, &fx.out_dir, &config_for(&fx))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Conversion failed or no PNGs produced");

    let attempts = err.attempts().unwrap();
    let programs: Vec<&str> = attempts
        .iter()
        .map(|a| a.command.split(' ').next().unwrap())
        .collect();
    assert_eq!(programs, vec!["unoconv", "pdftoppm", "convert"]);
}

#[tokio::test]
async fn lexicographic_and_natural_order_differ_past_nine_pages() {
    let script = Script {
        pdf: true,
        pdftoppm_pages: 12,
        pad: false,
        ..Script::default()
    };

    let fx = fixture(script);
    let output = convert(&fx.source, &fx.out_dir, &config_for(&fx)).await.unwrap();
    assert_eq!(output.slides.names[..3], ["slide-1.png", "slide-10.png", "slide-11.png"]);

    let fx = fixture(script);
    let config = PipelineConfig::builder()
        .runner(fx.runner.clone())
        .slide_order(SlideOrder::Natural)
        .build()
        .unwrap();
    let output = convert(&fx.source, &fx.out_dir, &config).await.unwrap();
    assert_eq!(output.slides.names[..3], ["slide-1.png", "slide-2.png", "slide-3.png"]);
    assert_eq!(output.slides.names.last().unwrap(), "slide-12.png");
}

#[tokio::test]
async fn rescanning_is_stable() {
    let fx = fixture(Script {
        pdf: true,
        pdftoppm_pages: 4,
        pad: true,
        ..Script::default()
    });
    let output = convert(&fx.source, &fx.out_dir, &config_for(&fx)).await.unwrap();

    let first = scan_slides(&fx.out_dir, SlideOrder::Lexicographic);
    let second = scan_slides(&fx.out_dir, SlideOrder::Lexicographic);
    assert_eq!(first, second);
    assert_eq!(first, output.slides.names);
}

#[tokio::test]
async fn every_attempt_lands_in_the_debug_log() {
    let fx = fixture(Script {
        direct_pages: 1,
        ..Script::default()
    });
    let log_path = fx.out_dir.parent().unwrap().join("conversion_debug.log");
    let log = DebugLog::new(&log_path);

    convert_logged(&fx.source, &fx.out_dir, &config_for(&fx), &log)
        .await
        .unwrap();

    let text = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4, "{text}");
    assert!(lines[0].contains("] Running: unoconv -f pdf"));
    assert!(lines[1].contains("] Exit code: 1; Output: Error: Unable to connect"));
    assert!(lines[2].contains("] PDF missing; trying direct PNG: unoconv -f png"));
    assert!(lines[3].contains("] Exit code: 0; Output: "));
    assert!(lines.iter().all(|l| l.starts_with('[')));
}

#[derive(Default)]
struct CountingCallback {
    started: AtomicUsize,
    completed: AtomicUsize,
    slides: AtomicUsize,
}

impl ConversionProgressCallback for CountingCallback {
    fn on_attempt_start(&self, _step: usize, _command: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_complete(&self, _step: usize, _attempt: &ConversionAttempt) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_conversion_complete(&self, slide_count: usize, _attempts: usize) {
        self.slides.store(slide_count, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_sees_each_attempt() {
    let fx = fixture(Script {
        pdf: true,
        magick_pages: 5,
        ..Script::default()
    });
    let cb = Arc::new(CountingCallback::default());
    let config = PipelineConfig::builder()
        .runner(fx.runner.clone())
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    convert(&fx.source, &fx.out_dir, &config).await.unwrap();

    assert_eq!(cb.started.load(Ordering::SeqCst), 3);
    assert_eq!(cb.completed.load(Ordering::SeqCst), 3);
    assert_eq!(cb.slides.load(Ordering::SeqCst), 5);
}

#[test]
fn missing_binaries_are_recorded_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("deck.pptx");
    std::fs::write(&source, common::PPTX_BYTES).unwrap();
    let config = PipelineConfig::builder()
        .unoconv_bin("/nonexistent/slidepress-unoconv")
        .pdftoppm_bin("/nonexistent/slidepress-pdftoppm")
        .convert_bin("/nonexistent/slidepress-convert")
        .build()
        .unwrap();

    let result = tokio_test::block_on(convert(&source, tmp.path().join("out"), &config));
    let attempts = expect_failure(result);

    assert_eq!(attempts.len(), 2);
    for attempt in &attempts {
        assert_eq!(attempt.exit_code, -1);
        assert!(attempt.captured_output[0].starts_with("failed to start"));
    }
}
