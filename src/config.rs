//! Configuration types for deck conversion and the HTTP server.
//!
//! Conversion behaviour is controlled through [`PipelineConfig`], built via
//! [`PipelineConfigBuilder`]. The server wraps a pipeline config in
//! [`ServerConfig`] together with its bind address and workspace location.

use crate::error::SlidepressError;
use crate::pipeline::scan::SlideOrder;
use crate::pipeline::tool::{CommandRunner, SystemRunner};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the unoconv → pdftoppm → ImageMagick conversion chain.
///
/// # Example
/// ```rust
/// use slidepress::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .dpi(200)
///     .convert_bin("magick")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Resolution passed to pdftoppm as `-rx`/`-ry`. Range: 72–600. Default: 150.
    pub dpi: u32,

    /// Density passed to ImageMagick in the last-resort fallback. Range: 72–600. Default: 200.
    pub fallback_density: u32,

    /// Document converter. Default: `unoconv`.
    pub unoconv_bin: String,

    /// PDF rasteriser. Default: `pdftoppm`.
    pub pdftoppm_bin: String,

    /// ImageMagick entry point. Default: `convert` (use `magick` on IM7-only hosts).
    pub convert_bin: String,

    /// Per-tool wall-clock limit in seconds. Default: None (wait forever).
    ///
    /// A tool that overruns is killed and recorded with exit code -1; the
    /// fallback chain then continues as if it had failed.
    pub tool_timeout_secs: Option<u64>,

    /// Ordering applied to slide file names. Default: lexicographic.
    pub slide_order: SlideOrder,

    /// Pre-constructed command runner. If None, [`SystemRunner`] is used.
    pub runner: Option<Arc<dyn CommandRunner>>,

    /// Optional observer for attempt-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            fallback_density: 200,
            unoconv_bin: "unoconv".to_string(),
            pdftoppm_bin: "pdftoppm".to_string(),
            convert_bin: "convert".to_string(),
            tool_timeout_secs: None,
            slide_order: SlideOrder::default(),
            runner: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("dpi", &self.dpi)
            .field("fallback_density", &self.fallback_density)
            .field("unoconv_bin", &self.unoconv_bin)
            .field("pdftoppm_bin", &self.pdftoppm_bin)
            .field("convert_bin", &self.convert_bin)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("slide_order", &self.slide_order)
            .field("runner", &self.runner.as_ref().map(|_| "<dyn CommandRunner>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The runner that will execute tools.
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        match self.runner {
            Some(ref runner) => Arc::clone(runner),
            None => Arc::new(SystemRunner),
        }
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn fallback_density(mut self, density: u32) -> Self {
        self.config.fallback_density = density;
        self
    }

    pub fn unoconv_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.unoconv_bin = bin.into();
        self
    }

    pub fn pdftoppm_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.pdftoppm_bin = bin.into();
        self
    }

    pub fn convert_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.convert_bin = bin.into();
        self
    }

    pub fn tool_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    pub fn slide_order(mut self, order: SlideOrder) -> Self {
        self.config.slide_order = order;
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, SlidepressError> {
        let c = &self.config;
        if !(72..=600).contains(&c.dpi) {
            return Err(SlidepressError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if !(72..=600).contains(&c.fallback_density) {
            return Err(SlidepressError::InvalidConfig(format!(
                "Fallback density must be 72–600, got {}",
                c.fallback_density
            )));
        }
        for (label, bin) in [
            ("unoconv", &c.unoconv_bin),
            ("pdftoppm", &c.pdftoppm_bin),
            ("convert", &c.convert_bin),
        ] {
            if bin.trim().is_empty() {
                return Err(SlidepressError::InvalidConfig(format!(
                    "{label} binary must not be empty"
                )));
            }
        }
        if c.tool_timeout_secs == Some(0) {
            return Err(SlidepressError::InvalidConfig(
                "Tool timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Default request body limit: 64 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Settings for `slidepress serve`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `uploads/`, `slides/`, `edited/`, `exports/` and the debug log.
    pub base_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Q&A bank for the chat endpoints. None → built-in sample pairs.
    pub qa_csv: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_dir: PathBuf::from("."),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            qa_csv: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
