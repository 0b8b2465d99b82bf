//! # slidepress
//!
//! Turn uploaded PowerPoint decks into PNG slides, let a browser editor save
//! edited slides, and export them back as a ZIP or a PPTX.
//!
//! ## Why shell out?
//!
//! Rendering `.ppt`/`.pptx` faithfully needs an office suite. Rather than
//! reimplementing one, this crate drives the tools that already do it well
//! (unoconv for the office document, pdftoppm or ImageMagick for the
//! rasterisation) and treats them as black boxes. The interesting part is
//! the fallback chain and the attempt log that explains what went wrong when
//! nothing worked.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .pptx
//!  │
//!  ├─ 1. Intake   sanitise name, store under uploads/
//!  ├─ 2. PDF      unoconv -f pdf
//!  ├─ 3. PNG      pdftoppm -png  (or unoconv -f png when no PDF)
//!  ├─ 4. Rescue   convert -density on the PDF when no PNGs
//!  └─ 5. Output   ordered slide list + attempt log
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slidepress::{convert, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let output = convert("deck.pptx", "out/deck", &config).await?;
//!     for name in &output.slides.names {
//!         println!("{}", name);
//!     }
//!     eprintln!("{} tool runs, {}ms", output.attempts.len(), output.duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `slidepress` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library:
//! ```toml
//! slidepress = { version = "0.1", default-features = false }
//! ```
//!
//! ## External Tools
//!
//! | Tool | Package | Used for |
//! |------|---------|----------|
//! | `unoconv`  | unoconv + LibreOffice | deck → PDF, or deck → PNG |
//! | `pdftoppm` | poppler-utils | PDF → one PNG per page |
//! | `convert`  | ImageMagick (+ Ghostscript) | PDF → PNG when pdftoppm produced nothing |
//!
//! Missing tools are not fatal on their own; they show up as failed attempts.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod chat;
pub mod config;
pub mod convert;
pub mod debug_log;
pub mod edit;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use chat::{session_reply, ChatReply, QaBank, QaPair, UserType};
pub use config::{PipelineConfig, PipelineConfigBuilder, ServerConfig};
pub use convert::{convert, convert_logged, convert_sync};
pub use debug_log::DebugLog;
pub use edit::{save_edited, SavedImage};
pub use error::SlidepressError;
pub use export::{export, export_pptx, export_zip, ExportArtifact, ExportFormat};
pub use output::{ConversionOutput, SlideImageSet};
pub use pipeline::attempt::ConversionAttempt;
pub use pipeline::scan::SlideOrder;
pub use pipeline::tool::{CommandRunner, SystemRunner, ToolInvocation, ToolOutput};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{create_router, serve, AppState};
pub use workspace::{UploadedDeck, Workspace};
