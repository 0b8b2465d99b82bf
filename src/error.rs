//! Error types for the slidepress library.
//!
//! A single fatal error type, [`SlidepressError`], covers every operation.
//! Its `Display` text doubles as the human-readable message returned to
//! browser clients in `{"ok": false, "error": ...}` responses, so variant
//! messages are short and free of internal detail.
//!
//! Conversion failures deliberately collapse into one variant,
//! [`SlidepressError::ConversionFailed`], which carries the full attempt log.
//! A missing binary, a malformed deck, and a permission problem all look the
//! same from here; the captured tool output is what tells them apart.

use crate::pipeline::attempt::ConversionAttempt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the slidepress library.
#[derive(Debug, Error)]
pub enum SlidepressError {
    // ── Upload / request errors ──────────────────────────────────────────
    /// The request carried no file, or an empty one.
    #[error("No file or upload error")]
    NoUpload,

    /// The uploaded file name does not end in `.ppt` / `.pptx`.
    #[error("Only PPT/PPTX allowed")]
    UnsupportedExtension { name: String },

    /// `slides/<folder>` does not exist.
    #[error("Folder not found")]
    FolderNotFound { folder: String },

    /// `edited/<folder>` does not exist.
    #[error("Edited folder not found")]
    EditedFolderNotFound { folder: String },

    /// `save_edited` was called without an image payload.
    #[error("No image data")]
    NoImageData,

    /// The image payload is not a `data:image/(png|jpeg);base64,` URL.
    #[error("Invalid dataURL")]
    InvalidDataUrl,

    // ── Conversion errors ────────────────────────────────────────────────
    /// Every step of the fallback chain ran and no PNG was produced.
    ///
    /// `attempts` holds every command line, exit code, and captured output
    /// in invocation order.
    #[error("Conversion failed or no PNGs produced")]
    ConversionFailed { attempts: Vec<ConversionAttempt> },

    // ── Output errors ────────────────────────────────────────────────────
    /// Writing a ZIP or PPTX archive failed.
    #[error("{message}")]
    ExportFailed { message: String, path: PathBuf },

    /// Generic filesystem failure.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SlidepressError {
    /// Wrap an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SlidepressError::Io {
            path: path.into(),
            source,
        }
    }

    /// The attempt log, if this error came out of the conversion chain.
    pub fn attempts(&self) -> Option<&[ConversionAttempt]> {
        match self {
            SlidepressError::ConversionFailed { attempts } => Some(attempts),
            _ => None,
        }
    }
}
