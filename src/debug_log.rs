//! Flat, append-only conversion log.
//!
//! Operators troubleshooting a failed conversion usually want to re-run the
//! exact command as the server user. Every tool invocation, its exit code,
//! and its output therefore land in a plain-text file next to the workspace
//! directories, one timestamped line each:
//!
//! ```text
//! [2026-10-19 14:03:11] Running: unoconv -f pdf -o slides/1760_deck/1760_deck.pdf uploads/1760_deck.pptx 2>&1
//! [2026-10-19 14:03:15] Exit code: 0; Output:
//! ```
//!
//! Each line is mirrored to `tracing` so it also shows up in structured logs.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default file name, created in the workspace base directory.
pub const DEBUG_LOG_FILE: &str = "conversion_debug.log";

/// Handle to the debug log file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DebugLog {
    path: Option<PathBuf>,
}

impl DebugLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that only emits `tracing` events and writes no file.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one `[YYYY-MM-DD HH:MM:SS] message` line.
    ///
    /// Write failures are reported through `tracing` and otherwise ignored;
    /// a broken log file must never fail a conversion.
    pub fn append(&self, message: &str) {
        info!(target: "slidepress::debug_log", "{}", message);

        let Some(ref path) = self.path else {
            return;
        };
        let line = format_line(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string(), message);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = result {
            warn!("Cannot write debug log {}: {}", path.display(), e);
        }
    }
}

fn format_line(timestamp: &str, message: &str) -> String {
    format!("[{timestamp}] {message}\n")
}
