//! Result types returned by the conversion orchestrator.

use crate::pipeline::attempt::ConversionAttempt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The ordered PNG files found in a slide folder.
///
/// Has no identity beyond its directory; it is a snapshot of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideImageSet {
    pub dir: PathBuf,
    /// File names (not paths), in slide order.
    pub names: Vec<String>,
}

impl SlideImageSet {
    pub fn new(dir: impl Into<PathBuf>, names: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            names,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Full paths, in slide order.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.names.iter().map(move |n| self.dir.join(n))
    }

    /// Name of the folder holding the slides (`slides/<folder>/`).
    pub fn folder_name(&self) -> Option<&str> {
        self.dir.file_name().and_then(|n| n.to_str())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// A successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub slides: SlideImageSet,
    /// Every tool invoked, in order, including ones that failed.
    pub attempts: Vec<ConversionAttempt>,
    /// The intermediate PDF, when unoconv produced one.
    pub pdf: Option<PathBuf>,
    pub duration_ms: u64,
}
