//! On-disk layout shared by the server, the CLI, and the export functions.
//!
//! ```text
//! <base>/
//! ├── uploads/                 <unix-secs>_<sanitised name>.pptx
//! ├── slides/<stored stem>/    <stem>.pdf, slide-1.png, …
//! ├── edited/<folder>/         PNGs saved by the browser editor
//! ├── exports/                 slides_<folder>_<secs>.zip, presentation_<folder>_<secs>.pptx
//! └── conversion_debug.log
//! ```
//!
//! Folder names coming from clients are always reduced to their last path
//! component before being joined onto a workspace directory.

use crate::config::PipelineConfig;
use crate::convert::convert_logged;
use crate::debug_log::{DebugLog, DEBUG_LOG_FILE};
use crate::error::SlidepressError;
use crate::output::ConversionOutput;
use crate::pipeline::input::{file_stem, folder_component, validate_upload};
use crate::pipeline::scan::{is_dir, scan_slides_async, SlideOrder};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

pub const UPLOADS_DIR: &str = "uploads";
pub const SLIDES_DIR: &str = "slides";
pub const EDITED_DIR: &str = "edited";
pub const EXPORTS_DIR: &str = "exports";

/// A stored upload, ready for conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedDeck {
    /// `uploads/<stored_name>`.
    pub path: PathBuf,
    /// `<unix-secs>_<sanitised name>`.
    pub stored_name: String,
    /// `stored_name` without its extension; names the slide folder.
    pub folder: String,
}

/// The four workspace directories plus the debug log.
#[derive(Debug, Clone)]
pub struct Workspace {
    base: PathBuf,
    log: DebugLog,
}

impl Workspace {
    /// Open a workspace rooted at `base`, creating every directory.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, SlidepressError> {
        let base = base.into();
        for dir in [UPLOADS_DIR, SLIDES_DIR, EDITED_DIR, EXPORTS_DIR] {
            let path = base.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| SlidepressError::io(&path, e))?;
        }
        let log = DebugLog::new(base.join(DEBUG_LOG_FILE));
        Ok(Self { base, log })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn log(&self) -> &DebugLog {
        &self.log
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.base.join(UPLOADS_DIR)
    }

    pub fn slides_root(&self) -> PathBuf {
        self.base.join(SLIDES_DIR)
    }

    pub fn edited_root(&self) -> PathBuf {
        self.base.join(EDITED_DIR)
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.base.join(EXPORTS_DIR)
    }

    /// `slides/<basename(folder)>`, without checking existence. `None` for
    /// names that would resolve to the slides root or above it.
    pub fn slide_dir(&self, folder: &str) -> Option<PathBuf> {
        folder_component(folder).map(|name| self.slides_root().join(name))
    }

    /// Validate and write an upload under `uploads/`, and create its slide folder.
    pub async fn store_upload(
        &self,
        client_name: &str,
        bytes: &[u8],
    ) -> Result<UploadedDeck, SlidepressError> {
        let sanitized = validate_upload(client_name, bytes)?;
        let stored_name = format!("{}_{}", unix_secs(), sanitized);
        let path = self.uploads_dir().join(&stored_name);

        // Staged in uploads/ then renamed, so a half-written deck never
        // carries the final name.
        let (dir, dest, data) = (self.uploads_dir(), path.clone(), bytes.to_vec());
        tokio::task::spawn_blocking(move || -> Result<(), SlidepressError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)
                .map_err(|e| SlidepressError::io(&dir, e))?;
            tmp.write_all(&data)
                .map_err(|e| SlidepressError::io(tmp.path(), e))?;
            tmp.persist(&dest)
                .map_err(|e| SlidepressError::io(&dest, e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| SlidepressError::Internal(format!("Upload task panicked: {}", e)))??;

        let folder = file_stem(&stored_name).to_string();
        let slide_dir = self.slides_root().join(&folder);
        tokio::fs::create_dir_all(&slide_dir)
            .await
            .map_err(|e| SlidepressError::io(&slide_dir, e))?;

        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(UploadedDeck {
            path,
            stored_name,
            folder,
        })
    }

    /// Run the conversion chain for a stored upload into its slide folder.
    pub async fn convert_upload(
        &self,
        deck: &UploadedDeck,
        config: &PipelineConfig,
    ) -> Result<ConversionOutput, SlidepressError> {
        let out_dir = self.slides_root().join(&deck.folder);
        convert_logged(&deck.path, &out_dir, config, &self.log).await
    }

    /// Slide URLs for an existing slide folder.
    pub async fn list_slides(
        &self,
        folder: &str,
        order: SlideOrder,
    ) -> Result<Vec<String>, SlidepressError> {
        let not_found = || SlidepressError::FolderNotFound {
            folder: folder.to_string(),
        };
        let name = folder_component(folder).ok_or_else(not_found)?;
        let dir = self.slides_root().join(name);
        if !is_dir(&dir).await {
            return Err(not_found());
        }
        let names = scan_slides_async(&dir, order).await?;
        Ok(slide_urls(name, &names))
    }

    /// `edited/<basename(folder)>`, which must already exist.
    pub async fn edited_dir(&self, folder: &str) -> Result<PathBuf, SlidepressError> {
        let not_found = || SlidepressError::EditedFolderNotFound {
            folder: folder.to_string(),
        };
        let dir = self
            .edited_root()
            .join(folder_component(folder).ok_or_else(not_found)?);
        if is_dir(&dir).await {
            Ok(dir)
        } else {
            Err(not_found())
        }
    }
}

/// `slides/<folder>/<percent-encoded name>` for each name.
pub fn slide_urls(folder: &str, names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| format!("{}/{}/{}", SLIDES_DIR, folder, urlencoding::encode(n)))
        .collect()
}

/// Seconds since the Unix epoch; used to make stored names unique-ish.
pub fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
