//! Persist images edited in the browser.
//!
//! The editor posts a canvas export as a data URL
//! (`data:image/png;base64,...`). The payload is decoded and written into
//! `edited/<folder>/`, which later feeds the ZIP and PPTX exports.

use crate::error::SlidepressError;
use crate::pipeline::input::{sanitize_file_name, sanitize_folder_name};
use crate::workspace::{Workspace, EDITED_DIR};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

/// Name used when the client does not say which slide was edited.
pub const DEFAULT_ORIG_NAME: &str = "slide.png";

/// Folder used when the client does not name an editing session.
pub const DEFAULT_EDIT_FOLDER: &str = "edited_session";

static RE_DATA_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^data:image/(png|jpeg);base64,(.*)$").unwrap());

/// Where an edited image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    /// `edited/<folder>/<name>`, relative to the workspace.
    pub web_path: String,
    pub path: PathBuf,
}

/// Image format named by a data URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUrlFormat {
    Png,
    Jpeg,
}

/// Split a `data:image/(png|jpeg);base64,` URL into its format and bytes.
pub fn decode_data_url(data_url: &str) -> Result<(DataUrlFormat, Vec<u8>), SlidepressError> {
    let caps = RE_DATA_URL
        .captures(data_url)
        .ok_or(SlidepressError::InvalidDataUrl)?;
    let format = match &caps[1] {
        "png" => DataUrlFormat::Png,
        _ => DataUrlFormat::Jpeg,
    };
    let bytes = STANDARD
        .decode(caps[2].trim())
        .map_err(|_| SlidepressError::InvalidDataUrl)?;
    Ok((format, bytes))
}

/// Decode `img` and write it to `edited/<folder>/<orig>`.
///
/// `orig` and `folder` fall back to [`DEFAULT_ORIG_NAME`] and
/// [`DEFAULT_EDIT_FOLDER`] when absent. Both are sanitised; the folder is
/// created even when the payload turns out to be invalid.
pub async fn save_edited(
    workspace: &Workspace,
    img: Option<&str>,
    orig: Option<&str>,
    folder: Option<&str>,
) -> Result<SavedImage, SlidepressError> {
    let folder = sanitize_folder_name(folder.unwrap_or(DEFAULT_EDIT_FOLDER));
    let out_dir = workspace.edited_root().join(&folder);
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| SlidepressError::io(&out_dir, e))?;

    let data = match img {
        Some(d) if !d.is_empty() => d,
        _ => return Err(SlidepressError::NoImageData),
    };
    let (_, bytes) = decode_data_url(data)?;

    let name = match sanitize_file_name(orig.unwrap_or(DEFAULT_ORIG_NAME)) {
        n if n.is_empty() || n == "." || n == ".." => DEFAULT_ORIG_NAME.to_string(),
        n => n,
    };
    let path = out_dir.join(&name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| SlidepressError::io(&path, e))?;

    workspace
        .log()
        .append(&format!("Saved edited image: {}", path.display()));

    Ok(SavedImage {
        web_path: format!("{EDITED_DIR}/{folder}/{name}"),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png_data_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn decodes_png_and_jpeg() {
        let (fmt, bytes) = decode_data_url(&png_data_url(b"\x89PNG")).unwrap();
        assert_eq!(fmt, DataUrlFormat::Png);
        assert_eq!(bytes, b"\x89PNG");

        let jpeg = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"\xFF\xD8"));
        assert_eq!(decode_data_url(&jpeg).unwrap().0, DataUrlFormat::Jpeg);
    }

    #[test]
    fn rejects_other_media_types_and_bad_base64() {
        assert!(matches!(
            decode_data_url("data:image/gif;base64,R0lG"),
            Err(SlidepressError::InvalidDataUrl)
        ));
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
        assert!(decode_data_url("not a data url").is_err());
    }

    #[tokio::test]
    async fn saves_into_sanitised_folder() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::open(tmp.path()).unwrap();
        let url = png_data_url(b"pixels");

        let saved = save_edited(&ws, Some(&url), Some("slide 1.png"), Some("my deck"))
            .await
            .unwrap();

        assert_eq!(saved.web_path, "edited/my_deck/slide_1.png");
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn defaults_orig_and_folder() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::open(tmp.path()).unwrap();
        let url = png_data_url(b"p");
        let saved = save_edited(&ws, Some(&url), None, None).await.unwrap();
        assert_eq!(saved.web_path, "edited/edited_session/slide.png");
    }

    #[tokio::test]
    async fn missing_image_creates_folder_then_fails() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::open(tmp.path()).unwrap();
        let err = save_edited(&ws, None, None, Some("s1")).await.unwrap_err();
        assert_eq!(err.to_string(), "No image data");
        assert!(ws.edited_root().join("s1").is_dir());
    }
}
