//! Upload intake: validate and normalise a client-supplied deck name.
//!
//! Browsers send whatever file name the user picked, including directory
//! components on some platforms. Only the base name survives, and every
//! character outside `[A-Za-z0-9._-]` is replaced so the stored name is safe
//! to use both as a path component and as an external-tool argument.

use crate::error::SlidepressError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Extensions accepted for upload (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["ppt", "pptx"];

static RE_UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9._-]").unwrap());

static RE_UNSAFE_FOLDER_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").unwrap());

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Last path component of a client-supplied name, accepting `/` and `\`.
/// Trailing separators are ignored, so `deck/` names `deck`.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// The directory a client-supplied folder name refers to, or `None` when
/// its base name is empty, `.` or `..`.
pub fn folder_component(name: &str) -> Option<&str> {
    match base_name(name) {
        "" | "." | ".." => None,
        base => Some(base),
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    RE_UNSAFE_FILE_CHARS.replace_all(name, "_").into_owned()
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_folder_name(name: &str) -> String {
    RE_UNSAFE_FOLDER_CHARS.replace_all(name, "_").into_owned()
}

/// Extension after the last `.`, if any.
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// File name without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Validate an upload and return the sanitised base name.
///
/// Fails with [`SlidepressError::NoUpload`] for an empty body and
/// [`SlidepressError::UnsupportedExtension`] for anything but `.ppt`/`.pptx`.
/// A magic-byte mismatch only produces a warning: converters accept plenty
/// of variants that a 4-byte sniff would misjudge.
pub fn validate_upload(client_name: &str, bytes: &[u8]) -> Result<String, SlidepressError> {
    if bytes.is_empty() {
        return Err(SlidepressError::NoUpload);
    }

    let name = base_name(client_name);
    let ext = extension(name)
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(SlidepressError::UnsupportedExtension {
            name: name.to_string(),
        });
    }

    let expected = if ext == "pptx" { ZIP_MAGIC } else { OLE_MAGIC };
    if bytes.len() < 4 || bytes[..4] != expected {
        warn!(
            "Upload '{}' does not start with the expected {} signature",
            name, ext
        );
    }

    let sanitized = sanitize_file_name(name);
    debug!("Accepted upload '{}' as '{}'", client_name, sanitized);
    Ok(sanitized)
}
