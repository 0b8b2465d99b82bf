//! Output-directory scanning: which PNGs exist, and in what order.
//!
//! Page order is defined purely by file names. pdftoppm pads page numbers to
//! the width of the page count (`slide-01.png` … `slide-12.png`) and the
//! ImageMagick fallback writes `slide-%03d.png`, so plain byte-wise ordering
//! is correct for every tool in the chain. [`SlideOrder::Natural`] exists for
//! converters that do not pad.

use crate::error::SlidepressError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// How slide file names are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideOrder {
    /// Byte-wise comparison of names (default).
    #[default]
    Lexicographic,
    /// Digit runs compare numerically: `slide-2` < `slide-10`.
    Natural,
}

impl SlideOrder {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            SlideOrder::Lexicographic => a.cmp(b),
            SlideOrder::Natural => natural_cmp(a, b),
        }
    }
}

/// True when `name` ends in `.png`, ignoring case.
pub fn is_png_name(name: &str) -> bool {
    name.len() >= 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".png")
}

/// List the PNG files directly inside `dir`, sorted by `order`.
///
/// A missing or unreadable directory yields an empty list; the orchestrator
/// treats "no PNGs" as the only failure signal.
pub fn scan_slides(dir: &Path, order: SlideOrder) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot scan {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_png_name(name))
        .collect();

    names.sort_by(|a, b| order.compare(a, b));
    names
}

/// [`scan_slides`] on the blocking pool, for use from async handlers.
pub async fn scan_slides_async(
    dir: &Path,
    order: SlideOrder,
) -> Result<Vec<String>, SlidepressError> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || scan_slides(&dir, order))
        .await
        .map_err(|e| SlidepressError::Internal(format!("Scan task panicked: {}", e)))
}

/// True when `path` exists and is a regular file.
pub async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// True when `path` exists and is a directory.
pub async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u128>(), y.parse::<u128>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Split into alternating runs of ASCII digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn png_suffix_is_case_insensitive() {
        assert!(is_png_name("slide-1.png"));
        assert!(is_png_name("SLIDE-1.PNG"));
        assert!(!is_png_name("deck.pdf"));
        assert!(!is_png_name("png"));
        assert!(!is_png_name("slide.png.txt"));
    }

    #[test]
    fn scan_ignores_non_png_and_directories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "slide-2.png");
        touch(tmp.path(), "slide-1.png");
        touch(tmp.path(), "deck.pdf");
        std::fs::create_dir(tmp.path().join("nested.png")).unwrap();

        let names = scan_slides(tmp.path(), SlideOrder::Lexicographic);
        assert_eq!(names, vec!["slide-1.png", "slide-2.png"]);
    }

    #[test]
    fn lexicographic_order_puts_ten_before_two() {
        let tmp = TempDir::new().unwrap();
        for n in ["slide-1.png", "slide-2.png", "slide-10.png"] {
            touch(tmp.path(), n);
        }
        assert_eq!(
            scan_slides(tmp.path(), SlideOrder::Lexicographic),
            vec!["slide-1.png", "slide-10.png", "slide-2.png"]
        );
        assert_eq!(
            scan_slides(tmp.path(), SlideOrder::Natural),
            vec!["slide-1.png", "slide-2.png", "slide-10.png"]
        );
    }

    #[test]
    fn rescan_is_stable() {
        let tmp = TempDir::new().unwrap();
        for n in ["b.png", "a.png", "c.PNG"] {
            touch(tmp.path(), n);
        }
        let first = scan_slides(tmp.path(), SlideOrder::Lexicographic);
        let second = scan_slides(tmp.path(), SlideOrder::Lexicographic);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_slides(&tmp.path().join("nope"), SlideOrder::Natural).is_empty());
    }

    #[tokio::test]
    async fn async_helpers_match_blocking_scan() {
        let tmp = TempDir::new().unwrap();
        for n in ["b.png", "a.png", "notes.txt"] {
            touch(tmp.path(), n);
        }
        let names = scan_slides_async(tmp.path(), SlideOrder::Lexicographic)
            .await
            .unwrap();
        assert_eq!(names, scan_slides(tmp.path(), SlideOrder::Lexicographic));
        assert!(is_file(&tmp.path().join("a.png")).await);
        assert!(!is_file(tmp.path()).await);
        assert!(is_dir(tmp.path()).await);
        assert!(!is_dir(&tmp.path().join("missing")).await);
    }

    #[test]
    fn natural_cmp_falls_back_to_text() {
        assert_eq!(natural_cmp("a2", "a10"), Ordering::Less);
        assert_eq!(natural_cmp("b1", "a9"), Ordering::Greater);
        assert_eq!(natural_cmp("slide", "slide-1"), Ordering::Less);
        assert_eq!(natural_cmp("x01", "x1"), Ordering::Less);
    }
}
