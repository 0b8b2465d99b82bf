//! Export edited slides as a ZIP of PNGs or as a PPTX deck.
//!
//! Both exports read every `*.png` in `edited/<folder>/` in slide order and
//! write a timestamped archive into `exports/`. Archive writing is blocking
//! I/O and runs under `spawn_blocking`.
//!
//! The PPTX is assembled directly as an OOXML package: one slide master,
//! one blank layout, one theme, and one slide per image. Each slide holds a
//! single picture anchored at the top-left corner, 540 px tall, with its
//! width following the image's aspect ratio. Edited slides may hold JPEG
//! bytes under a `.png` name, so format and size are read from the content.

use crate::error::SlidepressError;
use crate::pipeline::scan::{scan_slides_async, SlideOrder};
use crate::workspace::{unix_secs, Workspace, EXPORTS_DIR};
use serde::Serialize;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use image::{ImageFormat, ImageReader};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// EMU per CSS pixel (914400 EMU per inch / 96 px per inch).
pub const EMU_PER_PX: u64 = 9525;

/// Picture height on every slide, in pixels.
pub const SLIDE_IMAGE_HEIGHT_PX: u64 = 540;

/// 4:3 slide, 10 in × 7.5 in.
pub const SLIDE_WIDTH_EMU: u64 = 9_144_000;
pub const SLIDE_HEIGHT_EMU: u64 = 6_858_000;

/// Which archive to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Zip,
    Pptx,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    /// `exports/<file>`, relative to the workspace.
    pub web_path: String,
    pub path: PathBuf,
    pub image_count: usize,
}

/// Export `edited/<folder>` in the requested format.
pub async fn export(
    workspace: &Workspace,
    folder: &str,
    format: ExportFormat,
    order: SlideOrder,
) -> Result<ExportArtifact, SlidepressError> {
    match format {
        ExportFormat::Zip => export_zip(workspace, folder, order).await,
        ExportFormat::Pptx => export_pptx(workspace, folder, order).await,
    }
}

/// Bundle the edited PNGs into `exports/slides_<folder>_<secs>.zip`.
pub async fn export_zip(
    workspace: &Workspace,
    folder: &str,
    order: SlideOrder,
) -> Result<ExportArtifact, SlidepressError> {
    let (src, name) = resolve_edited(workspace, folder).await?;
    let file_name = format!("slides_{}_{}.zip", name, unix_secs());
    let dest = workspace.exports_dir().join(&file_name);

    let images = scan_slides_async(&src, order).await?;
    let count = images.len();
    let (src_c, dest_c) = (src.clone(), dest.clone());
    run_blocking(move || write_zip(&src_c, &images, &dest_c)).await?;

    info!("Exported {} images to {}", count, dest.display());
    Ok(ExportArtifact {
        web_path: format!("{EXPORTS_DIR}/{file_name}"),
        path: dest,
        image_count: count,
    })
}

/// Build `exports/presentation_<folder>_<secs>.pptx`, one slide per PNG.
pub async fn export_pptx(
    workspace: &Workspace,
    folder: &str,
    order: SlideOrder,
) -> Result<ExportArtifact, SlidepressError> {
    let (src, name) = resolve_edited(workspace, folder).await?;
    let file_name = format!("presentation_{}_{}.pptx", name, unix_secs());
    let dest = workspace.exports_dir().join(&file_name);

    let images = scan_slides_async(&src, order).await?;
    let count = images.len();
    let (src_c, dest_c) = (src.clone(), dest.clone());
    run_blocking(move || write_pptx(&src_c, &images, &dest_c)).await?;

    info!("Exported {} slides to {}", count, dest.display());
    Ok(ExportArtifact {
        web_path: format!("{EXPORTS_DIR}/{file_name}"),
        path: dest,
        image_count: count,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn resolve_edited(
    workspace: &Workspace,
    folder: &str,
) -> Result<(PathBuf, String), SlidepressError> {
    let dir = workspace.edited_dir(folder).await?;
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    Ok((dir, name))
}

async fn run_blocking<F>(f: F) -> Result<(), SlidepressError>
where
    F: FnOnce() -> Result<(), SlidepressError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SlidepressError::Internal(format!("Export task panicked: {}", e)))?
}

fn zip_error(dest: &Path, message: &str, detail: impl std::fmt::Display) -> SlidepressError {
    warn!("{} ({}): {}", message, dest.display(), detail);
    SlidepressError::ExportFailed {
        message: message.to_string(),
        path: dest.to_path_buf(),
    }
}

fn write_zip(src: &Path, images: &[String], dest: &Path) -> Result<(), SlidepressError> {
    let file = File::create(dest).map_err(|e| zip_error(dest, "Failed to create zip", e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for name in images {
        let path = src.join(name);
        let bytes = std::fs::read(&path).map_err(|e| SlidepressError::io(&path, e))?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| zip_error(dest, "Failed to create zip", e))?;
        zip.write_all(&bytes)
            .map_err(|e| zip_error(dest, "Failed to create zip", e))?;
    }

    zip.finish()
        .map_err(|e| zip_error(dest, "Failed to create zip", e))?;
    Ok(())
}

fn write_pptx(src: &Path, images: &[String], dest: &Path) -> Result<(), SlidepressError> {
    const FAIL: &str = "Failed to create pptx";

    let file = File::create(dest).map_err(|e| zip_error(dest, FAIL, e))?;
    let mut zip = ZipWriter::new(file);
    let xml = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let media = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let put = |zip: &mut ZipWriter<File>,
               name: &str,
               body: &[u8],
               opts: SimpleFileOptions|
     -> Result<(), SlidepressError> {
        zip.start_file(name, opts)
            .map_err(|e| zip_error(dest, FAIL, e))?;
        zip.write_all(body).map_err(|e| zip_error(dest, FAIL, e))
    };

    let count = images.len();
    put(&mut zip, "[Content_Types].xml", pptx::content_types(count).as_bytes(), xml)?;
    put(&mut zip, "_rels/.rels", pptx::ROOT_RELS.as_bytes(), xml)?;
    put(&mut zip, "ppt/presentation.xml", pptx::presentation(count).as_bytes(), xml)?;
    put(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        pptx::presentation_rels(count).as_bytes(),
        xml,
    )?;
    put(&mut zip, "ppt/slideMasters/slideMaster1.xml", pptx::SLIDE_MASTER.as_bytes(), xml)?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        pptx::SLIDE_MASTER_RELS.as_bytes(),
        xml,
    )?;
    put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", pptx::SLIDE_LAYOUT.as_bytes(), xml)?;
    put(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        pptx::SLIDE_LAYOUT_RELS.as_bytes(),
        xml,
    )?;
    put(&mut zip, "ppt/theme/theme1.xml", pptx::THEME.as_bytes(), xml)?;

    for (i, name) in images.iter().enumerate() {
        let n = i + 1;
        let path = src.join(name);
        let mut bytes = Vec::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|e| SlidepressError::io(&path, e))?;

        let picture = Picture::sniff(&bytes, &path);
        put(
            &mut zip,
            &format!("ppt/media/image{n}.{}", picture.extension),
            &bytes,
            media,
        )?;
        put(&mut zip, &format!("ppt/slides/slide{n}.xml"), pptx::slide(picture.cx, picture.cy).as_bytes(), xml)?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            pptx::slide_rels(n, picture.extension).as_bytes(),
            xml,
        )?;
    }

    zip.finish().map_err(|e| zip_error(dest, FAIL, e))?;
    Ok(())
}

/// A slide picture as read from its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Picture {
    cx: u64,
    cy: u64,
    /// Media part extension, matching a `Default` in `[Content_Types].xml`.
    extension: &'static str,
}

impl Picture {
    /// Fixed height, width from the decoded aspect ratio. Unreadable images
    /// are stored as PNG at 4:3.
    fn sniff(bytes: &[u8], path: &Path) -> Self {
        let cy = SLIDE_IMAGE_HEIGHT_PX * EMU_PER_PX;
        let fallback = Self {
            cx: cy * 4 / 3,
            cy,
            extension: "png",
        };

        let reader = match ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
            Ok(reader) => reader,
            Err(e) => {
                warn!("Cannot read {}: {}; assuming 4:3", path.display(), e);
                return fallback;
            }
        };
        let extension = match reader.format() {
            Some(ImageFormat::Jpeg) => "jpeg",
            _ => "png",
        };
        match reader.into_dimensions() {
            Ok((w, h)) if h > 0 => Self {
                cx: cy * u64::from(w) / u64::from(h),
                cy,
                extension,
            },
            Ok(_) => Self { extension, ..fallback },
            Err(e) => {
                warn!("Cannot read dimensions of {}: {}; assuming 4:3", path.display(), e);
                fallback
            }
        }
    }
}

/// OOXML part templates for the PPTX export.
mod pptx {
    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
    const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
    const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    const EMPTY_TREE: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

    pub const ROOT_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>"#,
        r#"</Relationships>"#
    );

    pub const SLIDE_MASTER_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>"#,
        r#"</Relationships>"#
    );

    pub const SLIDE_LAYOUT_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>"#,
        r#"</Relationships>"#
    );

    pub const SLIDE_MASTER: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#,
        r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>"#,
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
        r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
        r#"</p:sldMaster>"#
    );

    pub const SLIDE_LAYOUT: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1">"#,
        r#"<p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>"#,
        r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#,
        r#"</p:sldLayout>"#
    );

    pub const THEME: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>"#,
        r#"<a:clrScheme name="Office">"#,
        r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
        r#"<a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2>"#,
        r#"<a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2>"#,
        r#"<a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4>"#,
        r#"<a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6>"#,
        r#"<a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink>"#,
        r#"</a:clrScheme>"#,
        r#"<a:fontScheme name="Office">"#,
        r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
        r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
        r#"</a:fontScheme>"#,
        r#"<a:fmtScheme name="Office">"#,
        r#"<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#,
        r#"<a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>"#,
        r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
        r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>"#,
        r#"</a:fmtScheme>"#,
        r#"</a:themeElements></a:theme>"#
    );

    pub fn content_types(slides: usize) -> String {
        let mut s = String::from(DECL);
        s.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        s.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        s.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        s.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
        s.push_str(r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#);
        s.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
        s.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
        s.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
        s.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
        for n in 1..=slides {
            s.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            ));
        }
        s.push_str("</Types>");
        s
    }

    pub fn presentation(slides: usize) -> String {
        let mut s = format!(r#"{DECL}<p:presentation {NS} saveSubsetFonts="1">"#);
        s.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        // An empty sldIdLst is invalid; omit it for zero slides.
        if slides > 0 {
            s.push_str("<p:sldIdLst>");
            for n in 1..=slides {
                s.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 2));
            }
            s.push_str("</p:sldIdLst>");
        }
        s.push_str(&format!(
            r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/><p:notesSz cx="{}" cy="{}"/>"#,
            super::SLIDE_WIDTH_EMU,
            super::SLIDE_HEIGHT_EMU,
            super::SLIDE_HEIGHT_EMU,
            super::SLIDE_WIDTH_EMU
        ));
        s.push_str("</p:presentation>");
        s
    }

    /// rId1 = master, rId2 = theme, rId3.. = slides.
    pub fn presentation_rels(slides: usize) -> String {
        let mut s = String::from(DECL);
        s.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        s.push_str(&format!(
            r#"<Relationship Id="rId1" Type="{REL}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
        ));
        s.push_str(&format!(
            r#"<Relationship Id="rId2" Type="{REL}/theme" Target="theme/theme1.xml"/>"#
        ));
        for n in 1..=slides {
            s.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL}/slide" Target="slides/slide{n}.xml"/>"#,
                n + 2
            ));
        }
        s.push_str("</Relationships>");
        s
    }

    pub fn slide(cx: u64, cy: u64) -> String {
        format!(
            concat!(
                r#"{decl}<p:sld {ns}><p:cSld><p:spTree>{tree}"#,
                r#"<p:pic><p:nvPicPr><p:cNvPr id="2" name="Slide image"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
                r#"<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
                r#"<p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
                r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
            ),
            decl = DECL,
            ns = NS,
            tree = EMPTY_TREE,
            cx = cx,
            cy = cy
        )
    }

    pub fn slide_rels(n: usize, extension: &str) -> String {
        format!(
            concat!(
                r#"{decl}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="{rel}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
                r#"<Relationship Id="rId2" Type="{rel}/image" Target="../media/image{n}.{ext}"/>"#,
                r#"</Relationships>"#
            ),
            decl = DECL,
            rel = REL,
            n = n,
            ext = extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn write_png(path: &Path, w: u32, h: u32) {
        RgbaImage::from_pixel(w, h, Rgba([0, 128, 255, 255]))
            .save(path)
            .unwrap();
    }

    fn workspace_with_edits(names: &[&str]) -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::open(tmp.path()).unwrap();
        let dir = ws.edited_root().join("session");
        std::fs::create_dir_all(&dir).unwrap();
        for n in names {
            write_png(&dir.join(n), 8, 6);
        }
        std::fs::write(dir.join("notes.txt"), b"skip me").unwrap();
        (tmp, ws)
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn zip_contains_only_pngs_in_order() {
        let (_tmp, ws) = workspace_with_edits(&["slide-2.png", "slide-1.png"]);
        let artifact = export_zip(&ws, "session", SlideOrder::Lexicographic)
            .await
            .unwrap();

        assert!(artifact.web_path.starts_with("exports/slides_session_"));
        assert!(artifact.web_path.ends_with(".zip"));
        assert_eq!(artifact.image_count, 2);
        assert_eq!(entry_names(&artifact.path), vec!["slide-1.png", "slide-2.png"]);
    }

    #[tokio::test]
    async fn missing_edited_folder_fails() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::open(tmp.path()).unwrap();
        let err = export_zip(&ws, "ghost", SlideOrder::Lexicographic)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Edited folder not found");
    }

    #[tokio::test]
    async fn pptx_has_one_slide_per_png() {
        let (_tmp, ws) = workspace_with_edits(&["a.png", "b.png", "c.png"]);
        let artifact = export(&ws, "session", ExportFormat::Pptx, SlideOrder::Lexicographic)
            .await
            .unwrap();
        assert!(artifact.web_path.starts_with("exports/presentation_session_"));

        let names = entry_names(&artifact.path);
        assert_eq!(names[0], "[Content_Types].xml");
        for n in 1..=3 {
            assert!(names.contains(&format!("ppt/slides/slide{n}.xml")));
            assert!(names.contains(&format!("ppt/media/image{n}.png")));
        }
        assert!(!names.contains(&"ppt/slides/slide4.xml".to_string()));

        let mut archive = ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();
        let mut pres = String::new();
        archive
            .by_name("ppt/presentation.xml")
            .unwrap()
            .read_to_string(&mut pres)
            .unwrap();
        assert_eq!(pres.matches("<p:sldId ").count(), 3);
    }

    #[tokio::test]
    async fn pptx_with_no_images_omits_slide_list() {
        let (_tmp, ws) = workspace_with_edits(&[]);
        let artifact = export_pptx(&ws, "session", SlideOrder::Lexicographic)
            .await
            .unwrap();
        assert_eq!(artifact.image_count, 0);
        let mut archive = ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();
        let mut pres = String::new();
        archive
            .by_name("ppt/presentation.xml")
            .unwrap()
            .read_to_string(&mut pres)
            .unwrap();
        assert!(!pres.contains("sldIdLst"));
    }

    #[test]
    fn picture_width_follows_aspect_ratio() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wide.png");
        write_png(&path, 16, 9);
        let picture = Picture::sniff(&std::fs::read(&path).unwrap(), &path);
        assert_eq!(picture.cy, 540 * 9525);
        assert_eq!(picture.cx, 540 * 9525 * 16 / 9);
        assert_eq!(picture.extension, "png");
    }

    #[test]
    fn unreadable_image_assumes_four_by_three() {
        let picture = Picture::sniff(b"nope", Path::new("broken.png"));
        assert_eq!((picture.cx, picture.cy), (540 * 9525 * 4 / 3, 540 * 9525));
        assert_eq!(picture.extension, "png");
    }

    #[tokio::test]
    async fn jpeg_saved_under_png_name_keeps_its_aspect() {
        let (_tmp, ws) = workspace_with_edits(&[]);
        let frame = image::RgbImage::from_pixel(160, 90, image::Rgb([200, 40, 40]));
        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(frame)
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        std::fs::write(ws.edited_root().join("session").join("slide-1.png"), &jpeg).unwrap();

        let artifact = export_pptx(&ws, "session", SlideOrder::Lexicographic)
            .await
            .unwrap();
        let mut archive = ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();
        let read = |archive: &mut ZipArchive<File>, name: &str| {
            let mut s = String::new();
            archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
            s
        };

        let slide = read(&mut archive, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"<a:ext cx="9144000" cy="5143500"/>"#), "{slide}");
        let rels = read(&mut archive, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("../media/image1.jpeg"));
        let types = read(&mut archive, "[Content_Types].xml");
        assert!(types.contains(r#"Extension="jpeg" ContentType="image/jpeg""#));
        assert!(archive.by_name("ppt/media/image1.jpeg").is_ok());
    }
}
