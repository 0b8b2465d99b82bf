//! Scripted stand-in for unoconv, pdftoppm, and ImageMagick.
//!
//! The fake tools write the files the real ones would, according to a
//! [`Script`], and record every command line they were given.

#![allow(dead_code)]

use futures::future::BoxFuture;
use slidepress::{CommandRunner, ToolInvocation, ToolOutput};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// What each fake tool produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct Script {
    /// `unoconv -f pdf` writes the PDF.
    pub pdf: bool,
    /// Pages written by `pdftoppm`.
    pub pdftoppm_pages: usize,
    /// Pages written by `unoconv -f png`.
    pub direct_pages: usize,
    /// Pages written by `convert`.
    pub magick_pages: usize,
    /// Zero-pad pdftoppm page numbers to two digits.
    pub pad: bool,
}

pub struct FakeRunner {
    script: Script,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn execute(&self, inv: &ToolInvocation) -> ToolOutput {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", inv.program, inv.args.join(" ")));
        let s = self.script;
        match (inv.program.as_str(), inv.args.first().map(String::as_str)) {
            ("unoconv", Some("-f")) if inv.args[1] == "pdf" => {
                if s.pdf {
                    touch(Path::new(&inv.args[3]));
                    ToolOutput::new(0, vec![])
                } else {
                    ToolOutput::new(1, vec!["Error: Unable to connect or start own listener.".into()])
                }
            }
            ("unoconv", Some("-f")) => {
                let dir = PathBuf::from(&inv.args[3]);
                for i in 1..=s.direct_pages {
                    touch(&dir.join(format!("deck{i}.png")));
                }
                exit_for(s.direct_pages)
            }
            ("pdftoppm", _) => {
                let prefix = &inv.args[6];
                for i in 1..=s.pdftoppm_pages {
                    let name = if s.pad {
                        format!("{prefix}-{i:02}.png")
                    } else {
                        format!("{prefix}-{i}.png")
                    };
                    touch(Path::new(&name));
                }
                exit_for(s.pdftoppm_pages)
            }
            ("convert", _) => {
                let pattern = &inv.args[3];
                for i in 0..s.magick_pages {
                    touch(Path::new(&pattern.replace("%03d", &format!("{i:03}"))));
                }
                exit_for(s.magick_pages)
            }
            _ => ToolOutput::new(127, vec![format!("{}: command not found", inv.program)]),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
        _timeout: Option<Duration>,
    ) -> BoxFuture<'a, ToolOutput> {
        let output = self.execute(invocation);
        Box::pin(async move { output })
    }
}

fn exit_for(pages: usize) -> ToolOutput {
    if pages > 0 {
        ToolOutput::new(0, vec![])
    } else {
        ToolOutput::new(1, vec!["Syntax Warning: nothing rendered".into()])
    }
}

fn touch(path: &Path) {
    std::fs::write(path, b"\x89PNG\r\n\x1a\n").unwrap();
}

/// A small valid PPTX-looking payload (ZIP signature).
pub const PPTX_BYTES: &[u8] = b"PK\x03\x04fake deck";
