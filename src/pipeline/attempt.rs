//! The attempt log: one record per external-tool invocation.

use serde::{Deserialize, Serialize};

/// Exit code recorded when a tool could not be spawned, was killed by a
/// signal, or timed out.
pub const NO_EXIT_CODE: i32 = -1;

/// A single external-tool invocation.
///
/// Serialises as `{"cmd": ..., "rc": ..., "out": [...]}`, the shape browser
/// clients read from `debug_cmds` / `cmds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionAttempt {
    /// Shell-quoted command line, for display only.
    #[serde(rename = "cmd")]
    pub command: String,
    #[serde(rename = "rc")]
    pub exit_code: i32,
    /// Merged stdout then stderr, one entry per line.
    #[serde(rename = "out")]
    pub captured_output: Vec<String>,
}

impl ConversionAttempt {
    pub fn new(command: impl Into<String>, exit_code: i32, captured_output: Vec<String>) -> Self {
        Self {
            command: command.into(),
            exit_code,
            captured_output,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Output lines joined the way the debug log prints them.
    pub fn joined_output(&self) -> String {
        self.captured_output.join(" | ")
    }
}
