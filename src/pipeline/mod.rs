//! Building blocks of the conversion chain.
//!
//! Each submodule covers one concern and is testable without the external
//! tools installed.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ tool ──▶ scan
//! (upload)  (unoconv / pdftoppm / convert)  (*.png listing)
//!             │
//!             └──▶ attempt (cmd, rc, out) ──▶ attempt log
//! ```
//!
//! 1. [`input`]: validate and sanitise uploaded names
//! 2. [`tool`]: render command lines and run subprocesses through a
//!    [`tool::CommandRunner`]
//! 3. [`attempt`]: the per-invocation diagnostic record
//! 4. [`scan`]: list and order the PNGs a tool left behind

pub mod attempt;
pub mod input;
pub mod scan;
pub mod tool;
