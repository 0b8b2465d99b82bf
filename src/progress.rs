//! Progress-callback trait for attempt-level conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to observe each
//! external-tool invocation as the fallback chain runs. The CLI uses this to
//! drive a spinner; a server could forward events to a WebSocket.
//!
//! # Example
//!
//! ```rust
//! use slidepress::{ConversionAttempt, ConversionProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     attempts: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_attempt_complete(&self, step: usize, attempt: &ConversionAttempt) {
//!         self.attempts.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("step {step}: rc={}", attempt.exit_code);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { attempts: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::attempt::ConversionAttempt;
use std::sync::Arc;

/// Called by the orchestrator around each external-tool invocation.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before a tool is spawned.
    ///
    /// # Arguments
    /// * `step`: 1-indexed position in the attempt log
    /// * `command`: the shell-quoted command line
    fn on_attempt_start(&self, step: usize, command: &str) {
        let _ = (step, command);
    }

    /// Called once the tool has exited (or failed to start, or timed out).
    fn on_attempt_complete(&self, step: usize, attempt: &ConversionAttempt) {
        let _ = (step, attempt);
    }

    /// Called once after the chain finishes.
    ///
    /// # Arguments
    /// * `slide_count`: PNGs found; 0 means the conversion failed
    /// * `attempts`: number of tools invoked
    fn on_conversion_complete(&self, slide_count: usize, attempts: usize) {
        let _ = (slide_count, attempts);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
