use std::sync::Arc;

use crate::chat::QaBank;
use crate::config::{PipelineConfig, ServerConfig};
use crate::error::SlidepressError;
use crate::workspace::Workspace;

/// Shared state handed to every handler.
///
/// Only the Q&A bank is shared data; everything else lives on disk.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<Workspace>,
    pub pipeline: PipelineConfig,
    pub qa: Arc<QaBank>,
}

impl AppState {
    pub fn new(workspace: Workspace, pipeline: PipelineConfig, qa: QaBank) -> Self {
        Self {
            workspace: Arc::new(workspace),
            pipeline,
            qa: Arc::new(qa),
        }
    }

    /// Open the workspace and load the Q&A bank named by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, SlidepressError> {
        let workspace = Workspace::open(&config.base_dir)?;
        let qa = QaBank::load_or_sample(config.qa_csv.as_deref());
        Ok(Self::new(workspace, config.pipeline.clone(), qa))
    }
}
