//! Router configuration.

use concierge_core::config::RouterSettings;
use concierge_core::{AppError, AppResult};
use std::time::Duration;

/// Settings a [`QueryRouter`](crate::QueryRouter) is constructed with.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Model used by every agent
    pub model: String,

    /// Workflow identifier attached to every remote call
    pub workflow_id: String,

    /// Trace name for the run
    pub trace_name: String,

    /// Vector stores searched by the internal Q&A agent
    pub vector_store_ids: Vec<String>,

    /// Deadline for a single stage's remote call
    pub stage_timeout: Duration,
}

impl From<&RouterSettings> for RouterConfig {
    fn from(settings: &RouterSettings) -> Self {
        Self {
            model: settings.model.clone(),
            workflow_id: settings.workflow_id.clone(),
            trace_name: settings.trace_name.clone(),
            vector_store_ids: settings.vector_store_ids.clone(),
            stage_timeout: Duration::from_secs(settings.stage_timeout_secs),
        }
    }
}

impl RouterConfig {
    /// Check the settings a run cannot start without.
    ///
    /// Internal Q&A file search needs at least one vector store.
    pub fn validate(&self) -> AppResult<()> {
        if self.vector_store_ids.is_empty() {
            return Err(AppError::Config(
                "router.vectorStoreIds must list at least one vector store".to_string(),
            ));
        }
        if self.vector_store_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(AppError::Config(
                "router.vectorStoreIds cannot contain blank ids".to_string(),
            ));
        }
        Ok(())
    }
}
