//! Application State

use std::sync::Arc;

use cyntel_advisor::CommandPipeline;
use cyntel_core::LlmProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Command pipeline with its market, balance and narrative clients
    pub pipeline: Arc<CommandPipeline>,

    /// Narrative provider, kept for health reporting
    pub provider: Arc<dyn LlmProvider>,
}
