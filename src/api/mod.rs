pub mod handlers;
pub mod routes;

pub use routes::build_router;

use crate::assistant::AssistantClient;
use crate::risk::{FeatureCatalog, ModelRegistry};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub catalog: Arc<FeatureCatalog>,
    pub assistant: Option<Arc<AssistantClient>>,
}

impl AppState {
    pub fn new(registry: Arc<ModelRegistry>, catalog: Arc<FeatureCatalog>) -> Self {
        Self {
            registry,
            catalog,
            assistant: None,
        }
    }

    /// Attach the LLM assistant
    pub fn with_assistant(mut self, assistant: Arc<AssistantClient>) -> Self {
        self.assistant = Some(assistant);
        self
    }
}
