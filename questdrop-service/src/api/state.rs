use crate::service::metrics::Metrics;
use questdrop_core::application::PipelineContext;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: PipelineContext,
    pub metrics: Arc<Metrics>,
    /// Bearer token required on mutating endpoints; `None` disables auth.
    pub api_token: Option<String>,
}
