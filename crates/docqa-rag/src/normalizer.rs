//! Input normalization: the first pipeline stage

use tracing::info;

use docqa_core::PipelineState;

/// Start a pipeline run from a raw query
///
/// Always yields a clean state: no passages, no answer and no evaluation,
/// whatever the caller may have held from a previous run.
pub fn normalize(query: &str) -> PipelineState {
    info!("Input normalizer");
    PipelineState::new(query)
}
