//! Common types used across the DocQA system

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::GenerationConfig;

/// Configuration for retrying transient remote failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(16),
        }
    }
}

impl RetryConfig {
    /// Delay before the attempt following `attempt` (1-based): doubles each
    /// time, capped at `max_backoff`, and never below `retry_after`.
    pub fn backoff_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self
            .initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff);

        match retry_after {
            Some(wait) => backoff.max(wait),
            None => backoff,
        }
    }
}

/// Settings of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub model_id: String,
    /// Number of passages retrieved per query
    pub top_k: usize,
    pub temperature: f32,
    /// Whether the groundedness prompt repeats the retrieved context
    pub evaluator_includes_context: bool,
    /// Limit for each model request attempt
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_id: crate::DEFAULT_MODEL_ID.to_string(),
            top_k: 4,
            temperature: 0.0,
            evaluator_includes_context: true,
            timeout: Duration::from_secs(60),
        }
    }
}

impl PipelineConfig {
    /// Request settings shared by the answer and evaluation calls
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.model_id.clone(),
            temperature: self.temperature,
            timeout: self.timeout,
            ..Default::default()
        }
    }
}
