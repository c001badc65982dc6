//! Core traits and types for DocQA
//!
//! This crate defines the fundamental traits and types used across the DocQA system.
//! It provides capability-facing interfaces for LLM providers and vector indexes,
//! plus the state record threaded through the question-answering pipeline, making
//! the system test-friendly and extensible.

pub mod error;
pub mod llm;
pub mod state;
pub mod types;
pub mod vector_index;

pub use error::{Error, Result};
pub use llm::{ChatMessage, DEFAULT_MODEL_ID, GenerationConfig, GenerationResult, LLMProvider, Role};
pub use state::{
    ANSWER_ERROR_PREFIX, Answer, NOT_FOUND_SENTINEL, PipelineState, SourceRef, Verdict,
};
pub use types::{PipelineConfig, RetryConfig};
pub use vector_index::{PassageMetadata, RetrievedPassage, VectorIndex};
