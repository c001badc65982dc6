//! Retrieval-augmented question answering for DocQA
//!
//! This crate provides the pipeline stages, the pipeline executor, and the
//! vector index implementations the retriever reads from.

mod embedding;
mod evaluator;
mod generator;
mod normalizer;
mod pipeline;
mod prompts;
mod retriever;
mod vector_index;

#[cfg(test)]
mod test_support;

pub use embedding::{HashEmbedder, QueryEmbedder};
pub use evaluator::GroundednessEvaluator;
pub use generator::AnswerGenerator;
pub use normalizer::normalize;
pub use pipeline::RagPipeline;
pub use prompts::{answer_prompt, evaluation_prompt};
pub use retriever::Retriever;
pub use vector_index::{LocalVectorIndex, QdrantVectorIndex};

// Re-export core types for convenience
pub use docqa_core::{
    Answer, Error, LLMProvider, PipelineConfig, PipelineState, Result, SourceRef, Verdict,
    VectorIndex,
};
