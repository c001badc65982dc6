//! Pipeline executor
//!
//! Runs the four stages in a fixed order, each exactly once per query:
//! input normalizer, retriever, answer generator, groundedness evaluator.

use std::sync::Arc;

use tracing::{Instrument, info, info_span};

use docqa_core::{LLMProvider, PipelineConfig, PipelineState, Result, VectorIndex};

use crate::evaluator::GroundednessEvaluator;
use crate::generator::AnswerGenerator;
use crate::normalizer;
use crate::retriever::Retriever;

/// Question-answering pipeline over a document index
pub struct RagPipeline<L: LLMProvider + ?Sized, V: VectorIndex + ?Sized> {
    retriever: Retriever<V>,
    generator: AnswerGenerator<L>,
    evaluator: GroundednessEvaluator<L>,
}

impl<L: LLMProvider + ?Sized, V: VectorIndex + ?Sized> RagPipeline<L, V> {
    /// Wire the stages; the same model serves generation and evaluation
    pub fn new(llm: Arc<L>, index: Arc<V>, config: PipelineConfig) -> Self {
        let generation = config.generation_config();

        Self {
            retriever: Retriever::new(index, config.top_k),
            generator: AnswerGenerator::new(llm.clone(), generation.clone()),
            evaluator: GroundednessEvaluator::new(llm, generation, config.evaluator_includes_context),
        }
    }

    /// Answer `query` and judge the answer
    ///
    /// Model failures are contained in the returned state. Only index
    /// failures are returned as errors.
    pub async fn run(&self, query: &str) -> Result<PipelineState> {
        let span = info_span!("pipeline", query = %query);
        self.run_stages(query).instrument(span).await
    }

    async fn run_stages(&self, query: &str) -> Result<PipelineState> {
        let state = normalizer::normalize(query);
        let state = self.retriever.retrieve(state).await?;
        let state = self.generator.generate(state).await;
        let state = self.evaluator.evaluate(state).await;

        info!(
            passages = state.context().len(),
            evaluation = %state.evaluation_text(),
            "Pipeline finished"
        );
        Ok(state)
    }
}
