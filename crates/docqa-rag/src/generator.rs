//! Answer generation constrained to the retrieved context

use std::sync::Arc;

use tracing::{error, info};

use docqa_core::{Answer, ChatMessage, GenerationConfig, LLMProvider, PipelineState};

use crate::prompts;

/// Produces the answer from `query` and `context`
///
/// Never fails: a completion error becomes [`Answer::Failed`] so that later
/// stages and the caller always receive a complete state.
pub struct AnswerGenerator<L: LLMProvider + ?Sized> {
    llm: Arc<L>,
    config: GenerationConfig,
}

impl<L: LLMProvider + ?Sized> AnswerGenerator<L> {
    pub fn new(llm: Arc<L>, config: GenerationConfig) -> Self {
        Self { llm, config }
    }

    pub async fn generate(&self, state: PipelineState) -> PipelineState {
        info!(passages = state.context().len(), "Answer generator");

        let prompt = prompts::answer_prompt(state.query(), state.context());
        let messages = [ChatMessage::user(prompt)];

        let answer = match self.llm.complete(&messages, &self.config).await {
            Ok(result) => Answer::from_reply(&result.text),
            Err(e) => {
                error!(error = %e, "Answer generation failed");
                Answer::Failed(e.to_string())
            }
        };

        state.with_answer(answer)
    }
}
