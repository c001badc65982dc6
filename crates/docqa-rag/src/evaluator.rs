//! Groundedness evaluation of the generated answer

use std::sync::Arc;

use tracing::{error, info, warn};

use docqa_core::{ChatMessage, GenerationConfig, LLMProvider, PipelineState, Verdict};

use crate::prompts;

/// Asks the model whether the answer is supported by the retrieved context
///
/// Never fails: a completion error becomes [`Verdict::Error`].
pub struct GroundednessEvaluator<L: LLMProvider + ?Sized> {
    llm: Arc<L>,
    config: GenerationConfig,
    include_context: bool,
}

impl<L: LLMProvider + ?Sized> GroundednessEvaluator<L> {
    pub fn new(llm: Arc<L>, config: GenerationConfig, include_context: bool) -> Self {
        Self {
            llm,
            config,
            include_context,
        }
    }

    pub async fn evaluate(&self, state: PipelineState) -> PipelineState {
        info!(include_context = self.include_context, "Groundedness evaluator");

        let answer = state.answer_text();
        let context = self.include_context.then(|| state.context());
        let prompt = prompts::evaluation_prompt(state.query(), &answer, context);
        let messages = [ChatMessage::user(prompt)];

        let verdict = match self.llm.complete(&messages, &self.config).await {
            Ok(result) => {
                let verdict = Verdict::from_reply(&result.text);
                if let Verdict::Unrecognized(reply) = &verdict {
                    warn!(reply = %reply, "Evaluator replied with neither YES nor NO");
                }
                verdict
            }
            Err(e) => {
                error!(error = %e, "Groundedness evaluation failed");
                Verdict::Error
            }
        };

        state.with_evaluation(verdict)
    }
}
