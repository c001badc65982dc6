//! Prompt templates for answer generation and groundedness evaluation
//!
//! Both templates are pure functions of their inputs so that a fixed
//! `(query, context)` pair always produces the same request.

use docqa_core::NOT_FOUND_SENTINEL;

/// Marker the evaluation prompt ends with
pub const VERDICT_INSTRUCTION: &str = "Reply with only YES or NO.";

/// Prompt asking the model to answer strictly from the retrieved passages
pub fn answer_prompt(query: &str, context: &[String]) -> String {
    format!(
        "Answer strictly from the context.\n\
         If the answer is not present, say \"{}\".\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question:\n\
         {}",
        NOT_FOUND_SENTINEL,
        context.join("\n"),
        query
    )
}

/// Prompt asking the model whether `answer` is supported
///
/// With `context` set, the retrieved passages are repeated so the judgement
/// does not depend on anything outside this request.
pub fn evaluation_prompt(query: &str, answer: &str, context: Option<&[String]>) -> String {
    let mut prompt = String::new();

    if let Some(context) = context {
        prompt.push_str("Context:\n");
        prompt.push_str(&context.join("\n"));
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!(
        "Question: {}\n\
         Answer: {}\n\
         \n\
         Is the answer grounded in the context?\n\
         {}",
        query, answer, VERDICT_INSTRUCTION
    ));

    prompt
}
