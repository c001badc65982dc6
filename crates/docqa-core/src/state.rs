//! Pipeline state threaded through the question-answering stages
//!
//! A [`PipelineState`] is created fresh for every query and moved from stage
//! to stage. Stages never mutate a shared record: each one consumes the state
//! and returns a new value built with one of the `with_*` constructors, which
//! only touch the fields owned by that stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PassageMetadata, RetrievedPassage};

/// Reply the answer prompt asks for when the context has no answer
pub const NOT_FOUND_SENTINEL: &str = "Not found in documents";

/// Prefix of the answer text produced when generation fails
pub const ANSWER_ERROR_PREFIX: &str = "Error generating answer";

/// Where a retrieved passage came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub document_id: Option<String>,
    pub page: Option<u32>,
}

impl SourceRef {
    pub fn new(document_id: impl Into<String>, page: u32) -> Self {
        Self {
            document_id: Some(document_id.into()),
            page: Some(page),
        }
    }
}

impl From<PassageMetadata> for SourceRef {
    fn from(metadata: PassageMetadata) -> Self {
        Self {
            document_id: metadata.document_id,
            page: metadata.page,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let document = self.document_id.as_deref().unwrap_or("unknown document");
        match self.page {
            Some(page) => write!(f, "{}, page {}", document, page),
            None => write!(f, "{}", document),
        }
    }
}

/// Outcome of answer generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Answer {
    /// Answer text produced from the retrieved context
    Generated(String),
    /// The model reported that the documents do not contain an answer
    NotFound,
    /// The completion service failed; carries the failure detail
    Failed(String),
}

impl Answer {
    /// Interpret a raw model reply
    ///
    /// The sentinel matches ignoring case, surrounding quotes and a trailing
    /// period, so `"Not found in documents."` is [`Answer::NotFound`].
    pub fn from_reply(reply: &str) -> Self {
        let text = reply.trim();
        let bare = text.trim_matches('"').trim_end_matches('.');
        if bare.eq_ignore_ascii_case(NOT_FOUND_SENTINEL) {
            Answer::NotFound
        } else {
            Answer::Generated(text.to_string())
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Answer::Failed(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Generated(text) => f.write_str(text),
            Answer::NotFound => f.write_str(NOT_FOUND_SENTINEL),
            Answer::Failed(detail) => write!(f, "{}: {}", ANSWER_ERROR_PREFIX, detail),
        }
    }
}

/// Groundedness verdict of the evaluation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reply", rename_all = "snake_case")]
pub enum Verdict {
    Yes,
    No,
    /// The model replied with something other than YES or NO; kept verbatim
    Unrecognized(String),
    /// The completion service failed
    Error,
}

impl Verdict {
    /// Interpret a raw model reply, ignoring case and trailing punctuation
    pub fn from_reply(reply: &str) -> Self {
        let text = reply.trim();
        let word = text.trim_end_matches(['.', '!']);
        if word.eq_ignore_ascii_case("YES") {
            Verdict::Yes
        } else if word.eq_ignore_ascii_case("NO") {
            Verdict::No
        } else {
            Verdict::Unrecognized(text.to_string())
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Yes => f.write_str("YES"),
            Verdict::No => f.write_str("NO"),
            Verdict::Unrecognized(reply) => f.write_str(reply),
            Verdict::Error => f.write_str("ERROR"),
        }
    }
}

/// State of a single pipeline run
///
/// `context` and `sources` are only ever set together from the same passage
/// list, so they always have the same length and order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineState {
    query: String,
    context: Vec<String>,
    sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<Answer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluation: Option<Verdict>,
}

impl PipelineState {
    /// A clean state holding only the query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: Vec::new(),
            sources: Vec::new(),
            answer: None,
            evaluation: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Retrieved passage texts, most relevant first
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Provenance of each entry of [`Self::context`], same order
    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }

    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    pub fn evaluation(&self) -> Option<&Verdict> {
        self.evaluation.as_ref()
    }

    /// Replace context and sources with the given passages, keeping their order
    pub fn with_passages(self, passages: Vec<RetrievedPassage>) -> Self {
        let (context, sources) = passages
            .into_iter()
            .map(|passage| (passage.content, SourceRef::from(passage.metadata)))
            .unzip();

        Self {
            context,
            sources,
            ..self
        }
    }

    pub fn with_answer(self, answer: Answer) -> Self {
        Self {
            answer: Some(answer),
            ..self
        }
    }

    pub fn with_evaluation(self, evaluation: Verdict) -> Self {
        Self {
            evaluation: Some(evaluation),
            ..self
        }
    }

    /// Answer as shown to the user
    pub fn answer_text(&self) -> String {
        self.answer
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "No answer generated".to_string())
    }

    /// Evaluation as shown to the user
    pub fn evaluation_text(&self) -> String {
        self.evaluation
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "N/A".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_clean() {
        let state = PipelineState::new("What is the refund policy?");

        assert_eq!(state.query(), "What is the refund policy?");
        assert!(state.context().is_empty());
        assert!(state.sources().is_empty());
        assert!(state.answer().is_none());
        assert!(state.evaluation().is_none());
    }

    #[test]
    fn test_with_passages_keeps_alignment_and_order() {
        let passages = vec![
            RetrievedPassage::new("P3", "c.pdf", 3),
            RetrievedPassage {
                content: "P1".to_string(),
                metadata: PassageMetadata::default(),
                score: Some(0.5),
            },
            RetrievedPassage::new("P2", "b.pdf", 2),
        ];

        let state = PipelineState::new("q").with_passages(passages);

        assert_eq!(state.context(), ["P3", "P1", "P2"]);
        assert_eq!(state.sources().len(), state.context().len());
        assert_eq!(state.sources()[0], SourceRef::new("c.pdf", 3));
        assert_eq!(state.sources()[1].document_id, None);
        assert_eq!(state.sources()[1].page, None);
    }

    #[test]
    fn test_later_stages_leave_earlier_fields_untouched() {
        let state = PipelineState::new("q")
            .with_passages(vec![RetrievedPassage::new("text", "a.pdf", 1)])
            .with_answer(Answer::Generated("a".into()))
            .with_evaluation(Verdict::Yes);

        assert_eq!(state.query(), "q");
        assert_eq!(state.context(), ["text"]);
        assert_eq!(state.answer(), Some(&Answer::Generated("a".into())));
        assert_eq!(state.evaluation(), Some(&Verdict::Yes));
    }

    #[test]
    fn test_answer_from_reply() {
        assert_eq!(
            Answer::from_reply("  Refunds are allowed within 30 days.\n"),
            Answer::Generated("Refunds are allowed within 30 days.".into())
        );
        assert_eq!(Answer::from_reply("Not found in documents"), Answer::NotFound);
        assert_eq!(Answer::from_reply("\"Not found in documents.\""), Answer::NotFound);
        assert_eq!(Answer::from_reply("not found in documents."), Answer::NotFound);
        assert_eq!(Answer::NotFound.to_string(), NOT_FOUND_SENTINEL);
        assert_eq!(
            Answer::Failed("401 Unauthorized".into()).to_string(),
            "Error generating answer: 401 Unauthorized"
        );
    }

    #[test]
    fn test_verdict_from_reply() {
        assert_eq!(Verdict::from_reply("YES"), Verdict::Yes);
        assert_eq!(Verdict::from_reply(" no.\n"), Verdict::No);
        assert_eq!(Verdict::from_reply("Yes!"), Verdict::Yes);
        assert_eq!(
            Verdict::from_reply("Partially, see above"),
            Verdict::Unrecognized("Partially, see above".into())
        );
        assert_eq!(Verdict::Error.to_string(), "ERROR");
        assert_eq!(Verdict::Unrecognized("maybe".into()).to_string(), "maybe");
    }

    #[test]
    fn test_display_text_before_stages_run() {
        let state = PipelineState::new("q");
        assert_eq!(state.answer_text(), "No answer generated");
        assert_eq!(state.evaluation_text(), "N/A");
    }

    #[test]
    fn test_source_display() {
        assert_eq!(SourceRef::new("policy.pdf", 3).to_string(), "policy.pdf, page 3");
        let unknown = SourceRef {
            document_id: None,
            page: None,
        };
        assert_eq!(unknown.to_string(), "unknown document");
    }
}
