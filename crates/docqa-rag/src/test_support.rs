//! Stub model and index used by the pipeline tests

use std::sync::Mutex;

use async_trait::async_trait;

use docqa_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, Result, RetrievedPassage,
    VectorIndex,
};

use crate::prompts::VERDICT_INSTRUCTION;

/// One request seen by [`ScriptedLLM`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub model_id: String,
    pub temperature: f32,
}

/// Replies with fixed text to answer and evaluation prompts; `None` fails
pub struct ScriptedLLM {
    answer: Option<String>,
    verdict: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLLM {
    pub fn new(answer: impl Into<String>, verdict: impl Into<String>) -> Self {
        Self::scripted(Some(answer.into()), Some(verdict.into()))
    }

    pub fn failing() -> Self {
        Self::scripted(None, None)
    }

    pub fn scripted(answer: Option<String>, verdict: Option<String>) -> Self {
        Self {
            answer,
            verdict,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedLLM {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let reply = if prompt.ends_with(VERDICT_INSTRUCTION) {
            self.verdict.clone()
        } else {
            self.answer.clone()
        };

        self.calls.lock().unwrap().push(RecordedCall {
            prompt,
            model_id: config.model_id.clone(),
            temperature: config.temperature,
        });

        reply
            .map(|text| GenerationResult {
                text,
                model_id: config.model_id.clone(),
                tokens_used: None,
            })
            .ok_or_else(|| Error::Network("connection refused".to_string()))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Returns its passages in stored order, truncated to `k`
pub struct StubIndex {
    passages: Option<Vec<RetrievedPassage>>,
    searches: Mutex<Vec<(String, usize)>>,
}

impl StubIndex {
    pub fn new(passages: Vec<RetrievedPassage>) -> Self {
        Self {
            passages: Some(passages),
            searches: Mutex::new(Vec::new()),
        }
    }

    /// An index whose every search fails
    pub fn failing() -> Self {
        Self {
            passages: None,
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn searches(&self) -> Vec<(String, usize)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        self.searches.lock().unwrap().push((query.to_string(), k));

        match &self.passages {
            Some(passages) => Ok(passages.iter().take(k).cloned().collect()),
            None => Err(Error::VectorIndex("collection not found".to_string())),
        }
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.passages.as_ref().map_or(0, Vec::len))
    }
}
