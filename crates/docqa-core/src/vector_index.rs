//! Vector index trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Provenance of a passage as recorded by the ingestion pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// File name of the source PDF
    #[serde(rename = "source", default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

/// A passage returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    #[serde(default)]
    pub metadata: PassageMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl RetrievedPassage {
    pub fn new(content: impl Into<String>, document_id: impl Into<String>, page: u32) -> Self {
        Self {
            content: content.into(),
            metadata: PassageMetadata {
                document_id: Some(document_id.into()),
                page: Some(page),
            },
            score: None,
        }
    }
}

/// Trait for pre-populated vector indexes (e.g., Qdrant, a local snapshot, etc.)
///
/// The pipeline only ever reads from an index. Results are ordered by
/// descending similarity and hold at most `k` passages.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `k` passages most similar to `query`
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>>;

    /// Get the total number of passages in the index
    async fn count(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_metadata_uses_ingestion_keys() {
        let json = r#"{"content": "Refunds within 30 days", "metadata": {"source": "policy.pdf", "page": 3}}"#;
        let passage: RetrievedPassage = serde_json::from_str(json).unwrap();

        assert_eq!(passage, RetrievedPassage::new("Refunds within 30 days", "policy.pdf", 3));
    }

    #[test]
    fn test_missing_metadata_stays_unset() {
        let passage: RetrievedPassage = serde_json::from_str(r#"{"content": "orphan"}"#).unwrap();

        assert_eq!(passage.metadata, PassageMetadata::default());
        assert_eq!(passage.score, None);
    }
}
