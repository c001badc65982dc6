//! Vector index implementations
//!
//! Both indexes are read-only views over passages produced by the ingestion
//! pipeline: a JSON snapshot held in memory, or an existing Qdrant collection.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{CountPointsBuilder, SearchPointsBuilder, Value};
use tracing::{debug, info};

use docqa_core::{Error, PassageMetadata, Result, RetrievedPassage, VectorIndex};

use crate::embedding::{QueryEmbedder, tokenize};

/// In-memory index over a passage snapshot
///
/// Passages are ranked by the share of query terms they contain. Equal
/// scores keep snapshot order.
#[derive(Debug, Clone)]
pub struct LocalVectorIndex {
    passages: Vec<IndexedPassage>,
}

#[derive(Debug, Clone)]
struct IndexedPassage {
    passage: RetrievedPassage,
    terms: HashSet<String>,
}

impl LocalVectorIndex {
    pub fn from_passages(passages: Vec<RetrievedPassage>) -> Self {
        let passages = passages
            .into_iter()
            .map(|passage| IndexedPassage {
                terms: tokenize(&passage.content).into_iter().collect(),
                passage,
            })
            .collect();

        Self { passages }
    }

    /// Load a snapshot of `[{content, metadata: {source, page}}]`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::VectorIndex(format!("Cannot read index snapshot {}: {}", path.display(), e))
        })?;

        let passages: Vec<RetrievedPassage> = serde_json::from_str(&raw).map_err(|e| {
            Error::VectorIndex(format!("Corrupt index snapshot {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), passages = passages.len(), "Loaded local index");
        Ok(Self::from_passages(passages))
    }
}

/// Share of distinct query terms present in the passage, in `[0, 1]`
fn term_overlap(query_terms: &HashSet<String>, passage_terms: &HashSet<String>) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }

    let shared = query_terms.intersection(passage_terms).count();
    shared as f32 / query_terms.len() as f32
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        let query_terms: HashSet<String> = tokenize(query).into_iter().collect();

        let mut scored: Vec<(f32, &IndexedPassage)> = self
            .passages
            .iter()
            .map(|indexed| (term_overlap(&query_terms, &indexed.terms), indexed))
            .collect();

        // Stable sort: ties stay in snapshot order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, indexed)| RetrievedPassage {
                score: Some(score),
                ..indexed.passage.clone()
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.passages.len())
    }
}

/// Index backed by an existing Qdrant collection
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection_name: String,
    embedder: Arc<dyn QueryEmbedder>,
}

impl QdrantVectorIndex {
    /// Connect to Qdrant; the collection must already be populated
    pub fn connect(
        url: &str,
        api_key: Option<String>,
        collection_name: impl Into<String>,
        embedder: Arc<dyn QueryEmbedder>,
    ) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder
            .build()
            .map_err(|e| Error::VectorIndex(format!("Cannot connect to Qdrant at {}: {}", url, e)))?;

        Ok(Self {
            client,
            collection_name: collection_name.into(),
            embedder,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query);
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(self.collection_name.as_str(), vector, k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| Error::VectorIndex(format!("Qdrant search failed: {}", e)))?;

        debug!(
            collection = %self.collection_name,
            hits = response.result.len(),
            "Qdrant search completed"
        );

        Ok(response
            .result
            .into_iter()
            .map(|point| passage_from_payload(point.payload, point.score))
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(self.collection_name.as_str()).exact(true))
            .await
            .map_err(|e| Error::VectorIndex(format!("Qdrant count failed: {}", e)))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

/// Build a passage from the `content`, `source` and `page` payload keys
fn passage_from_payload(payload: HashMap<String, Value>, score: f32) -> RetrievedPassage {
    let text = |key: &str| match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    };

    let page = match payload.get("page").and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(n)) => u32::try_from(*n).ok(),
        Some(Kind::DoubleValue(n)) if *n >= 0.0 => Some(*n as u32),
        Some(Kind::StringValue(s)) => s.trim().parse().ok(),
        _ => None,
    };

    RetrievedPassage {
        content: text("content").unwrap_or_default(),
        metadata: PassageMetadata {
            document_id: text("source"),
            page,
        },
        score: Some(score),
    }
}
