//! Passage retrieval from the vector index

use std::sync::Arc;

use tracing::{debug, info};

use docqa_core::{PipelineState, Result, VectorIndex};

/// Fetches the passages most similar to the query
///
/// Index failures are returned to the caller untouched: an unreachable or
/// corrupt index is a deployment fault and ends the run.
pub struct Retriever<V: VectorIndex + ?Sized> {
    index: Arc<V>,
    top_k: usize,
}

impl<V: VectorIndex + ?Sized> Retriever<V> {
    pub fn new(index: Arc<V>, top_k: usize) -> Self {
        Self { index, top_k }
    }

    /// Populate `context` and `sources`, in the order the index ranked them
    pub async fn retrieve(&self, state: PipelineState) -> Result<PipelineState> {
        info!(top_k = self.top_k, "Retriever");

        let passages = self.index.similarity_search(state.query(), self.top_k).await?;
        debug!(retrieved = passages.len(), "Passages retrieved");

        Ok(state.with_passages(passages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubIndex;
    use docqa_core::{Error, RetrievedPassage, SourceRef};

    #[tokio::test]
    async fn test_retrieve_keeps_index_order() {
        let index = Arc::new(StubIndex::new(vec![
            RetrievedPassage::new("P3", "doc.pdf", 3),
            RetrievedPassage::new("P1", "doc.pdf", 1),
            RetrievedPassage::new("P2", "doc.pdf", 2),
        ]));
        let retriever = Retriever::new(index.clone(), 4);

        let state = retriever.retrieve(PipelineState::new("q")).await.unwrap();

        assert_eq!(state.context(), ["P3", "P1", "P2"]);
        assert_eq!(
            state.sources(),
            [
                SourceRef::new("doc.pdf", 3),
                SourceRef::new("doc.pdf", 1),
                SourceRef::new("doc.pdf", 2),
            ]
        );
        assert_eq!(index.searches(), vec![("q".to_string(), 4)]);
    }

    #[tokio::test]
    async fn test_retrieve_propagates_index_failure() {
        let retriever = Retriever::new(Arc::new(StubIndex::failing()), 4);

        let result = retriever.retrieve(PipelineState::new("q")).await;

        assert!(matches!(result, Err(Error::VectorIndex(_))));
    }
}
