//! Query embedding for vector databases

use std::fmt;

/// Turns a query into the vector used to search a collection
///
/// Must match the embedding the collection was ingested with.
pub trait QueryEmbedder: Send + Sync + fmt::Debug {
    fn embed(&self, text: &str) -> Vec<f32>;

    fn dimension(&self) -> usize;
}

/// Deterministic md5-hashed bag-of-words embedding
///
/// Each word adds a position-weighted count to the bucket its hash falls
/// in, longer words also feed a secondary bucket and adjacent word pairs a
/// third. The vector is L2-normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

impl QueryEmbedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let words = tokenize(text);
        let mut embedding = vec![0.0f32; self.dimension];

        for (i, word) in words.iter().enumerate() {
            let hash = token_hash(word);
            let weight = 1.0 / (1.0 + i as f32 * 0.1);
            embedding[(hash as usize) % self.dimension] += weight;

            if word.len() > 3 {
                embedding[((hash >> 16) as usize) % self.dimension] += weight * 0.5;
            }
        }

        for pair in words.windows(2) {
            let hash = token_hash(&format!("{} {}", pair[0], pair[1]));
            embedding[(hash as usize) % self.dimension] += 0.3;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        embedding
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Lowercased alphanumeric words of `text`
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

fn token_hash(token: &str) -> u64 {
    let digest = md5::compute(token.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("What's the REFUND policy?"),
            vec!["what", "s", "the", "refund", "policy"]
        );
        assert!(tokenize("  ?! ").is_empty());
    }

    #[test]
    fn test_embedding_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::default();

        let first = embedder.embed("Refunds are accepted within 30 days");
        let second = embedder.embed("Refunds are accepted within 30 days");

        assert_eq!(first, second);
        assert_eq!(first.len(), 384);
        assert!((cosine(&first, &first) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_similar_text_scores_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("refund policy");

        let related = embedder.embed("the refund policy allows returns");
        let unrelated = embedder.embed("shipping takes five business days");

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(8);
        assert_eq!(embedder.embed(""), vec![0.0; 8]);
        assert_eq!(HashEmbedder::new(0).dimension(), 1);
    }
}
