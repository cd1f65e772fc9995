//! External collaborator interfaces.
//!
//! The pipeline consumes every external service through a narrow trait:
//! text extraction, embedding, reranking, and generation. HTTP-backed
//! implementations live in the submodules; deterministic in-process
//! implementations (used by tests and the demo binary) live here so
//! downstream crates can exercise the full pipeline without network access.

pub mod completion;
pub mod embeddings;
pub mod extract;
pub mod rerank;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::PipelineError;

pub use completion::{HttpCompletionProvider, StaticCompletionProvider};
pub use embeddings::HttpEmbeddingProvider;
pub use extract::{PdfTextExtractor, PlainTextExtractor};
pub use rerank::{HttpReranker, LexicalOverlapReranker};

/// Turns raw document bytes into a single extracted text string, page order
/// preserved.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, PipelineError>;
}

/// Embeds text into fixed-length vectors.
///
/// The same provider must be used at index time and query time for
/// similarity to be meaningful.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Vector length produced by this provider.
    fn dims(&self) -> usize;

    /// Embeds each input text, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

/// A passage submitted for reranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub id: Uuid,
    pub text: String,
}

/// A passage annotated with a relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Second-pass relevance scoring over a small candidate set.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Returns the passages reordered by descending relevance, each with
    /// its score.
    async fn rerank(
        &self,
        query: &str,
        passages: Vec<Passage>,
    ) -> Result<Vec<ScoredPassage>, PipelineError>;
}

/// Text generation from a single prompt, decoded deterministically.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, PipelineError>;
}

/// Deterministic hash-derived embeddings for tests and demos.
///
/// Identical text always maps to the identical vector, so a query equal to
/// an indexed child is its own nearest neighbor.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dims: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dims: 8 }
    }

    pub fn with_dims(dims: usize) -> Self {
        Self { dims }
    }

    fn hash_to_vec(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dims)
            .map(|i| {
                let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
                (bits as f32) / u32::MAX as f32
            })
            .collect()
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts.iter().map(|text| self.hash_to_vec(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "Hello world".to_string(),
            "Goodbye world".to_string(),
            "Hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);
    }

    #[tokio::test]
    async fn mock_embeddings_have_declared_dims() {
        let provider = MockEmbeddingProvider::with_dims(16);
        let vectors = provider
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert!(vectors.iter().all(|vector| vector.len() == 16));
    }
}
