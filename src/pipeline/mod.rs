//! The retrieval-augmentation pipeline.
//!
//! [`Pipeline`] is the application context object: it owns the parent
//! store, the vector index, the external collaborators, and the
//! configuration, and exposes the two entry points the outer surface
//! needs:
//!
//! ```text
//! ingest: bytes ─► extract ─► split (parents, children)
//!                      parents ─► ParentStore (persist first)
//!                      children ─► SqliteVectorIndex
//!
//! answer: question ─► search top-K children ─► unique parents
//!         (first-seen order) ─► rerank ─► top-N context ─► grounded
//!         generation at temperature 0
//! ```
//!
//! Ingestion is a write path and holds the exclusive half of the pipeline
//! lock; questions only read and run concurrently under the shared half.

pub mod ingest;
pub mod prompt;
pub mod retrieve;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::PipelineConfig;
use crate::services::{CompletionProvider, EmbeddingProvider, Reranker, TextExtractor};
use crate::stores::{ParentStore, SqliteVectorIndex};
use crate::types::PipelineError;

pub use ingest::IngestReport;
pub use prompt::INSUFFICIENT_INFORMATION;

/// Owns the stores, collaborators, and configuration for one corpus.
pub struct Pipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) parents: ParentStore,
    pub(crate) index: SqliteVectorIndex,
    pub(crate) embedder: Arc<dyn EmbeddingProvider>,
    pub(crate) reranker: Arc<dyn Reranker>,
    pub(crate) completion: Arc<dyn CompletionProvider>,
    pub(crate) extractor: Arc<dyn TextExtractor>,
    /// Write half serializes ingestion; read half admits any number of
    /// concurrent questions.
    pub(crate) gate: RwLock<()>,
}

impl Pipeline {
    /// Starts building a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of parents currently stored.
    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// Number of children currently indexed.
    pub async fn child_count(&self) -> Result<usize, PipelineError> {
        self.index.count().await
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    reranker: Option<Arc<dyn Reranker>>,
    completion: Option<Arc<dyn CompletionProvider>>,
    extractor: Option<Arc<dyn TextExtractor>>,
}

impl PipelineBuilder {
    /// Overrides the default configuration.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    #[must_use]
    pub fn completion(mut self, completion: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(completion);
        self
    }

    #[must_use]
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Opens the stores and assembles the pipeline.
    ///
    /// Validates the chunking parameters up front so a misconfigured
    /// pipeline fails at construction, not mid-ingest.
    ///
    /// # Panics
    ///
    /// Panics if any collaborator was not supplied.
    pub async fn build(self) -> Result<Pipeline, PipelineError> {
        let config = self.config.unwrap_or_default();
        config.chunking.validate()?;

        let embedder = self.embedder.expect("PipelineBuilder requires an embedder");
        let reranker = self.reranker.expect("PipelineBuilder requires a reranker");
        let completion = self
            .completion
            .expect("PipelineBuilder requires a completion provider");
        let extractor = self
            .extractor
            .expect("PipelineBuilder requires a text extractor");

        let parents = ParentStore::open(&config.parent_store_path).await?;
        let index = SqliteVectorIndex::open(&config.index_path, embedder.dims()).await?;

        Ok(Pipeline {
            config,
            parents,
            index,
            embedder,
            reranker,
            completion,
            extractor,
            gate: RwLock::new(()),
        })
    }
}
