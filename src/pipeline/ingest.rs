//! Ingestion: raw document to persisted parents and indexed children.

use tracing::{info, instrument};

use super::Pipeline;
use crate::chunking::split_hierarchy;
use crate::types::PipelineError;

/// Counts returned from one ingestion for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub parents: usize,
    pub children: usize,
}

impl Pipeline {
    /// Ingests a raw document (PDF bytes, per the configured extractor).
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub async fn ingest_document(&self, bytes: &[u8]) -> Result<IngestReport, PipelineError> {
        let text = self.extractor.extract(bytes).await?;
        self.ingest_text(&text).await
    }

    /// Ingests already-extracted text.
    ///
    /// Parents are written and persisted before any child is indexed, so a
    /// failure partway never leaves children pointing at parents that were
    /// not made durable. Errors propagate typed to the caller; the stores
    /// are left in their pre-call or fully committed state.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn ingest_text(&self, text: &str) -> Result<IngestReport, PipelineError> {
        let _write = self.gate.write().await;

        let hierarchy = split_hierarchy(text, &self.config.chunking)?;
        if hierarchy.is_empty() {
            info!("document produced no chunks, nothing to ingest");
            return Ok(IngestReport {
                parents: 0,
                children: 0,
            });
        }

        let report = IngestReport {
            parents: hierarchy.parents.len(),
            children: hierarchy.children.len(),
        };

        self.parents.insert_all(hierarchy.parents);
        self.parents.persist().await?;
        self.index
            .index_children(&hierarchy.children, self.embedder.as_ref())
            .await?;

        info!(
            parents = report.parents,
            children = report.children,
            "ingestion complete"
        );
        Ok(report)
    }
}
