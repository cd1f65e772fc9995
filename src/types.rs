//! Shared error and outcome types for the retrieval pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the ingestion and retrieval pipeline.
///
/// Ingestion-path errors propagate to the caller; query-path errors are
/// caught inside [`crate::pipeline::Pipeline::answer`] and folded into
/// [`Answer::Failed`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source document bytes could not be turned into text.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// Invalid chunk size/overlap parameters, rejected before any splitting.
    #[error("invalid chunking parameters: {0}")]
    ChunkingConfig(String),

    /// Parent store read/write failure.
    #[error("parent store failure: {0}")]
    Store(String),

    /// Embedding or vector index failure.
    #[error("vector index failure: {0}")]
    Index(String),

    /// The reranking service failed.
    #[error("rerank failure: {0}")]
    Rerank(String),

    /// The generation service failed.
    #[error("generation failure: {0}")]
    Generation(String),

    /// An external service call exceeded its deadline.
    #[error("{service} call exceeded {secs}s deadline")]
    Timeout { service: &'static str, secs: u64 },

    /// HTTP transport failure talking to an external service.
    #[error("http transport failure: {0}")]
    Http(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Http(err.to_string())
    }
}

/// Fixed response when a question matches nothing in the corpus.
pub const NO_DOCUMENTS_MESSAGE: &str = "I couldn't find any relevant documents.";

/// Outcome of answering a single question.
///
/// Distinguishes "nothing matched" from "answered" from "a collaborator
/// failed" so callers can react without parsing strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// No matched child resolved to a stored parent; reranking and
    /// generation were skipped.
    NoDocuments,
    /// A grounded answer, with the parent chunks it was generated from.
    Answered {
        text: String,
        /// Parent ids that supplied the context, in reranked order.
        sources: Vec<Uuid>,
    },
    /// A collaborator failed; the message is safe to show the user.
    Failed(String),
}

impl Answer {
    /// Renders the user-facing text for this outcome.
    pub fn into_text(self) -> String {
        match self {
            Answer::NoDocuments => NO_DOCUMENTS_MESSAGE.to_string(),
            Answer::Answered { text, .. } => text,
            Answer::Failed(message) => format!("An error occurred: {message}"),
        }
    }

    /// Returns `true` for [`Answer::Answered`].
    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self, Answer::Answered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_documents_renders_fixed_message() {
        assert_eq!(Answer::NoDocuments.into_text(), NO_DOCUMENTS_MESSAGE);
    }

    #[test]
    fn failure_renders_error_prefix() {
        let text = Answer::Failed("reranker unreachable".into()).into_text();
        assert!(text.starts_with("An error occurred:"));
        assert!(text.contains("reranker unreachable"));
    }
}
