//! Pipeline configuration.
//!
//! [`PipelineConfig`] gathers every tunable the pipeline reads: chunk
//! sizes/overlaps, retrieval fan-out, and the on-disk paths for the parent
//! snapshot and the vector index. Defaults mirror the values the retrieval
//! strategy was tuned with; `HAYLOFT_*` environment variables (optionally via
//! a `.env` file) override them.

use std::env;
use std::path::PathBuf;

use crate::types::PipelineError;

/// Size and overlap parameters for the two-level split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingParams {
    /// Maximum parent chunk length, in characters.
    pub parent_size: usize,
    /// Characters shared between consecutive parent windows.
    pub parent_overlap: usize,
    /// Maximum child chunk length, in characters.
    pub child_size: usize,
    /// Characters shared between consecutive child windows.
    pub child_overlap: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            parent_size: 2000,
            parent_overlap: 200,
            child_size: 400,
            child_overlap: 50,
        }
    }
}

impl ChunkingParams {
    /// Rejects parameter combinations that cannot produce a terminating
    /// split. Called before any chunk is created.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.parent_size == 0 || self.child_size == 0 {
            return Err(PipelineError::ChunkingConfig(
                "chunk sizes must be positive".into(),
            ));
        }
        if self.parent_overlap >= self.parent_size {
            return Err(PipelineError::ChunkingConfig(format!(
                "parent overlap {} must be smaller than parent size {}",
                self.parent_overlap, self.parent_size
            )));
        }
        if self.child_overlap >= self.child_size {
            return Err(PipelineError::ChunkingConfig(format!(
                "child overlap {} must be smaller than child size {}",
                self.child_overlap, self.child_size
            )));
        }
        Ok(())
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunking: ChunkingParams,
    /// Child candidates fetched per question.
    pub retrieval_k: usize,
    /// Parents kept after reranking.
    pub rerank_top_n: usize,
    /// SQLite file backing the child vector index.
    pub index_path: PathBuf,
    /// JSON snapshot file backing the parent store.
    pub parent_store_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingParams::default(),
            retrieval_k: 10,
            rerank_top_n: 5,
            index_path: PathBuf::from("corpus_index.sqlite"),
            parent_store_path: PathBuf::from("parent_store.json"),
        }
    }
}

impl PipelineConfig {
    /// Builds a configuration from defaults plus `HAYLOFT_*` environment
    /// overrides. A `.env` file in the working directory is honored.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut cfg = Self::default();
        if let Some(value) = env_usize("HAYLOFT_PARENT_CHUNK_SIZE") {
            cfg.chunking.parent_size = value;
        }
        if let Some(value) = env_usize("HAYLOFT_PARENT_CHUNK_OVERLAP") {
            cfg.chunking.parent_overlap = value;
        }
        if let Some(value) = env_usize("HAYLOFT_CHILD_CHUNK_SIZE") {
            cfg.chunking.child_size = value;
        }
        if let Some(value) = env_usize("HAYLOFT_CHILD_CHUNK_OVERLAP") {
            cfg.chunking.child_overlap = value;
        }
        if let Some(value) = env_usize("HAYLOFT_RETRIEVAL_K") {
            cfg.retrieval_k = value;
        }
        if let Some(value) = env_usize("HAYLOFT_RERANK_TOP_N") {
            cfg.rerank_top_n = value;
        }
        if let Ok(path) = env::var("HAYLOFT_INDEX_PATH") {
            cfg.index_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("HAYLOFT_PARENT_STORE_PATH") {
            cfg.parent_store_path = PathBuf::from(path);
        }
        cfg
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.chunking.parent_size, 2000);
        assert_eq!(cfg.chunking.parent_overlap, 200);
        assert_eq!(cfg.chunking.child_size, 400);
        assert_eq!(cfg.chunking.child_overlap, 50);
        assert_eq!(cfg.retrieval_k, 10);
        assert_eq!(cfg.rerank_top_n, 5);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let params = ChunkingParams {
            parent_size: 100,
            parent_overlap: 100,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PipelineError::ChunkingConfig(_))
        ));

        let params = ChunkingParams {
            child_size: 50,
            child_overlap: 80,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PipelineError::ChunkingConfig(_))
        ));
    }

    #[test]
    fn zero_size_is_rejected() {
        let params = ChunkingParams {
            parent_size: 0,
            parent_overlap: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
