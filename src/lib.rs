//! Grounded question answering over a private document corpus.
//!
//! Documents are split into a two-level hierarchy: large *parent* chunks
//! that preserve context and small *child* chunks that search well. Children
//! are embedded and indexed; parents are persisted verbatim. A question
//! retrieves children, swaps them for their parents, reranks, and hands the
//! winning context to a generation model that is constrained to answer only
//! from it.
//!
//! ```text
//! PDF bytes ──► services::extract ──► chunking::split_hierarchy
//!                                        │
//!                        parents ◄───────┴───────► children
//!                           │                         │
//!                  stores::ParentStore       stores::SqliteVectorIndex
//!                  (JSON snapshot,           (sqlite-vec embeddings)
//!                   atomic persist)                   │
//!                           │                         ▼
//! question ─────────────────┴──────────► pipeline::Pipeline::answer
//!                                        search → parents → rerank →
//!                                        grounded generation (temp 0)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hayloft::pipeline::Pipeline;
//! use hayloft::services::{
//!     LexicalOverlapReranker, MockEmbeddingProvider, PlainTextExtractor,
//!     StaticCompletionProvider,
//! };
//!
//! let pipeline = Pipeline::builder()
//!     .embedder(Arc::new(MockEmbeddingProvider::new()))
//!     .reranker(Arc::new(LexicalOverlapReranker::new()))
//!     .completion(Arc::new(StaticCompletionProvider::new("grounded answer")))
//!     .extractor(Arc::new(PlainTextExtractor::new()))
//!     .build()
//!     .await?;
//!
//! pipeline.ingest_text("the corpus text").await?;
//! let answer = pipeline.answer("a question about the corpus").await;
//! println!("{}", answer.into_text());
//! ```

pub mod chunking;
pub mod config;
pub mod pipeline;
pub mod services;
pub mod stores;
pub mod types;

pub use chunking::{ChildChunk, ChunkHierarchy, ParentChunk, split_hierarchy};
pub use config::{ChunkingParams, PipelineConfig};
pub use pipeline::{IngestReport, Pipeline, PipelineBuilder, INSUFFICIENT_INFORMATION};
pub use types::{Answer, PipelineError, NO_DOCUMENTS_MESSAGE};
