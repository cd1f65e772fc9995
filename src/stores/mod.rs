//! Storage for the two halves of the chunk hierarchy.
//!
//! ```text
//! ingestion ──► ParentStore (keyed JSON snapshot, atomic persist)
//!           └─► SqliteVectorIndex (child text + sqlite-vec embeddings)
//!
//! retrieval ──► SqliteVectorIndex.search ──► parent ids
//!           └─► ParentStore.get ──► full parent text
//! ```
//!
//! The parent store is the single source of truth for parent text; the
//! vector index stores only child text plus the `parent_id` needed to
//! resolve it. Both are append-only in this design.

pub mod parent;
pub mod sqlite;

pub use parent::ParentStore;
pub use sqlite::SqliteVectorIndex;
