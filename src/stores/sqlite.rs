//! SQLite-backed vector index for child chunks.
//!
//! Child text and metadata live in a plain `children` table; embeddings
//! live in a `vec0` virtual table provided by the `sqlite-vec` extension,
//! joined by rowid. Nearest-neighbor search uses cosine distance. The index
//! is append-only: this design has no update or delete path.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use tokio_rusqlite::{Connection, ffi, rusqlite};
use tracing::info;
use uuid::Uuid;

use crate::chunking::ChildChunk;
use crate::services::EmbeddingProvider;
use crate::types::PipelineError;

/// Vector index over child chunks, delegating embedding to an
/// [`EmbeddingProvider`].
pub struct SqliteVectorIndex {
    conn: Connection,
    dims: usize,
}

impl SqliteVectorIndex {
    /// Opens (or creates) the index at `path` with `dims`-length vectors.
    pub async fn open(path: impl AsRef<Path>, dims: usize) -> Result<Self, PipelineError> {
        register_sqlite_vec()?;

        let conn = Connection::open(path)
            .await
            .map_err(|err| PipelineError::Index(err.to_string()))?;

        // Fail fast if the extension did not load.
        conn.call(|conn| {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
        })
        .await
        .map_err(|err| PipelineError::Index(err.to_string()))?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS children (
                    parent_id TEXT NOT NULL,
                    chunk_index INTEGER NOT NULL,
                    content TEXT NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_children_parent ON children(parent_id)",
                [],
            )?;
            conn.execute(
                &format!(
                    "CREATE VIRTUAL TABLE IF NOT EXISTS children_embeddings \
                     USING vec0(embedding float[{dims}])"
                ),
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| PipelineError::Index(err.to_string()))?;

        Ok(Self { conn, dims })
    }

    /// Embeds and stores a batch of children transactionally.
    ///
    /// Either every child in the batch becomes searchable or none does.
    pub async fn index_children(
        &self,
        children: &[ChildChunk],
        embedder: &dyn EmbeddingProvider,
    ) -> Result<usize, PipelineError> {
        if children.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = children.iter().map(|child| child.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != children.len() {
            return Err(PipelineError::Index(format!(
                "embedding service returned {} vectors for {} chunks",
                vectors.len(),
                children.len()
            )));
        }

        let mut rows = Vec::with_capacity(children.len());
        for (child, vector) in children.iter().zip(vectors) {
            if vector.len() != self.dims {
                return Err(PipelineError::Index(format!(
                    "embedding dimension {} does not match index dimension {}",
                    vector.len(),
                    self.dims
                )));
            }
            let encoded = serde_json::to_string(&vector)
                .map_err(|err| PipelineError::Index(err.to_string()))?;
            rows.push((
                child.parent_id.to_string(),
                child.index as i64,
                child.text.clone(),
                encoded,
            ));
        }

        let inserted = rows.len();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for (parent_id, chunk_index, content, embedding) in rows {
                    tx.execute(
                        "INSERT INTO children (parent_id, chunk_index, content) VALUES (?, ?, ?)",
                        (&parent_id, chunk_index, &content),
                    )?;
                    let rowid = tx.last_insert_rowid();
                    tx.execute(
                        "INSERT INTO children_embeddings (rowid, embedding) VALUES (?, ?)",
                        (rowid, &embedding),
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err| PipelineError::Index(err.to_string()))?;

        info!(children = inserted, "indexed child chunks");
        Ok(inserted)
    }

    /// Embeds `query` and returns the `k` most similar children,
    /// most-similar first. Ties are broken by insertion order. `k` beyond
    /// the index size returns everything stored.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<(ChildChunk, f32)>, PipelineError> {
        if k == 0 {
            return Err(PipelineError::Index("search requires k > 0".into()));
        }

        let mut vectors = embedder.embed_batch(&[query.to_string()]).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| PipelineError::Index("embedding service returned no vector".into()))?;
        let encoded = serde_json::to_string(&vector)
            .map_err(|err| PipelineError::Index(err.to_string()))?;

        let raw_rows = self
            .conn
            .call(move |conn| -> Result<Vec<(String, i64, String, f32)>, rusqlite::Error> {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT c.parent_id, c.chunk_index, c.content, \
                                vec_distance_cosine(e.embedding, vec_f32(?)) AS distance \
                         FROM children c \
                         JOIN children_embeddings e ON e.rowid = c.rowid \
                         ORDER BY distance ASC, c.rowid ASC \
                         LIMIT {k}"
                    ))?;

                let rows = stmt
                    .query_map([&encoded], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, f32>(3)?,
                        ))
                    })?;

                let mut collected = Vec::new();
                for row in rows {
                    collected.push(row?);
                }
                Ok(collected)
            })
            .await
            .map_err(|err| PipelineError::Index(err.to_string()))?;

        let mut results = Vec::with_capacity(raw_rows.len());
        for (parent_id, chunk_index, content, distance) in raw_rows {
            let parent_id = Uuid::parse_str(&parent_id)
                .map_err(|err| PipelineError::Index(format!("stored parent id invalid: {err}")))?;
            results.push((
                ChildChunk {
                    parent_id,
                    text: content,
                    index: chunk_index as usize,
                },
                1.0 - distance,
            ));
        }
        Ok(results)
    }

    /// Number of children stored.
    pub async fn count(&self) -> Result<usize, PipelineError> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM children", [], |row| {
                    row.get::<_, i64>(0)
                })
                .map(|count| count as usize)
            })
            .await
            .map_err(|err| PipelineError::Index(err.to_string()))
    }
}

fn register_sqlite_vec() -> Result<(), PipelineError> {
    use std::sync::Mutex;

    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!(
                    "failed to register sqlite-vec extension (code {rc})"
                ))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(PipelineError::Index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockEmbeddingProvider;
    use tempfile::tempdir;

    fn child(parent_id: Uuid, index: usize, text: &str) -> ChildChunk {
        ChildChunk {
            parent_id,
            text: text.to_string(),
            index,
        }
    }

    #[tokio::test]
    async fn indexed_child_is_its_own_nearest_neighbor() {
        let dir = tempdir().unwrap();
        let embedder = MockEmbeddingProvider::new();
        let index = SqliteVectorIndex::open(dir.path().join("index.sqlite"), embedder.dims())
            .await
            .unwrap();

        let parent_a = Uuid::new_v4();
        let parent_b = Uuid::new_v4();
        index
            .index_children(
                &[
                    child(parent_a, 0, "ownership rules in Rust"),
                    child(parent_a, 1, "borrow checker fundamentals"),
                    child(parent_b, 0, "tokio async runtime internals"),
                ],
                &embedder,
            )
            .await
            .unwrap();

        let results = index
            .search("borrow checker fundamentals", 3, &embedder)
            .await
            .unwrap();
        assert_eq!(results[0].0.text, "borrow checker fundamentals");
        assert_eq!(results[0].0.parent_id, parent_a);
        // Identical text embeds identically, so similarity is maximal.
        assert!(results[0].1 > 0.999);
    }

    #[tokio::test]
    async fn k_beyond_index_size_returns_everything() {
        let dir = tempdir().unwrap();
        let embedder = MockEmbeddingProvider::new();
        let index = SqliteVectorIndex::open(dir.path().join("index.sqlite"), embedder.dims())
            .await
            .unwrap();

        index
            .index_children(&[child(Uuid::new_v4(), 0, "only entry")], &embedder)
            .await
            .unwrap();

        let results = index.search("anything", 50, &embedder).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn zero_k_is_rejected() {
        let dir = tempdir().unwrap();
        let embedder = MockEmbeddingProvider::new();
        let index = SqliteVectorIndex::open(dir.path().join("index.sqlite"), embedder.dims())
            .await
            .unwrap();

        assert!(matches!(
            index.search("anything", 0, &embedder).await,
            Err(PipelineError::Index(_))
        ));
    }

    #[tokio::test]
    async fn equal_distances_rank_first_indexed_first() {
        let dir = tempdir().unwrap();
        let embedder = MockEmbeddingProvider::new();
        let index = SqliteVectorIndex::open(dir.path().join("index.sqlite"), embedder.dims())
            .await
            .unwrap();

        // Identical text embeds identically, so both rows tie on distance.
        let first_parent = Uuid::new_v4();
        let second_parent = Uuid::new_v4();
        index
            .index_children(
                &[
                    child(first_parent, 0, "identical child text"),
                    child(second_parent, 0, "identical child text"),
                ],
                &embedder,
            )
            .await
            .unwrap();

        let results = index
            .search("identical child text", 2, &embedder)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.parent_id, first_parent);
        assert_eq!(results[1].0.parent_id, second_parent);
    }

    #[tokio::test]
    async fn count_tracks_appends() {
        let dir = tempdir().unwrap();
        let embedder = MockEmbeddingProvider::new();
        let index = SqliteVectorIndex::open(dir.path().join("index.sqlite"), embedder.dims())
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 0);
        index
            .index_children(
                &[
                    child(Uuid::new_v4(), 0, "first"),
                    child(Uuid::new_v4(), 0, "second"),
                ],
                &embedder,
            )
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let index = SqliteVectorIndex::open(dir.path().join("index.sqlite"), 8)
            .await
            .unwrap();

        let wrong_dims = MockEmbeddingProvider::with_dims(4);
        assert!(matches!(
            index
                .index_children(&[child(Uuid::new_v4(), 0, "text")], &wrong_dims)
                .await,
            Err(PipelineError::Index(_))
        ));
    }
}
