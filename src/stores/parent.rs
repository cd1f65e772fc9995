//! Durable keyed storage for parent chunks.
//!
//! Parents live in memory behind a read/write lock and are persisted as a
//! single versioned JSON snapshot. Persisting writes the full snapshot to a
//! temporary file in the same directory and then renames it over the target,
//! so a crash mid-write never corrupts previously durable state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::chunking::ParentChunk;
use crate::types::PipelineError;

/// Bump when the snapshot schema changes shape.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    parents: HashMap<Uuid, ParentChunk>,
}

/// Append/merge keyed store for parent chunks.
///
/// Later documents add new identifiers; an id already present is never
/// overwritten. Lookups of absent ids return `None` rather than an error.
#[derive(Debug)]
pub struct ParentStore {
    path: PathBuf,
    parents: RwLock<HashMap<Uuid, ParentChunk>>,
}

impl ParentStore {
    /// Opens the store, restoring a prior snapshot when one exists. A
    /// missing file is an empty store, not an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.into();
        let parents = if path.exists() {
            let data = fs::read_to_string(&path).await?;
            let snapshot: Snapshot = serde_json::from_str(&data)
                .map_err(|err| PipelineError::Store(format!("corrupt snapshot: {err}")))?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(PipelineError::Store(format!(
                    "unsupported snapshot version {}",
                    snapshot.version
                )));
            }
            debug!(parents = snapshot.parents.len(), path = %path.display(), "restored parent snapshot");
            snapshot.parents
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            parents: RwLock::new(parents),
        })
    }

    /// Snapshot file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts a parent. An existing id is left untouched.
    pub fn insert(&self, parent: ParentChunk) {
        self.parents.write().entry(parent.id).or_insert(parent);
    }

    /// Inserts a batch of parents, skipping ids already present.
    pub fn insert_all(&self, parents: impl IntoIterator<Item = ParentChunk>) {
        let mut guard = self.parents.write();
        for parent in parents {
            guard.entry(parent.id).or_insert(parent);
        }
    }

    /// Resolves a parent by id.
    pub fn get(&self, id: &Uuid) -> Option<ParentChunk> {
        self.parents.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.parents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.read().is_empty()
    }

    /// Writes the full snapshot to disk atomically (temp file + rename).
    pub async fn persist(&self) -> Result<(), PipelineError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            parents: self.parents.read().clone(),
        };
        let serialized = serde_json::to_vec(&snapshot)
            .map_err(|err| PipelineError::Store(err.to_string()))?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &serialized).await?;
        fs::rename(&tmp_path, &self.path).await?;
        debug!(parents = snapshot.parents.len(), path = %self.path.display(), "persisted parent snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parent(text: &str) -> ParentChunk {
        ParentChunk {
            id: Uuid::new_v4(),
            text: text.to_string(),
            index: 0,
        }
    }

    #[tokio::test]
    async fn get_after_put_and_persist_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parents.json");

        let stored = parent("large parent span");
        let store = ParentStore::open(&path).await.unwrap();
        store.insert(stored.clone());
        store.persist().await.unwrap();

        let reopened = ParentStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(&stored.id), Some(stored));
    }

    #[tokio::test]
    async fn absent_id_returns_none() {
        let dir = tempdir().unwrap();
        let store = ParentStore::open(dir.path().join("parents.json"))
            .await
            .unwrap();
        assert_eq!(store.get(&Uuid::new_v4()), None);
    }

    #[tokio::test]
    async fn later_documents_merge_without_overwriting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parents.json");

        let first = parent("first document");
        {
            let store = ParentStore::open(&path).await.unwrap();
            store.insert(first.clone());
            store.persist().await.unwrap();
        }

        let second = parent("second document");
        let store = ParentStore::open(&path).await.unwrap();
        store.insert(second.clone());
        store.persist().await.unwrap();

        let reopened = ParentStore::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get(&first.id), Some(first));
        assert_eq!(reopened.get(&second.id), Some(second));
    }

    #[tokio::test]
    async fn persist_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parents.json");

        let store = ParentStore::open(&path).await.unwrap();
        store.insert(parent("span"));
        store.persist().await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn unknown_snapshot_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parents.json");
        tokio::fs::write(&path, r#"{"version":99,"parents":{}}"#)
            .await
            .unwrap();

        assert!(matches!(
            ParentStore::open(&path).await,
            Err(PipelineError::Store(_))
        ));
    }
}
