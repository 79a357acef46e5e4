//! File-backed vector store
//!
//! One JSON Lines file per collection under the store directory. Writes
//! rewrite the whole collection through a temp file + rename, so a crash
//! never leaves a half-written collection behind.

use super::{matches_query, to_records, StoredChunk, VectorStore};
use crate::error::{GovernError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Vector store persisting each collection as `<dir>/<collection>.jsonl`
pub struct JsonlVectorStore {
    dir: PathBuf,

    /// Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl JsonlVectorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", collection))
    }

    async fn load(&self, collection: &str) -> Result<BTreeMap<String, StoredChunk>> {
        let path = self.collection_path(collection);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(storage_error(collection, format!("read {}: {}", path.display(), e))),
        };

        let mut records = BTreeMap::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let chunk: StoredChunk = serde_json::from_str(line).map_err(|e| {
                storage_error(
                    collection,
                    format!("parse {} line {}: {}", path.display(), line_no + 1, e),
                )
            })?;
            records.insert(chunk.id.clone(), chunk);
        }
        Ok(records)
    }

    /// Collections with a file in the store directory
    async fn collection_names(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(storage_error(
                    "*",
                    format!("list {}: {}", self.dir.display(), e),
                ))
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            storage_error("*", format!("list {}: {}", self.dir.display(), e))
        })? {
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(".jsonl")) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn save(&self, collection: &str, records: &BTreeMap<String, StoredChunk>) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp_path = path.with_extension("jsonl.tmp");

        let mut out = String::new();
        for chunk in records.values() {
            out.push_str(&serde_json::to_string(chunk)?);
            out.push('\n');
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            storage_error(collection, format!("create {}: {}", self.dir.display(), e))
        })?;
        tokio::fs::write(&tmp_path, out).await.map_err(|e| {
            storage_error(collection, format!("write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            storage_error(
                collection,
                format!("rename {} → {}: {}", tmp_path.display(), path.display(), e),
            )
        })?;

        tracing::debug!(
            path = %path.display(),
            count = records.len(),
            "Collection saved"
        );
        Ok(())
    }
}

fn storage_error(collection: &str, reason: String) -> GovernError {
    GovernError::Storage {
        collection: collection.to_string(),
        reason,
    }
}

#[async_trait]
impl VectorStore for JsonlVectorStore {
    async fn store(&self, collection: &str, source: &str, chunks: &[String]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;

        // Other collections first: a failure here must not leave the
        // document readable from two collections.
        for name in self.collection_names().await? {
            if name == collection {
                continue;
            }
            let mut records = self.load(&name).await?;
            let before = records.len();
            records.retain(|_, chunk| chunk.source != source);
            if records.len() != before {
                self.save(&name, &records).await?;
                tracing::debug!(
                    collection = %name,
                    source,
                    removed = before - records.len(),
                    "Removed stale chunks"
                );
            }
        }

        let mut records = self.load(collection).await?;
        records.retain(|_, chunk| chunk.source != source);
        for record in to_records(source, chunks) {
            records.insert(record.id.clone(), record);
        }
        self.save(collection, &records).await?;
        Ok(chunks.len())
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<StoredChunk>> {
        let records = self.load(collection).await?;
        Ok(records
            .into_values()
            .filter(|chunk| matches_query(chunk, query))
            .take(limit)
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.load(collection).await?.len())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}
