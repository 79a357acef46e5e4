//! In-memory vector store for development and testing

use super::{matches_query, to_records, StoredChunk, VectorStore};
use crate::error::{GovernError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collections held in process memory, keyed by chunk id
pub struct MemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, BTreeMap<String, StoredChunk>>>>,

    /// Collections whose writes are rejected (failure injection)
    failing: std::sync::RwLock<HashSet<String>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            failing: std::sync::RwLock::new(HashSet::new()),
        }
    }

    /// Reject every subsequent write to `collection`
    pub fn fail_collection(&self, collection: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(collection.to_string());
        }
    }

    /// Sources with at least one chunk in `collection`
    pub async fn sources(&self, collection: &str) -> Vec<String> {
        let collections = self.collections.read().await;
        let sources: BTreeSet<String> = collections
            .get(collection)
            .map(|c| c.values().map(|chunk| chunk.source.clone()).collect())
            .unwrap_or_default();
        sources.into_iter().collect()
    }

    fn is_failing(&self, collection: &str) -> bool {
        self.failing
            .read()
            .map(|failing| failing.contains(collection))
            .unwrap_or(false)
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn store(&self, collection: &str, source: &str, chunks: &[String]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        if self.is_failing(collection) {
            return Err(GovernError::Storage {
                collection: collection.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let mut collections = self.collections.write().await;
        for records in collections.values_mut() {
            records.retain(|_, chunk| chunk.source != source);
        }
        let target = collections.entry(collection.to_string()).or_default();
        for record in to_records(source, chunks) {
            target.insert(record.id.clone(), record);
        }
        Ok(chunks.len())
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<StoredChunk>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|chunk| matches_query(chunk, query))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|c| c.len()).unwrap_or(0))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
