//! Destination stores
//!
//! A `VectorStore` holds chunk text in named collections. Each document
//! lives in exactly one collection (public or secure); a re-store moves
//! it. `search` exists for post-run retrieval checks.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlVectorStore;
pub use memory::MemoryVectorStore;

/// One chunk persisted in a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredChunk {
    /// Deterministic id (`<source>#<index>`), so re-runs overwrite
    pub id: String,

    /// Relative path of the source document
    pub source: String,

    pub chunk_index: usize,
    pub text: String,
}

impl StoredChunk {
    pub fn new(source: &str, chunk_index: usize, text: impl Into<String>) -> Self {
        Self {
            id: chunk_id(source, chunk_index),
            source: source.to_string(),
            chunk_index,
            text: text.into(),
        }
    }
}

/// Id of chunk `index` of `source`
pub fn chunk_id(source: &str, index: usize) -> String {
    format!("{}#{}", source, index)
}

/// Build the records for one document's chunks
pub fn to_records<S: AsRef<str>>(source: &str, chunks: &[S]) -> Vec<StoredChunk> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, text)| StoredChunk::new(source, i, text.as_ref()))
        .collect()
}

/// Core trait for destination stores
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace a document's chunks.
    ///
    /// Every existing record of `source` is removed from all collections
    /// before `chunks` are written to `collection`, so a document lives in
    /// at most one collection and shrinking documents leave no stale tail.
    /// Returns the number of chunks written. An empty chunk list is a
    /// no-op that returns 0.
    async fn store(&self, collection: &str, source: &str, chunks: &[String]) -> Result<usize>;

    /// Chunks in `collection` whose text contains `query` (case-insensitive)
    async fn search(&self, collection: &str, query: &str, limit: usize)
        -> Result<Vec<StoredChunk>>;

    /// Number of chunks held in `collection`
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Store name (e.g., "memory", "jsonl")
    fn name(&self) -> &str;
}

pub(crate) fn matches_query(chunk: &StoredChunk, query: &str) -> bool {
    chunk.text.to_lowercase().contains(&query.to_lowercase())
}
