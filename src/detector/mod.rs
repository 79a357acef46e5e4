//! Entity detector trait: the seam to the NLP/rule engine
//!
//! A detector receives one bounded text segment and returns typed
//! findings with confidence scores. It applies no threshold of its own;
//! filtering is policy and lives in the aggregator.

use crate::error::Result;
use crate::types::{EntityType, Finding};
use async_trait::async_trait;

pub mod pattern;

pub use pattern::RegexDetector;

/// Pluggable entity detection backend
///
/// Implementations hold no per-call mutable state and are shared across
/// documents behind an `Arc`.
#[async_trait]
pub trait EntityDetector: Send + Sync {
    /// Analyze a text segment for the requested entity types.
    ///
    /// Errors are per call; the caller treats a failed segment as
    /// contributing zero findings.
    async fn analyze(
        &self,
        text: &str,
        entities: &[EntityType],
        language: &str,
    ) -> Result<Vec<Finding>>;

    /// Backend name (used in logs)
    fn name(&self) -> &str;
}
