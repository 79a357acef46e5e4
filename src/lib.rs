//! # a3s-govern
//!
//! PII-aware document routing and lineage publication for the A3S ecosystem.
//!
//! ## Overview
//!
//! `a3s-govern` scans extracted document text for regulated entities
//! (e-mail addresses, phone numbers, SSNs, card numbers, IBANs), routes the
//! document to a public or a secure collection, and publishes an additive
//! ownership / lineage / classification record to a DataHub catalog.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use a3s_govern::{
//!     DocumentRef, GovernConfig, MemoryCatalog, MemoryVectorStore, Pipeline, RegexDetector,
//!     SystemMetadata, TextExtractor,
//! };
//!
//! # async fn example() -> a3s_govern::Result<()> {
//! let config = GovernConfig::default();
//! let pipeline = Pipeline::new(
//!     &config,
//!     Arc::new(RegexDetector::new()?),
//!     Arc::new(TextExtractor::new()),
//!     Arc::new(MemoryVectorStore::new()),
//!     Arc::new(MemoryCatalog::new()),
//! );
//!
//! let doc = DocumentRef::new("/data/hr/offer.txt", "hr/offer.txt");
//! let chunks = vec!["John Smith, SSN 078-05-1120".to_string()];
//! let report = pipeline
//!     .process_chunks(&doc, &chunks, &SystemMetadata::default())
//!     .await;
//!
//! println!("{:?} -> {:?}", report.destination, report.outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **EntityDetector** trait: per-segment entity recognition (`RegexDetector` built in)
//! - **PiiAggregator**: chunk findings → one document `Verdict`
//! - **route**: `Verdict` → SECURE / PUBLIC, nothing else considered
//! - **MetadataEmitter**: ordered, additive catalog mutations with per-step failure reporting
//! - **CatalogSink** trait: `RestCatalog` (DataHub GMS) and `MemoryCatalog`
//! - **VectorStore** trait: `JsonlVectorStore` and `MemoryVectorStore`
//! - **Pipeline**: per-document state machine and bounded-concurrency batch driver

pub mod aggregator;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod detector;
pub mod discovery;
pub mod emitter;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod properties;
pub mod retry;
pub mod router;
pub mod storage;
pub mod types;

// Re-export core types
pub use aggregator::{Assessment, PiiAggregator};
pub use catalog::{CatalogMutation, CatalogSink, MemoryCatalog, RestCatalog};
pub use config::GovernConfig;
pub use detector::{EntityDetector, RegexDetector};
pub use emitter::{EmissionInput, EmissionStep, MetadataEmitter};
pub use error::{EmissionError, GovernError, Result, StepFailure};
pub use extract::{Extractor, TextExtractor};
pub use pipeline::{DocumentOutcome, DocumentReport, DocumentState, Pipeline, RunReport, Stage};
pub use properties::{DocumentProperties, PropertyKey};
pub use retry::RetryConfig;
pub use router::{route, Collections};
pub use storage::{JsonlVectorStore, MemoryVectorStore, StoredChunk, VectorStore};
pub use types::{
    Destination, DocumentRef, EntityType, Finding, RoutingDecision, SystemMetadata, Verdict,
};
