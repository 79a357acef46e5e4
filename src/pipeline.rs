//! Pipeline orchestrator
//!
//! Drives each document through
//! `Discovered → Extracted → Scanned → Routed → Stored → Governed`.
//! Every transition is an explicit branch; no state is ever skipped. A
//! document's failure is contained in its own `DocumentReport` and never
//! aborts the batch.

use crate::aggregator::PiiAggregator;
use crate::catalog::{source_urn, CatalogSink};
use crate::config::GovernConfig;
use crate::detector::EntityDetector;
use crate::discovery;
use crate::emitter::{EmissionInput, EmissionStep, MetadataEmitter};
use crate::error::Result;
use crate::extract::Extractor;
use crate::router::{self, Collections};
use crate::storage::VectorStore;
use crate::types::{Destination, DocumentRef, EntityType, Finding, SystemMetadata};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Lifecycle state of a document within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentState {
    Discovered,
    Extracted,
    Scanned,
    Routed,
    Stored,
    Governed,
}

/// Stage at which a document failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extraction,
    Storage,
}

/// Terminal outcome of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DocumentOutcome {
    /// Stored and fully governed
    Done,
    /// Nothing extractable, or never started
    Skipped { reason: String },
    /// Unreadable source, or chunks not indexed
    Failed { stage: Stage, reason: String },
    /// Stored, but one or more emission steps failed
    #[serde(rename_all = "camelCase")]
    PartiallyGoverned { failed_steps: Vec<EmissionStep> },
}

impl DocumentOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
            Self::PartiallyGoverned { .. } => "partially_governed",
        }
    }
}

/// Everything known about one document after processing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub rel_path: String,
    pub source_urn: String,

    /// Last state reached
    pub state: DocumentState,
    pub outcome: DocumentOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,

    /// Collection the chunks were written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    pub chunk_count: usize,
    pub entity_types: Vec<EntityType>,
    pub audit_entries: Vec<String>,

    /// Accepted findings, for audit
    pub findings: Vec<Finding>,

    /// Segments whose detector call failed
    pub failed_segments: usize,

    /// Per-step emission failures (empty when fully governed)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub governance_errors: Vec<String>,
}

impl DocumentReport {
    fn new(doc: &DocumentRef) -> Self {
        Self {
            rel_path: doc.rel_path.clone(),
            source_urn: source_urn(&doc.rel_path),
            state: DocumentState::Discovered,
            outcome: DocumentOutcome::Skipped {
                reason: "not started".to_string(),
            },
            destination: None,
            collection: None,
            chunk_count: 0,
            entity_types: Vec::new(),
            audit_entries: Vec::new(),
            findings: Vec::new(),
            failed_segments: 0,
            governance_errors: Vec::new(),
        }
    }

    fn skipped(doc: &DocumentRef, reason: impl Into<String>) -> Self {
        let mut report = Self::new(doc);
        report.outcome = DocumentOutcome::Skipped {
            reason: reason.into(),
        };
        report
    }

    fn advance(&mut self, state: DocumentState) {
        self.state = state;
        tracing::info!(document = %self.rel_path, state = ?state, "Document advanced");
    }

    fn finish(mut self, outcome: DocumentOutcome) -> Self {
        tracing::info!(
            document = %self.rel_path,
            state = ?self.state,
            outcome = outcome.label(),
            "Document finished"
        );
        self.outcome = outcome;
        self
    }
}

/// Counts per outcome and destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
    pub partially_governed: usize,
    pub routed_secure: usize,
    pub routed_public: usize,
}

impl RunSummary {
    fn from_reports(reports: &[DocumentReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Default::default()
        };
        for report in reports {
            match report.outcome {
                DocumentOutcome::Done => summary.done += 1,
                DocumentOutcome::Skipped { .. } => summary.skipped += 1,
                DocumentOutcome::Failed { .. } => summary.failed += 1,
                DocumentOutcome::PartiallyGoverned { .. } => summary.partially_governed += 1,
            }
            match report.destination {
                Some(Destination::Secure) => summary.routed_secure += 1,
                Some(Destination::Public) => summary.routed_public += 1,
                None => {}
            }
        }
        summary
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: RunSummary,

    /// One report per document, in input order
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    /// Report for the document at `rel_path`
    pub fn document(&self, rel_path: &str) -> Option<&DocumentReport> {
        self.documents.iter().find(|d| d.rel_path == rel_path)
    }
}

/// Classification-and-publication pipeline
///
/// Built once per process; all collaborators are shared across documents.
pub struct Pipeline {
    extractor: Arc<dyn Extractor>,
    aggregator: PiiAggregator,
    store: Arc<dyn VectorStore>,
    emitter: MetadataEmitter,
    collections: Collections,
    concurrency: usize,
    govern_on_storage_failure: bool,
}

impl Pipeline {
    pub fn new(
        config: &GovernConfig,
        detector: Arc<dyn EntityDetector>,
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn VectorStore>,
        catalog: Arc<dyn CatalogSink>,
    ) -> Self {
        let collections = Collections::from(&config.routing);
        Self {
            extractor,
            aggregator: PiiAggregator::new(detector, config.detection.clone()),
            store,
            emitter: MetadataEmitter::new(catalog, collections.clone(), &config.catalog),
            collections,
            concurrency: config.concurrency.max(1),
            govern_on_storage_failure: config.govern_on_storage_failure,
        }
    }

    /// Discover documents under `data_dir` and process them
    pub async fn run_dir(
        &self,
        data_dir: &Path,
        extensions: &[String],
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let documents = discovery::discover(data_dir, extensions)?;
        if documents.is_empty() {
            tracing::warn!(data_dir = %data_dir.display(), "No documents found");
        }
        Ok(self.run(&documents, cancel).await)
    }

    /// Process a batch of documents.
    ///
    /// Up to `concurrency` documents run at once. Cancellation is checked
    /// before each document starts; documents not started are reported
    /// as skipped.
    pub async fn run(&self, documents: &[DocumentRef], cancel: CancellationToken) -> RunReport {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        let started_at = Utc::now();
        tracing::info!(
            run_id = %run_id,
            documents = documents.len(),
            concurrency = self.concurrency,
            catalog = self.emitter.sink_name(),
            store = self.store.name(),
            "Pipeline run started"
        );

        let mut indexed: Vec<(usize, DocumentReport)> =
            futures::stream::iter(documents.iter().enumerate())
                .map(|(index, doc)| {
                    let cancel = cancel.clone();
                    async move {
                        if cancel.is_cancelled() {
                            return (index, DocumentReport::skipped(doc, "cancelled"));
                        }
                        (index, self.process_document(doc).await)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        indexed.sort_by_key(|(index, _)| *index);

        let documents: Vec<DocumentReport> = indexed.into_iter().map(|(_, r)| r).collect();
        let summary = RunSummary::from_reports(&documents);
        tracing::info!(
            run_id = %run_id,
            done = summary.done,
            skipped = summary.skipped,
            failed = summary.failed,
            partially_governed = summary.partially_governed,
            "Pipeline run finished"
        );

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            summary,
            documents,
        }
    }

    /// Drive one document through the full state machine
    pub async fn process_document(&self, doc: &DocumentRef) -> DocumentReport {
        let mut report = DocumentReport::new(doc);

        let system_meta = match discovery::system_metadata(&doc.full_path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(document = %doc.rel_path, error = %e, "Cannot stat document");
                return report.finish(DocumentOutcome::Failed {
                    stage: Stage::Extraction,
                    reason: e.to_string(),
                });
            }
        };

        let chunks = match self.extractor.extract(&doc.full_path).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!(document = %doc.rel_path, error = %e, "Extraction failed");
                return report.finish(DocumentOutcome::Failed {
                    stage: Stage::Extraction,
                    reason: e.to_string(),
                });
            }
        };
        report.chunk_count = chunks.len();
        report.advance(DocumentState::Extracted);
        if chunks.is_empty() {
            return report.finish(DocumentOutcome::Skipped {
                reason: "no text".to_string(),
            });
        }

        self.classify_and_publish(report, doc, &chunks, &system_meta)
            .await
    }

    /// Process already-extracted chunks: scan, route, store, govern
    pub async fn process_chunks(
        &self,
        doc: &DocumentRef,
        chunks: &[String],
        system_meta: &SystemMetadata,
    ) -> DocumentReport {
        let mut report = DocumentReport::new(doc);
        report.chunk_count = chunks.len();
        report.advance(DocumentState::Extracted);
        if chunks.is_empty() {
            return report.finish(DocumentOutcome::Skipped {
                reason: "no text".to_string(),
            });
        }
        self.classify_and_publish(report, doc, chunks, system_meta)
            .await
    }

    async fn classify_and_publish(
        &self,
        mut report: DocumentReport,
        doc: &DocumentRef,
        chunks: &[String],
        system_meta: &SystemMetadata,
    ) -> DocumentReport {
        let assessment = self.aggregator.assess(chunks).await;
        let verdict = assessment.verdict;
        report.entity_types = verdict.unique_entity_types().iter().copied().collect();
        report.audit_entries = verdict.audit_entries().to_vec();
        report.findings = assessment.findings;
        report.failed_segments = assessment.failed_segments;
        report.advance(DocumentState::Scanned);

        let destination = router::route(&verdict).destination;
        let collection = self.collections.name(destination).to_string();
        report.destination = Some(destination);
        report.collection = Some(collection.clone());
        report.advance(DocumentState::Routed);

        let rel_path = doc.rel_path.as_str();
        let storage_error = match self.store.store(&collection, rel_path, chunks).await {
            Ok(written) => {
                tracing::debug!(document = %rel_path, collection = %collection, written, "Chunks stored");
                report.advance(DocumentState::Stored);
                None
            }
            Err(e) => {
                tracing::warn!(
                    document = %rel_path,
                    collection = %collection,
                    error = %e,
                    "Storage write failed"
                );
                Some(e.to_string())
            }
        };

        if storage_error.is_some() && !self.govern_on_storage_failure {
            return report.finish(DocumentOutcome::Failed {
                stage: Stage::Storage,
                reason: storage_error.unwrap_or_default(),
            });
        }

        let input = EmissionInput {
            document: doc,
            destination,
            verdict: &verdict,
            system_meta,
            chunk_count: chunks.len(),
        };
        let emission = self.emitter.emit(&input).await;

        if let Err(e) = &emission {
            report.governance_errors = e
                .failures
                .iter()
                .map(|f| format!("{} on {}: {}", f.step, f.urn, f.error))
                .collect();
        }

        match (storage_error, emission) {
            (None, Ok(())) => {
                report.advance(DocumentState::Governed);
                report.finish(DocumentOutcome::Done)
            }
            (None, Err(e)) => {
                let failed_steps = e.failed_steps();
                report.finish(DocumentOutcome::PartiallyGoverned { failed_steps })
            }
            (Some(reason), _) => report.finish(DocumentOutcome::Failed {
                stage: Stage::Storage,
                reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: DocumentOutcome, destination: Option<Destination>) -> DocumentReport {
        let mut r = DocumentReport::new(&DocumentRef::new("/d/a.txt", "a.txt"));
        r.outcome = outcome;
        r.destination = destination;
        r
    }

    #[test]
    fn test_summary_counts() {
        let reports = vec![
            report(DocumentOutcome::Done, Some(Destination::Secure)),
            report(DocumentOutcome::Done, Some(Destination::Public)),
            report(
                DocumentOutcome::Skipped {
                    reason: "no text".to_string(),
                },
                None,
            ),
            report(
                DocumentOutcome::PartiallyGoverned {
                    failed_steps: vec![EmissionStep::Lineage],
                },
                Some(Destination::Secure),
            ),
        ];
        let summary = RunSummary::from_reports(&reports);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.done, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.partially_governed, 1);
        assert_eq!(summary.routed_secure, 2);
        assert_eq!(summary.routed_public, 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = DocumentOutcome::Failed {
            stage: Stage::Storage,
            reason: "disk full".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "storage");

        let outcome = DocumentOutcome::PartiallyGoverned {
            failed_steps: vec![EmissionStep::Properties],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "partiallyGoverned");
        assert_eq!(json["failedSteps"][0], "properties");
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(DocumentState::Routed < DocumentState::Stored);
        assert!(DocumentState::Stored < DocumentState::Governed);
    }
}
