//! Metadata emission protocol
//!
//! Publishes one document's governance record as an ordered sequence of
//! additive catalog mutations:
//!
//! 1. ownership on the destination entity
//! 2. lineage edge source → destination
//! 3. classification (glossary term on the source, tag on the destination),
//!    only when sensitive data was found
//! 4. custom properties on the source entity
//!
//! Every step is attempted even when an earlier one failed. Failures are
//! collected and returned together so the caller can mark the document as
//! partially governed.

use crate::catalog::{
    destination_urn, source_urn, CatalogMutation, CatalogSink, LineageType, OwnershipType,
};
use crate::config::CatalogConfig;
use crate::error::{EmissionError, StepFailure};
use crate::properties::DocumentProperties;
use crate::router::Collections;
use crate::types::{Destination, DocumentRef, SystemMetadata, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Steps of the emission protocol, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionStep {
    Ownership,
    Lineage,
    Classification,
    Properties,
}

impl fmt::Display for EmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ownership => "ownership",
            Self::Lineage => "lineage",
            Self::Classification => "classification",
            Self::Properties => "properties",
        };
        f.write_str(s)
    }
}

/// Inputs describing one processed document
#[derive(Debug, Clone, Copy)]
pub struct EmissionInput<'a> {
    pub document: &'a DocumentRef,
    pub destination: Destination,
    pub verdict: &'a Verdict,
    pub system_meta: &'a SystemMetadata,
    pub chunk_count: usize,
}

/// Builds and submits catalog mutations for processed documents
pub struct MetadataEmitter {
    sink: Arc<dyn CatalogSink>,
    collections: Collections,
    steward: String,
    pipeline_actor: String,
    sensitive_term: String,
    pii_tag: String,
    audit_log_limit: usize,
}

impl MetadataEmitter {
    pub fn new(sink: Arc<dyn CatalogSink>, collections: Collections, config: &CatalogConfig) -> Self {
        Self {
            sink,
            collections,
            steward: config.steward.clone(),
            pipeline_actor: config.pipeline_actor.clone(),
            sensitive_term: config.sensitive_term.clone(),
            pii_tag: config.pii_tag.clone(),
            audit_log_limit: config.audit_log_limit,
        }
    }

    /// Name of the underlying catalog sink
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// The mutation sequence for one document, tagged with its step.
    ///
    /// Pure: the same input and timestamp always yield the same plan.
    pub fn plan(
        &self,
        input: &EmissionInput<'_>,
        timestamp_ms: i64,
    ) -> Vec<(EmissionStep, CatalogMutation)> {
        let source = source_urn(&input.document.rel_path);
        let destination = destination_urn(self.collections.name(input.destination));

        let mut plan = vec![
            (
                EmissionStep::Ownership,
                CatalogMutation::OwnershipAssertion {
                    entity_urn: destination.clone(),
                    owner: self.steward.clone(),
                    ownership_type: OwnershipType::DataSteward,
                },
            ),
            (
                EmissionStep::Lineage,
                CatalogMutation::LineageEdgeAppend {
                    entity_urn: destination.clone(),
                    upstream_urn: source.clone(),
                    lineage_type: LineageType::Transformed,
                    actor: self.pipeline_actor.clone(),
                    timestamp_ms,
                },
            ),
        ];

        if input.verdict.has_sensitive_data() {
            plan.push((
                EmissionStep::Classification,
                CatalogMutation::GlossaryTermAssertion {
                    entity_urn: source.clone(),
                    term_urn: self.sensitive_term.clone(),
                    actor: self.steward.clone(),
                },
            ));
            plan.push((
                EmissionStep::Classification,
                CatalogMutation::TagAssertion {
                    entity_urn: destination,
                    tag_urn: self.pii_tag.clone(),
                },
            ));
        }

        let properties = DocumentProperties::build(
            input.chunk_count,
            input.system_meta,
            input.verdict,
            self.audit_log_limit,
        );
        plan.push((
            EmissionStep::Properties,
            CatalogMutation::PropertiesUpsert {
                entity_urn: source,
                properties: properties.to_wire(),
            },
        ));

        plan
    }

    /// Emit the full governance record for one document.
    ///
    /// Steps run strictly in order; a failed step is logged and the next
    /// step still runs. Returns every failure when at least one step failed.
    pub async fn emit(&self, input: &EmissionInput<'_>) -> Result<(), EmissionError> {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let mut failures = Vec::new();

        for (step, mutation) in self.plan(input, timestamp_ms) {
            if let Err(error) = self.sink.apply(&mutation).await {
                tracing::warn!(
                    document = %input.document.rel_path,
                    step = %step,
                    urn = %mutation.entity_urn(),
                    sink = self.sink.name(),
                    error = %error,
                    "Catalog emission step failed"
                );
                failures.push(StepFailure {
                    step,
                    urn: mutation.entity_urn().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            tracing::debug!(document = %input.document.rel_path, "Governance record emitted");
            Ok(())
        } else {
            Err(EmissionError { failures })
        }
    }
}
