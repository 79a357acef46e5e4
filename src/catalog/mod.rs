//! Metadata catalog: mutations and the sink abstraction
//!
//! Every mutation targets one entity URN and is additive: applying it
//! unions with the existing aspect instead of replacing it, so re-applying
//! a mutation leaves the catalog unchanged. Sinks (DataHub REST, in-memory)
//! implement `CatalogSink` to apply mutations.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod memory;
pub mod rest;
pub mod urn;

pub use memory::{EntitySnapshot, MemoryCatalog, UpstreamEdge};
pub use rest::RestCatalog;
pub use urn::{destination_urn, escape_path_segment, source_urn};

/// Ownership category asserted on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnershipType {
    DataSteward,
}

impl OwnershipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataSteward => "DATA_STEWARD",
        }
    }
}

/// Lineage edge category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineageType {
    Transformed,
}

impl LineageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transformed => "TRANSFORMED",
        }
    }
}

/// One additive change to the metadata graph
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogMutation {
    /// Add `(owner, ownership_type)` to the entity's owners
    OwnershipAssertion {
        entity_urn: String,
        owner: String,
        ownership_type: OwnershipType,
    },
    /// Add (or refresh) the upstream edge keyed by `upstream_urn`
    LineageEdgeAppend {
        entity_urn: String,
        upstream_urn: String,
        lineage_type: LineageType,
        actor: String,
        timestamp_ms: i64,
    },
    /// Attach a glossary term
    GlossaryTermAssertion {
        entity_urn: String,
        term_urn: String,
        actor: String,
    },
    /// Attach a tag
    TagAssertion { entity_urn: String, tag_urn: String },
    /// Set each key in `properties`, leaving other keys untouched
    PropertiesUpsert {
        entity_urn: String,
        properties: BTreeMap<String, String>,
    },
}

impl CatalogMutation {
    /// Entity this mutation targets
    pub fn entity_urn(&self) -> &str {
        match self {
            Self::OwnershipAssertion { entity_urn, .. }
            | Self::LineageEdgeAppend { entity_urn, .. }
            | Self::GlossaryTermAssertion { entity_urn, .. }
            | Self::TagAssertion { entity_urn, .. }
            | Self::PropertiesUpsert { entity_urn, .. } => entity_urn,
        }
    }

    /// Catalog aspect this mutation patches
    pub fn aspect_name(&self) -> &'static str {
        match self {
            Self::OwnershipAssertion { .. } => "ownership",
            Self::LineageEdgeAppend { .. } => "upstreamLineage",
            Self::GlossaryTermAssertion { .. } => "glossaryTerms",
            Self::TagAssertion { .. } => "globalTags",
            Self::PropertiesUpsert { .. } => "datasetProperties",
        }
    }

    /// JSON-Patch operations expressing this mutation.
    ///
    /// All operations are `add` on a path keyed by the added item, which
    /// makes them idempotent and commutative with concurrent writers.
    pub fn patch_ops(&self) -> Vec<PatchOp> {
        match self {
            Self::OwnershipAssertion {
                owner,
                ownership_type,
                ..
            } => vec![PatchOp::add(
                format!(
                    "/owners/{}/{}",
                    escape_path_segment(owner),
                    ownership_type.as_str()
                ),
                serde_json::json!({
                    "owner": owner,
                    "type": ownership_type.as_str(),
                }),
            )],
            Self::LineageEdgeAppend {
                upstream_urn,
                lineage_type,
                actor,
                timestamp_ms,
                ..
            } => vec![PatchOp::add(
                format!("/upstreams/{}", escape_path_segment(upstream_urn)),
                serde_json::json!({
                    "auditStamp": { "time": timestamp_ms, "actor": actor },
                    "dataset": upstream_urn,
                    "type": lineage_type.as_str(),
                }),
            )],
            Self::GlossaryTermAssertion {
                term_urn, actor, ..
            } => vec![PatchOp::add(
                format!("/glossaryTerms/{}", escape_path_segment(term_urn)),
                serde_json::json!({ "urn": term_urn, "actor": actor }),
            )],
            Self::TagAssertion { tag_urn, .. } => vec![PatchOp::add(
                format!("/tags/{}", escape_path_segment(tag_urn)),
                serde_json::json!({ "tag": tag_urn }),
            )],
            Self::PropertiesUpsert { properties, .. } => properties
                .iter()
                .map(|(key, value)| {
                    PatchOp::add(
                        format!("/customProperties/{}", escape_path_segment(key)),
                        serde_json::Value::String(value.clone()),
                    )
                })
                .collect(),
        }
    }
}

impl fmt::Display for CatalogMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.aspect_name(), self.entity_urn())
    }
}

/// A single JSON-Patch (RFC 6902) operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: String,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOp {
    pub fn add(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: "add".to_string(),
            path: path.into(),
            value,
        }
    }
}

/// Core trait for catalog backends
///
/// Implementations apply one mutation at a time. A sink is created once
/// per process and shared across documents.
#[async_trait]
pub trait CatalogSink: Send + Sync {
    /// Apply a single additive mutation
    async fn apply(&self, mutation: &CatalogMutation) -> Result<()>;

    /// Sink name (e.g., "datahub-rest", "memory")
    fn name(&self) -> &str;

    /// Health check: returns true if the catalog is reachable
    ///
    /// Default implementation assumes the sink is always available.
    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_patch() {
        let m = CatalogMutation::OwnershipAssertion {
            entity_urn: "urn:li:dataset:(urn:li:dataPlatform:pinecone,idx,PROD)".to_string(),
            owner: "urn:li:corpuser:admin".to_string(),
            ownership_type: OwnershipType::DataSteward,
        };
        let ops = m.patch_ops();
        assert_eq!(m.aspect_name(), "ownership");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op, "add");
        assert_eq!(ops[0].path, "/owners/urn:li:corpuser:admin/DATA_STEWARD");
        assert_eq!(ops[0].value["type"], "DATA_STEWARD");
    }

    #[test]
    fn test_lineage_patch_escapes_source_urn() {
        let source = "urn:li:dataset:(urn:li:dataPlatform:external,file://hr/a.pdf,PROD)";
        let m = CatalogMutation::LineageEdgeAppend {
            entity_urn: "urn:dest".to_string(),
            upstream_urn: source.to_string(),
            lineage_type: LineageType::Transformed,
            actor: "urn:li:corpuser:ingestion-script".to_string(),
            timestamp_ms: 1_700_000_000_000,
        };
        let ops = m.patch_ops();
        assert_eq!(
            ops[0].path,
            "/upstreams/urn:li:dataset:(urn:li:dataPlatform:external,file:~1~1hr~1a.pdf,PROD)"
        );
        assert_eq!(ops[0].value["dataset"], source);
        assert_eq!(ops[0].value["type"], "TRANSFORMED");
        assert_eq!(ops[0].value["auditStamp"]["time"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_properties_patch_one_op_per_key() {
        let mut properties = BTreeMap::new();
        properties.insert("chunk_count".to_string(), "3".to_string());
        properties.insert("risk_level".to_string(), "LOW".to_string());
        let m = CatalogMutation::PropertiesUpsert {
            entity_urn: "urn:src".to_string(),
            properties,
        };

        let ops = m.patch_ops();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].path, "/customProperties/chunk_count");
        assert_eq!(ops[0].value, serde_json::json!("3"));
        assert_eq!(ops[1].path, "/customProperties/risk_level");
    }

    #[test]
    fn test_tag_and_term_patches() {
        let tag = CatalogMutation::TagAssertion {
            entity_urn: "urn:dest".to_string(),
            tag_urn: "urn:li:tag:PII".to_string(),
        };
        assert_eq!(tag.aspect_name(), "globalTags");
        assert_eq!(tag.patch_ops()[0].path, "/tags/urn:li:tag:PII");

        let term = CatalogMutation::GlossaryTermAssertion {
            entity_urn: "urn:src".to_string(),
            term_urn: "urn:li:glossaryTerm:Classification.Sensitive".to_string(),
            actor: "urn:li:corpuser:admin".to_string(),
        };
        assert_eq!(term.aspect_name(), "glossaryTerms");
        assert_eq!(
            term.patch_ops()[0].path,
            "/glossaryTerms/urn:li:glossaryTerm:Classification.Sensitive"
        );
        assert_eq!(term.to_string(), "glossaryTerms on urn:src");
    }
}
