//! In-memory catalog for development and testing
//!
//! Applies mutations with the same additive semantics the REST catalog
//! relies on: owners, terms, and tags are sets, upstream edges are keyed by
//! source URN, and properties are overwritten per key.

use super::{CatalogMutation, CatalogSink, LineageType, OwnershipType};
use crate::error::{GovernError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One upstream lineage edge on an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEdge {
    pub lineage_type: LineageType,
    pub actor: String,
    pub timestamp_ms: i64,
}

/// Accumulated aspects of one catalog entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub owners: BTreeSet<(String, OwnershipType)>,

    /// Upstream edges keyed by source URN
    pub upstreams: BTreeMap<String, UpstreamEdge>,

    pub glossary_terms: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub properties: BTreeMap<String, String>,
}

/// Catalog held entirely in process memory
pub struct MemoryCatalog {
    entities: Arc<RwLock<HashMap<String, EntitySnapshot>>>,

    /// Aspect names whose mutations are rejected (failure injection)
    failing_aspects: std::sync::RwLock<HashSet<String>>,

    applied: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
            failing_aspects: std::sync::RwLock::new(HashSet::new()),
            applied: AtomicUsize::new(0),
        }
    }

    /// Reject every subsequent mutation on `aspect` with a 500
    pub fn fail_aspect(&self, aspect: &str) {
        if let Ok(mut failing) = self.failing_aspects.write() {
            failing.insert(aspect.to_string());
        }
    }

    /// Stop rejecting mutations on `aspect`
    pub fn heal_aspect(&self, aspect: &str) {
        if let Ok(mut failing) = self.failing_aspects.write() {
            failing.remove(aspect);
        }
    }

    /// Current state of one entity, if it has ever been mutated
    pub async fn entity(&self, urn: &str) -> Option<EntitySnapshot> {
        self.entities.read().await.get(urn).cloned()
    }

    /// Full catalog state, keyed by URN
    pub async fn snapshot(&self) -> BTreeMap<String, EntitySnapshot> {
        self.entities
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of mutations successfully applied
    pub fn applied_count(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    fn is_failing(&self, aspect: &str) -> bool {
        self.failing_aspects
            .read()
            .map(|failing| failing.contains(aspect))
            .unwrap_or(false)
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSink for MemoryCatalog {
    async fn apply(&self, mutation: &CatalogMutation) -> Result<()> {
        if self.is_failing(mutation.aspect_name()) {
            return Err(GovernError::Catalog {
                urn: mutation.entity_urn().to_string(),
                status: 500,
                body: format!("injected failure on {}", mutation.aspect_name()),
            });
        }

        let mut entities = self.entities.write().await;
        let entity = entities
            .entry(mutation.entity_urn().to_string())
            .or_default();

        match mutation {
            CatalogMutation::OwnershipAssertion {
                owner,
                ownership_type,
                ..
            } => {
                entity.owners.insert((owner.clone(), *ownership_type));
            }
            CatalogMutation::LineageEdgeAppend {
                upstream_urn,
                lineage_type,
                actor,
                timestamp_ms,
                ..
            } => {
                entity.upstreams.insert(
                    upstream_urn.clone(),
                    UpstreamEdge {
                        lineage_type: *lineage_type,
                        actor: actor.clone(),
                        timestamp_ms: *timestamp_ms,
                    },
                );
            }
            CatalogMutation::GlossaryTermAssertion { term_urn, .. } => {
                entity.glossary_terms.insert(term_urn.clone());
            }
            CatalogMutation::TagAssertion { tag_urn, .. } => {
                entity.tags.insert(tag_urn.clone());
            }
            CatalogMutation::PropertiesUpsert { properties, .. } => {
                for (key, value) in properties {
                    entity.properties.insert(key.clone(), value.clone());
                }
            }
        }

        self.applied.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(mutation = %mutation, "Applied catalog mutation");
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
