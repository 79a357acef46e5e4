//! Core data model for the governance pipeline
//!
//! All serializable types use camelCase JSON for wire compatibility with
//! run reports; entity types keep their SCREAMING_SNAKE detector names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Regulated entity categories the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    EmailAddress,
    PhoneNumber,
    UsSsn,
    CreditCard,
    IbanCode,
}

impl EntityType {
    /// Every supported entity type, in canonical order
    pub const ALL: [EntityType; 5] = [
        EntityType::EmailAddress,
        EntityType::PhoneNumber,
        EntityType::UsSsn,
        EntityType::CreditCard,
        EntityType::IbanCode,
    ];

    /// Detector-facing name (e.g. `US_SSN`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailAddress => "EMAIL_ADDRESS",
            Self::PhoneNumber => "PHONE_NUMBER",
            Self::UsSsn => "US_SSN",
            Self::CreditCard => "CREDIT_CARD",
            Self::IbanCode => "IBAN_CODE",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown entity type: {}", s))
    }
}

/// A single detector result
///
/// `chunk_index` is filled in by the aggregator; detectors only see a
/// text segment and leave it at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub entity_type: EntityType,
    pub confidence: f64,
    #[serde(default)]
    pub chunk_index: usize,
}

impl Finding {
    pub fn new(entity_type: EntityType, confidence: f64) -> Self {
        Self {
            entity_type,
            confidence,
            chunk_index: 0,
        }
    }
}

/// Document-level sensitivity determination
///
/// Only constructible through [`Verdict::clean`] and
/// [`Verdict::from_chunk_detections`], which keep the three fields
/// consistent: sensitive iff the type set is non-empty iff the audit
/// trail is non-empty. Serialize-only, so no other path can build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    has_sensitive_data: bool,
    unique_entity_types: BTreeSet<EntityType>,
    audit_entries: Vec<String>,
}

impl Verdict {
    /// A verdict with no findings
    pub fn clean() -> Self {
        Self {
            has_sensitive_data: false,
            unique_entity_types: BTreeSet::new(),
            audit_entries: Vec::new(),
        }
    }

    /// Build a verdict from per-chunk detected types
    ///
    /// Each item is `(chunk_index, types in first-detection order)`.
    /// Chunks with no types contribute nothing to the audit trail.
    pub fn from_chunk_detections<I>(detections: I) -> Self
    where
        I: IntoIterator<Item = (usize, Vec<EntityType>)>,
    {
        let mut verdict = Self::clean();
        for (chunk_index, types) in detections {
            if types.is_empty() {
                continue;
            }
            let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
            verdict
                .audit_entries
                .push(format!("Chunk {}: {}", chunk_index, names.join(", ")));
            verdict.unique_entity_types.extend(types);
        }
        verdict.has_sensitive_data = !verdict.unique_entity_types.is_empty();
        verdict
    }

    pub fn has_sensitive_data(&self) -> bool {
        self.has_sensitive_data
    }

    pub fn unique_entity_types(&self) -> &BTreeSet<EntityType> {
        &self.unique_entity_types
    }

    /// Ordered, human-readable audit trail (`"Chunk i: TYPE, TYPE"`)
    pub fn audit_entries(&self) -> &[String] {
        &self.audit_entries
    }
}

/// One of the two isolated destination indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Destination {
    Secure,
    Public,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secure => f.write_str("SECURE"),
            Self::Public => f.write_str("PUBLIC"),
        }
    }
}

/// Output of the routing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub destination: Destination,
}

/// Operational metadata captured from the filesystem before processing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetadata {
    /// Size in KiB, rounded to two decimals (e.g. `"12.34"`)
    pub file_size_kb: String,

    /// Local creation time, `%Y-%m-%d %H:%M:%S`
    pub created_at: String,

    /// Lower-cased extension with leading dot (e.g. `".pdf"`)
    pub extension: String,
}

/// A discovered source document
///
/// `rel_path` is the stable identity used to derive the catalog source URN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub full_path: PathBuf,
    pub rel_path: String,
}

impl DocumentRef {
    pub fn new(full_path: impl Into<PathBuf>, rel_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            rel_path: rel_path.into(),
        }
    }
}
