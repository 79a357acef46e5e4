//! Typed custom properties for the source entity
//!
//! Keys are an enum internally; they become strings only when the map is
//! serialized for the catalog.

use crate::types::{SystemMetadata, Verdict};
use std::collections::BTreeMap;
use std::fmt;

/// Separator between audit entries in `pii_audit_log`
pub const AUDIT_LOG_SEPARATOR: &str = " | ";

/// Custom property keys published on the source entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    QualityScore,
    ChunkCount,
    FileSizeKb,
    CreatedAt,
    Extension,
    PiiDetected,
    RiskLevel,
    PiiAuditLog,
}

impl PropertyKey {
    /// Wire name of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QualityScore => "quality_score",
            Self::ChunkCount => "chunk_count",
            Self::FileSizeKb => "file_size_kb",
            Self::CreatedAt => "created_at",
            Self::Extension => "extension",
            Self::PiiDetected => "pii_detected",
            Self::RiskLevel => "risk_level",
            Self::PiiAuditLog => "pii_audit_log",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property map for one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentProperties {
    values: BTreeMap<PropertyKey, String>,
}

impl DocumentProperties {
    /// Build the property map for a processed document.
    ///
    /// Merge order: computed fields, then system metadata, then the
    /// classification fields. `pii_audit_log` is only present when PII was
    /// found and holds at most `audit_limit` entries.
    pub fn build(
        chunk_count: usize,
        system_meta: &SystemMetadata,
        verdict: &Verdict,
        audit_limit: usize,
    ) -> Self {
        let mut props = Self::default();

        let quality = if chunk_count > 0 { "100" } else { "0" };
        props.set(PropertyKey::QualityScore, quality);
        props.set(PropertyKey::ChunkCount, chunk_count.to_string());

        props.set(PropertyKey::FileSizeKb, &system_meta.file_size_kb);
        props.set(PropertyKey::CreatedAt, &system_meta.created_at);
        props.set(PropertyKey::Extension, &system_meta.extension);

        if verdict.has_sensitive_data() {
            props.set(PropertyKey::PiiDetected, "True");
            props.set(PropertyKey::RiskLevel, "HIGH");
            let entries: Vec<&str> = verdict
                .audit_entries()
                .iter()
                .take(audit_limit)
                .map(String::as_str)
                .collect();
            props.set(PropertyKey::PiiAuditLog, entries.join(AUDIT_LOG_SEPARATOR));
        } else {
            props.set(PropertyKey::PiiDetected, "False");
            props.set(PropertyKey::RiskLevel, "LOW");
        }

        props
    }

    pub fn set(&mut self, key: PropertyKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: PropertyKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize keys to their wire names
    pub fn to_wire(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityType;

    fn meta() -> SystemMetadata {
        SystemMetadata {
            file_size_kb: "1.5".to_string(),
            created_at: "2024-03-01 09:30:00".to_string(),
            extension: ".pdf".to_string(),
        }
    }

    #[test]
    fn test_clean_document_properties() {
        let props = DocumentProperties::build(4, &meta(), &Verdict::clean(), 10);
        let wire = props.to_wire();

        assert_eq!(wire["quality_score"], "100");
        assert_eq!(wire["chunk_count"], "4");
        assert_eq!(wire["file_size_kb"], "1.5");
        assert_eq!(wire["created_at"], "2024-03-01 09:30:00");
        assert_eq!(wire["extension"], ".pdf");
        assert_eq!(wire["pii_detected"], "False");
        assert_eq!(wire["risk_level"], "LOW");
        assert!(!wire.contains_key("pii_audit_log"));
        assert_eq!(wire.len(), 7);
    }

    #[test]
    fn test_sensitive_document_properties() {
        let verdict = Verdict::from_chunk_detections(vec![
            (0, vec![EntityType::UsSsn]),
            (2, vec![EntityType::EmailAddress, EntityType::PhoneNumber]),
        ]);
        let props = DocumentProperties::build(3, &meta(), &verdict, 10);

        assert_eq!(props.get(PropertyKey::PiiDetected), Some("True"));
        assert_eq!(props.get(PropertyKey::RiskLevel), Some("HIGH"));
        assert_eq!(
            props.get(PropertyKey::PiiAuditLog),
            Some("Chunk 0: US_SSN | Chunk 2: EMAIL_ADDRESS, PHONE_NUMBER")
        );
    }

    #[test]
    fn test_audit_log_truncated_in_order() {
        let detections: Vec<(usize, Vec<EntityType>)> =
            (0..15).map(|i| (i, vec![EntityType::EmailAddress])).collect();
        let verdict = Verdict::from_chunk_detections(detections);
        assert_eq!(verdict.audit_entries().len(), 15);

        let props = DocumentProperties::build(15, &meta(), &verdict, 10);
        let log = props.get(PropertyKey::PiiAuditLog).unwrap();
        let entries: Vec<&str> = log.split(AUDIT_LOG_SEPARATOR).collect();

        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0], "Chunk 0: EMAIL_ADDRESS");
        assert_eq!(entries[9], "Chunk 9: EMAIL_ADDRESS");
    }

    #[test]
    fn test_zero_chunks_quality() {
        let props = DocumentProperties::build(0, &SystemMetadata::default(), &Verdict::clean(), 10);
        assert_eq!(props.get(PropertyKey::QualityScore), Some("0"));
        assert_eq!(props.get(PropertyKey::ChunkCount), Some("0"));
    }
}
