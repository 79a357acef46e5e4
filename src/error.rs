//! Error types for a3s-govern

use crate::emitter::EmissionStep;
use thiserror::Error;

/// Errors that can occur while classifying, storing, or governing documents
#[derive(Debug, Error)]
pub enum GovernError {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Text extraction failure for a single file
    #[error("Failed to extract text from '{path}': {reason}")]
    Extraction { path: String, reason: String },

    /// Entity detector failure on a single text segment
    #[error("Detector error: {0}")]
    Detector(String),

    /// Destination store write failure
    #[error("Failed to write to collection '{collection}': {reason}")]
    Storage { collection: String, reason: String },

    /// Catalog rejected a mutation
    #[error("Catalog rejected mutation for '{urn}' (status {status}): {body}")]
    Catalog {
        urn: String,
        status: u16,
        body: String,
    },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML configuration parse failure
    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// A single failed step of the metadata emission protocol
#[derive(Debug)]
pub struct StepFailure {
    /// Which protocol step failed
    pub step: EmissionStep,

    /// Entity the step targeted
    pub urn: String,

    /// Underlying cause
    pub error: GovernError,
}

/// Aggregate error returned when one or more emission steps failed
///
/// Steps are attempted independently, so this carries every failure
/// for the document, in protocol order.
#[derive(Debug, Error)]
#[error("{} of the metadata emission steps failed: {}", .failures.len(), summarize(.failures))]
pub struct EmissionError {
    pub failures: Vec<StepFailure>,
}

impl EmissionError {
    /// Steps that failed, in protocol order
    pub fn failed_steps(&self) -> Vec<EmissionStep> {
        self.failures.iter().map(|f| f.step).collect()
    }
}

fn summarize(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} on {}: {}", f.step, f.urn, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for governance operations
pub type Result<T> = std::result::Result<T, GovernError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = GovernError::Storage {
            collection: "secure_restricted_index".to_string(),
            reason: "disk full".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Failed to write to collection 'secure_restricted_index': disk full"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let e: GovernError = io_err.into();
        assert!(e.to_string().contains("not found"));
    }

    #[test]
    fn test_emission_error_lists_every_step() {
        let err = EmissionError {
            failures: vec![
                StepFailure {
                    step: EmissionStep::Ownership,
                    urn: "urn:a".to_string(),
                    error: GovernError::Detector("x".to_string()),
                },
                StepFailure {
                    step: EmissionStep::Properties,
                    urn: "urn:b".to_string(),
                    error: GovernError::Catalog {
                        urn: "urn:b".to_string(),
                        status: 500,
                        body: "boom".to_string(),
                    },
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.starts_with("2 of the metadata emission steps failed"));
        assert!(msg.contains("ownership on urn:a"));
        assert!(msg.contains("properties on urn:b"));
        assert_eq!(
            err.failed_steps(),
            vec![EmissionStep::Ownership, EmissionStep::Properties]
        );
    }
}
