//! Pipeline configuration
//!
//! `GovernConfig` is built once at startup (TOML file, then environment
//! overrides, then validation) and passed by reference to every component.

use crate::error::{GovernError, Result};
use crate::retry::RetryConfig;
use crate::types::EntityType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `catalog.gms_url`
pub const ENV_CATALOG_URL: &str = "DATAHUB_API_URL";
/// Environment variable overriding `catalog.token`
pub const ENV_CATALOG_TOKEN: &str = "DATAHUB_ACCESS_TOKEN";
/// Environment variable overriding `data_dir`
pub const ENV_DATA_DIR: &str = "A3S_GOVERN_DATA_DIR";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernConfig {
    /// Root directory scanned for source documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Accepted file extensions (with leading dot, case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Documents processed in parallel (1 = serial)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Emit catalog metadata even when the storage write failed
    #[serde(default = "default_true")]
    pub govern_on_storage_failure: bool,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Entity detection and aggregation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum confidence for a finding to count (inclusive)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Maximum characters handed to the detector in one call
    #[serde(default = "default_max_segment_chars")]
    pub max_segment_chars: usize,

    /// Trimmed inputs shorter than this skip detection entirely
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_entities")]
    pub entities: Vec<EntityType>,
}

/// Destination collection names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_public_collection")]
    pub public_collection: String,

    #[serde(default = "default_secure_collection")]
    pub secure_collection: String,
}

/// Metadata catalog endpoint and governance identities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// DataHub GMS base URL
    #[serde(default = "default_gms_url")]
    pub gms_url: String,

    /// Bearer token (optional for unauthenticated local GMS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Owner assigned to destination entities
    #[serde(default = "default_steward")]
    pub steward: String,

    /// Actor stamped on lineage edges
    #[serde(default = "default_pipeline_actor")]
    pub pipeline_actor: String,

    #[serde(default = "default_sensitive_term")]
    pub sensitive_term: String,

    #[serde(default = "default_pii_tag")]
    pub pii_tag: String,

    /// Maximum audit entries published in `pii_audit_log`
    #[serde(default = "default_audit_log_limit")]
    pub audit_log_limit: usize,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Local destination store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/source")
}

fn default_extensions() -> Vec<String> {
    [".pdf", ".csv", ".txt", ".docx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_concurrency() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_confidence_threshold() -> f64 {
    0.4
}

fn default_max_segment_chars() -> usize {
    500_000
}

fn default_min_text_chars() -> usize {
    5
}

fn default_language() -> String {
    "en".to_string()
}

fn default_entities() -> Vec<EntityType> {
    EntityType::ALL.to_vec()
}

fn default_public_collection() -> String {
    "public_knowledge_base".to_string()
}

fn default_secure_collection() -> String {
    "secure_restricted_index".to_string()
}

fn default_gms_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_steward() -> String {
    "urn:li:corpuser:admin".to_string()
}

fn default_pipeline_actor() -> String {
    "urn:li:corpuser:ingestion-script".to_string()
}

fn default_sensitive_term() -> String {
    "urn:li:glossaryTerm:Classification.Sensitive".to_string()
}

fn default_pii_tag() -> String {
    "urn:li:tag:PII".to_string()
}

fn default_audit_log_limit() -> usize {
    10
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./vector_store")
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_segment_chars: default_max_segment_chars(),
            min_text_chars: default_min_text_chars(),
            language: default_language(),
            entities: default_entities(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            public_collection: default_public_collection(),
            secure_collection: default_secure_collection(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            gms_url: default_gms_url(),
            token: None,
            timeout_ms: default_timeout_ms(),
            steward: default_steward(),
            pipeline_actor: default_pipeline_actor(),
            sensitive_term: default_sensitive_term(),
            pii_tag: default_pii_tag(),
            audit_log_limit: default_audit_log_limit(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for GovernConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            extensions: default_extensions(),
            concurrency: default_concurrency(),
            govern_on_storage_failure: true,
            detection: DetectionConfig::default(),
            routing: RoutingConfig::default(),
            catalog: CatalogConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl GovernConfig {
    /// Load configuration from a TOML file.
    /// Returns the default config when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            GovernError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from an explicit set of environment variables.
    ///
    /// Callers pass `std::env::vars()`; tests pass a fixed list.
    pub fn with_env_overrides<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value = value.into();
            if value.trim().is_empty() {
                continue;
            }
            match key.as_ref() {
                ENV_CATALOG_URL => self.catalog.gms_url = value,
                ENV_CATALOG_TOKEN => self.catalog.token = Some(value),
                ENV_DATA_DIR => self.data_dir = PathBuf::from(value),
                _ => {}
            }
        }
        self
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let url = self.catalog.gms_url.trim();
        if url.is_empty() {
            return Err(GovernError::Config("catalog.gms_url is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(GovernError::Config(format!(
                "catalog.gms_url must be an http(s) URL, got '{}'",
                url
            )));
        }

        let threshold = self.detection.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(GovernError::Config(format!(
                "detection.confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.detection.max_segment_chars == 0 {
            return Err(GovernError::Config(
                "detection.max_segment_chars must be > 0".to_string(),
            ));
        }
        if self.detection.entities.is_empty() {
            return Err(GovernError::Config(
                "detection.entities must name at least one entity type".to_string(),
            ));
        }

        let public = self.routing.public_collection.trim();
        let secure = self.routing.secure_collection.trim();
        if public.is_empty() || secure.is_empty() {
            return Err(GovernError::Config(
                "routing collections must be non-empty".to_string(),
            ));
        }
        if public == secure {
            return Err(GovernError::Config(format!(
                "public and secure collections must differ, both are '{}'",
                public
            )));
        }

        if self.catalog.audit_log_limit == 0 {
            return Err(GovernError::Config(
                "catalog.audit_log_limit must be > 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(GovernError::Config("concurrency must be > 0".to_string()));
        }

        Ok(())
    }

    /// Extensions normalized to lower case with a leading dot
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| {
                let e = e.trim().to_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{}", e)
                }
            })
            .collect()
    }
}
