use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregator::PiiAggregator;
use crate::config::GovernConfig;
use crate::detector::RegexDetector;
use crate::error::Result;
use crate::extract::{Extractor, TextExtractor};
use crate::router::{self, Collections};
use crate::types::{Destination, Finding, Verdict};

/// Classification of a single file, as printed by `scan`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub file: String,
    pub chunk_count: usize,
    pub verdict: Verdict,
    pub destination: Destination,
    pub collection: String,
    pub findings: Vec<Finding>,
}

/// Execute the `scan` command: extract, classify, and route one file.
pub async fn execute(config: &GovernConfig, file: &Path) -> Result<ScanResult> {
    let chunks = TextExtractor::new().extract(file).await?;
    let aggregator = PiiAggregator::new(Arc::new(RegexDetector::new()?), config.detection.clone());
    let assessment = aggregator.assess(&chunks).await;

    let destination = router::route(&assessment.verdict).destination;
    let collections = Collections::from(&config.routing);
    let result = ScanResult {
        file: file.display().to_string(),
        chunk_count: chunks.len(),
        verdict: assessment.verdict,
        destination,
        collection: collections.name(destination).to_string(),
        findings: assessment.findings,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_routes_sensitive_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offer.txt");
        std::fs::write(&path, "Offer letter\n\nJohn Smith, SSN 078-05-1120").unwrap();

        let result = execute(&GovernConfig::default(), &path).await.unwrap();
        assert_eq!(result.chunk_count, 2);
        assert_eq!(result.destination, Destination::Secure);
        assert_eq!(result.collection, "secure_restricted_index");
        assert!(result.verdict.audit_entries()[0].starts_with("Chunk 1:"));
    }
}
