//! PII aggregation: many per-chunk detector results into one verdict
//!
//! Policy applied here, not in the detector:
//!
//! - chunks whose trimmed text is shorter than `min_text_chars` are never
//!   sent to the detector
//! - chunks longer than `max_segment_chars` are split into fixed-size
//!   sub-segments, each analyzed independently (a finding straddling a
//!   split may be missed; accepted precision loss)
//! - findings below `confidence_threshold` are discarded (the threshold
//!   itself is inclusive), as are NaN or out-of-range confidences
//! - a detector error on one segment counts as zero findings for that
//!   segment and never aborts the document

use crate::config::DetectionConfig;
use crate::detector::EntityDetector;
use crate::types::{EntityType, Finding, Verdict};
use serde::Serialize;
use std::sync::Arc;

/// Full aggregation output: the verdict plus the evidence behind it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub verdict: Verdict,

    /// Accepted findings in discovery order, tagged with their chunk index
    pub findings: Vec<Finding>,

    /// Number of detector calls made
    pub detector_calls: usize,

    /// Number of segments whose detector call failed
    pub failed_segments: usize,
}

/// Merges detector findings across all chunks of a document
pub struct PiiAggregator {
    detector: Arc<dyn EntityDetector>,
    policy: DetectionConfig,
}

impl PiiAggregator {
    pub fn new(detector: Arc<dyn EntityDetector>, policy: DetectionConfig) -> Self {
        Self { detector, policy }
    }

    /// Aggregate chunks into a document-level verdict
    pub async fn aggregate<S: AsRef<str>>(&self, chunks: &[S]) -> Verdict {
        self.assess(chunks).await.verdict
    }

    /// Aggregate chunks, keeping the accepted findings and failure counts
    pub async fn assess<S: AsRef<str>>(&self, chunks: &[S]) -> Assessment {
        let mut findings = Vec::new();
        let mut detections = Vec::with_capacity(chunks.len());
        let mut detector_calls = 0;
        let mut failed_segments = 0;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let text = chunk.as_ref();
            let mut chunk_types: Vec<EntityType> = Vec::new();

            if text.trim().chars().count() < self.policy.min_text_chars {
                detections.push((chunk_index, chunk_types));
                continue;
            }

            for (segment_index, segment) in
                split_segments(text, self.policy.max_segment_chars).enumerate()
            {
                detector_calls += 1;
                let result = self
                    .detector
                    .analyze(segment, &self.policy.entities, &self.policy.language)
                    .await;

                match result {
                    Ok(segment_findings) => {
                        for mut finding in segment_findings {
                            if !self.accepts(finding.confidence) {
                                continue;
                            }
                            if !chunk_types.contains(&finding.entity_type) {
                                chunk_types.push(finding.entity_type);
                            }
                            finding.chunk_index = chunk_index;
                            findings.push(finding);
                        }
                    }
                    Err(e) => {
                        failed_segments += 1;
                        tracing::warn!(
                            detector = self.detector.name(),
                            chunk = chunk_index,
                            segment = segment_index,
                            error = %e,
                            "Detector failed on segment, treating as no findings"
                        );
                    }
                }
            }

            detections.push((chunk_index, chunk_types));
        }

        let verdict = Verdict::from_chunk_detections(detections);
        tracing::debug!(
            chunks = chunks.len(),
            detector_calls,
            failed_segments,
            sensitive = verdict.has_sensitive_data(),
            "Aggregation complete"
        );

        Assessment {
            verdict,
            findings,
            detector_calls,
            failed_segments,
        }
    }

    /// Confidence must be a probability at or above the threshold; NaN never passes
    fn accepts(&self, confidence: f64) -> bool {
        (0.0..=1.0).contains(&confidence) && confidence >= self.policy.confidence_threshold
    }
}

/// Split text into consecutive segments of at most `max_chars` characters.
///
/// Splits always fall on char boundaries.
pub fn split_segments(text: &str, max_chars: usize) -> impl Iterator<Item = &str> {
    let max_chars = max_chars.max(1);
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (segment, tail) = rest.split_at(end);
        rest = tail;
        Some(segment)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GovernError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted detector: returns findings keyed by a marker substring
    struct ScriptedDetector {
        rules: Vec<(&'static str, EntityType, f64)>,
        fail_on: Option<&'static str>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedDetector {
        fn new(rules: Vec<(&'static str, EntityType, f64)>) -> Self {
            Self {
                rules,
                fail_on: None,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EntityDetector for ScriptedDetector {
        async fn analyze(
            &self,
            text: &str,
            _entities: &[EntityType],
            _language: &str,
        ) -> Result<Vec<Finding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            if let Some(marker) = self.fail_on {
                if text.contains(marker) {
                    return Err(GovernError::Detector("engine crashed".to_string()));
                }
            }
            Ok(self
                .rules
                .iter()
                .filter(|(marker, _, _)| text.contains(marker))
                .map(|(_, t, c)| Finding::new(*t, *c))
                .collect())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn aggregator(detector: Arc<ScriptedDetector>) -> PiiAggregator {
        PiiAggregator::new(detector, DetectionConfig::default())
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let detector = Arc::new(ScriptedDetector::new(vec![
            ("exact", EntityType::PhoneNumber, 0.4),
            ("below", EntityType::EmailAddress, 0.39999),
        ]));
        let verdict = aggregator(detector)
            .aggregate(&["exact match here", "below the line"])
            .await;

        assert!(verdict.has_sensitive_data());
        assert_eq!(
            verdict.unique_entity_types().iter().copied().collect::<Vec<_>>(),
            vec![EntityType::PhoneNumber]
        );
        assert_eq!(verdict.audit_entries(), &["Chunk 0: PHONE_NUMBER"]);
    }

    #[tokio::test]
    async fn test_invalid_confidence_is_discarded() {
        let detector = Arc::new(ScriptedDetector::new(vec![
            ("nan", EntityType::UsSsn, f64::NAN),
            ("over", EntityType::CreditCard, 1.5),
            ("under", EntityType::IbanCode, -0.2),
            ("inf", EntityType::PhoneNumber, f64::INFINITY),
        ]));
        let assessment = aggregator(detector)
            .assess(&["nan score here", "over the top", "under zero", "inf value"])
            .await;

        assert!(!assessment.verdict.has_sensitive_data());
        assert!(assessment.verdict.audit_entries().is_empty());
        assert!(assessment.findings.is_empty());
    }

    #[tokio::test]
    async fn test_short_input_skips_detector() {
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let assessment = aggregator(detector.clone())
            .assess(&["", "   ", "abcd", " \n\t "])
            .await;

        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
        assert_eq!(assessment.detector_calls, 0);
        assert!(!assessment.verdict.has_sensitive_data());
    }

    #[tokio::test]
    async fn test_dedup_across_chunks_keeps_audit_positions() {
        let detector = Arc::new(ScriptedDetector::new(vec![
            ("ssn", EntityType::UsSsn, 0.9),
            ("mail", EntityType::EmailAddress, 1.0),
        ]));
        let assessment = aggregator(detector)
            .assess(&["has ssn and mail", "nothing at all", "another ssn ssn"])
            .await;

        let verdict = &assessment.verdict;
        assert_eq!(verdict.unique_entity_types().len(), 2);
        assert_eq!(
            verdict.audit_entries(),
            &["Chunk 0: US_SSN, EMAIL_ADDRESS", "Chunk 2: US_SSN"]
        );
        assert_eq!(assessment.findings.len(), 3);
        assert_eq!(assessment.findings[2].chunk_index, 2);
    }

    #[tokio::test]
    async fn test_detector_failure_is_contained() {
        let mut scripted = ScriptedDetector::new(vec![("4111", EntityType::CreditCard, 1.0)]);
        scripted.fail_on = Some("boom");
        let detector = Arc::new(scripted);

        let assessment = aggregator(detector.clone())
            .assess(&["plain opening text", "boom goes the engine", "card 4111 1111"])
            .await;

        assert_eq!(detector.calls.load(Ordering::SeqCst), 3);
        assert_eq!(assessment.failed_segments, 1);
        assert!(assessment.verdict.has_sensitive_data());
        assert_eq!(assessment.verdict.audit_entries(), &["Chunk 2: CREDIT_CARD"]);
    }

    #[tokio::test]
    async fn test_oversized_chunk_is_split() {
        let detector = Arc::new(ScriptedDetector::new(vec![("tail", EntityType::IbanCode, 1.0)]));
        let policy = DetectionConfig {
            max_segment_chars: 10,
            ..Default::default()
        };
        let aggregator = PiiAggregator::new(detector.clone(), policy);

        let text = format!("{}tail", "x".repeat(26));
        let verdict = aggregator.aggregate(&[text]).await;

        let seen = detector.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|s| s.chars().count() <= 10));
        assert!(verdict.has_sensitive_data());
        assert_eq!(verdict.audit_entries(), &["Chunk 0: IBAN_CODE"]);
    }

    #[test]
    fn test_split_segments_char_boundaries() {
        let text = "ééééé";
        let parts: Vec<&str> = split_segments(text, 2).collect();
        assert_eq!(parts, vec!["éé", "éé", "é"]);
        assert_eq!(split_segments("", 5).count(), 0);
        assert_eq!(split_segments("abc", 500_000).collect::<Vec<_>>(), vec!["abc"]);
    }
}
