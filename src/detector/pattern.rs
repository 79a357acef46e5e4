//! Pattern-based entity detector
//!
//! Each entity type has a compiled pattern, a base confidence, and an
//! optional checksum validator. Candidates failing validation are dropped;
//! candidates passing it are reported with the validated confidence.

use super::EntityDetector;
use crate::error::{GovernError, Result};
use crate::types::{EntityType, Finding};
use async_trait::async_trait;
use regex::Regex;

type Validator = fn(&str) -> bool;

struct Rule {
    entity_type: EntityType,
    regex: Regex,
    confidence: f64,
    validator: Option<Validator>,
}

/// Built-in detector for the default entity set (English only)
///
/// Digit classes are ASCII-only; validators slice candidates by byte.
pub struct RegexDetector {
    rules: Vec<Rule>,
}

impl RegexDetector {
    /// Create a detector with the default patterns
    pub fn new() -> Result<Self> {
        let specs: [(EntityType, &str, f64, Option<Validator>); 5] = [
            (
                EntityType::EmailAddress,
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                1.0,
                None,
            ),
            (
                EntityType::PhoneNumber,
                r"(?:\+1[-.\s]?)?(?:\([0-9]{3}\)\s?|\b[0-9]{3}[-.\s])[0-9]{3}[-.\s][0-9]{4}\b",
                0.4,
                None,
            ),
            (
                EntityType::UsSsn,
                r"\b[0-9]{3}-[0-9]{2}-[0-9]{4}\b",
                0.85,
                Some(valid_ssn),
            ),
            (
                EntityType::CreditCard,
                r"\b(?:[0-9][ -]?){12,18}[0-9]\b",
                1.0,
                Some(luhn_valid),
            ),
            (
                EntityType::IbanCode,
                r"\b[A-Z]{2}[0-9]{2}(?: ?[A-Z0-9]{4}){2,7}(?: ?[A-Z0-9]{1,3})?\b",
                1.0,
                Some(iban_valid),
            ),
        ];

        let rules = specs
            .into_iter()
            .map(|(entity_type, pattern, confidence, validator)| {
                let regex = Regex::new(pattern).map_err(|e| {
                    GovernError::Detector(format!("Invalid pattern for {}: {}", entity_type, e))
                })?;
                Ok(Rule {
                    entity_type,
                    regex,
                    confidence,
                    validator,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }
}

#[async_trait]
impl EntityDetector for RegexDetector {
    async fn analyze(
        &self,
        text: &str,
        entities: &[EntityType],
        language: &str,
    ) -> Result<Vec<Finding>> {
        if !language.eq_ignore_ascii_case("en") {
            return Err(GovernError::Detector(format!(
                "Unsupported language '{}'",
                language
            )));
        }

        let mut findings = Vec::new();
        for rule in self.rules.iter().filter(|r| entities.contains(&r.entity_type)) {
            for mat in rule.regex.find_iter(text) {
                let valid = rule.validator.map_or(true, |v| v(mat.as_str()));
                if valid {
                    findings.push(Finding::new(rule.entity_type, rule.confidence));
                }
            }
        }
        Ok(findings)
    }

    fn name(&self) -> &str {
        "regex"
    }
}

/// Reject structurally impossible SSNs (area 000/666/9xx, group 00, serial 0000)
fn valid_ssn(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 9 {
        return false;
    }
    let area = digits[0] * 100 + digits[1] * 10 + digits[2];
    let group = digits[3] * 10 + digits[4];
    let serial = digits[5..].iter().fold(0, |acc, d| acc * 10 + d);
    area != 0 && area != 666 && area < 900 && group != 0 && serial != 0
}

/// Luhn checksum over the digits of a card candidate
fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// ISO 13616 mod-97 check
fn iban_valid(candidate: &str) -> bool {
    let compact: String = candidate.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return false;
    }
    if !(15..=34).contains(&compact.len()) {
        return false;
    }
    let (head, tail) = compact.split_at(4);
    let mut remainder: u64 = 0;
    for c in tail.chars().chain(head.chars()) {
        let value = match c.to_digit(36) {
            Some(v) => v as u64,
            None => return false,
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }
    remainder == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn detect(text: &str) -> Vec<EntityType> {
        let detector = RegexDetector::new().unwrap();
        detector
            .analyze(text, &EntityType::ALL, "en")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.entity_type)
            .collect()
    }

    #[tokio::test]
    async fn test_detects_ssn() {
        let types = detect("John Smith, SSN 078-05-1120").await;
        assert_eq!(types, vec![EntityType::UsSsn]);
    }

    #[tokio::test]
    async fn test_rejects_impossible_ssn() {
        assert!(detect("ref 000-12-3456").await.is_empty());
        assert!(detect("ref 666-12-3456").await.is_empty());
        assert!(detect("ref 123-00-3456").await.is_empty());
    }

    #[tokio::test]
    async fn test_detects_email_and_phone() {
        let types = detect("Reach jane.doe@example.com or (555) 123-4567").await;
        assert!(types.contains(&EntityType::EmailAddress));
        assert!(types.contains(&EntityType::PhoneNumber));
    }

    #[tokio::test]
    async fn test_credit_card_requires_luhn() {
        assert_eq!(
            detect("Card: 4111 1111 1111 1111").await,
            vec![EntityType::CreditCard]
        );
        assert!(!detect("Order 4111 1111 1111 1112").await.contains(&EntityType::CreditCard));
    }

    #[tokio::test]
    async fn test_detects_iban() {
        let types = detect("Pay to GB82 WEST 1234 5698 7654 32 today").await;
        assert!(types.contains(&EntityType::IbanCode));
        assert!(!detect("Pay to GB00 WEST 1234 5698 7654 32").await.contains(&EntityType::IbanCode));
    }

    #[tokio::test]
    async fn test_non_ascii_digits_are_ignored() {
        let types = detect("Transfer to GB\u{0969}3 WEST 1234 5698 7654 32 today").await;
        assert!(!types.contains(&EntityType::IbanCode));
        assert!(detect("SSN \u{0660}78-05-1120").await.is_empty());
        assert!(detect("Card \u{0967}111 1111 1111 1111").await.is_empty());
    }

    #[tokio::test]
    async fn test_clean_text() {
        assert!(detect("General usage guidelines for employees.").await.is_empty());
    }

    #[tokio::test]
    async fn test_respects_requested_entities() {
        let detector = RegexDetector::new().unwrap();
        let findings = detector
            .analyze(
                "jane@example.com 078-05-1120",
                &[EntityType::EmailAddress],
                "en",
            )
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].entity_type, EntityType::EmailAddress);
    }

    #[tokio::test]
    async fn test_unsupported_language_errors() {
        let detector = RegexDetector::new().unwrap();
        let result = detector.analyze("hola", &EntityType::ALL, "es").await;
        assert!(matches!(result, Err(GovernError::Detector(_))));
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4111111111111111"));
        assert!(luhn_valid("5500-0000-0000-0004"));
        assert!(!luhn_valid("4111111111111112"));
        assert!(!luhn_valid("1234"));
    }

    #[test]
    fn test_iban_checksum() {
        assert!(iban_valid("GB82WEST12345698765432"));
        assert!(iban_valid("DE89 3704 0044 0532 0130 00"));
        assert!(!iban_valid("DE89 3704 0044 0532 0130 01"));
        assert!(!iban_valid("GB\u{0969}3WEST12345698765432"));
    }
}
