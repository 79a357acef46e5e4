//! Deterministic URN derivation
//!
//! URNs are derived, never stored: the same relative path or collection
//! name always yields the same URN, on every platform.

/// URN of a source document, keyed by its path relative to the data dir
pub fn source_urn(rel_path: &str) -> String {
    let clean = rel_path.replace('\\', "/");
    format!(
        "urn:li:dataset:(urn:li:dataPlatform:external,file://{},PROD)",
        clean
    )
}

/// URN of a destination collection
pub fn destination_urn(collection: &str) -> String {
    format!(
        "urn:li:dataset:(urn:li:dataPlatform:pinecone,{},PROD)",
        collection
    )
}

/// Escape a JSON-Pointer path segment (RFC 6901)
pub fn escape_path_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_urn() {
        assert_eq!(
            source_urn("hr/candidate_01.pdf"),
            "urn:li:dataset:(urn:li:dataPlatform:external,file://hr/candidate_01.pdf,PROD)"
        );
    }

    #[test]
    fn test_source_urn_normalizes_backslashes() {
        assert_eq!(source_urn("hr\\candidate_01.pdf"), source_urn("hr/candidate_01.pdf"));
    }

    #[test]
    fn test_destination_urn() {
        assert_eq!(
            destination_urn("secure_restricted_index"),
            "urn:li:dataset:(urn:li:dataPlatform:pinecone,secure_restricted_index,PROD)"
        );
    }

    #[test]
    fn test_escape_path_segment() {
        assert_eq!(escape_path_segment("a/b~c"), "a~1b~0c");
        assert_eq!(escape_path_segment("plain"), "plain");
        // "~" escaped first so "/" → "~1" is not double-escaped
        assert_eq!(escape_path_segment("~/"), "~0~1");
    }
}
