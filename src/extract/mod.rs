//! Text extraction
//!
//! An `Extractor` turns a file into an ordered list of text chunks. An
//! empty list means "nothing extractable" and is not an error; the
//! pipeline skips such documents. A file that cannot be read or parsed
//! is an `Extraction` error.

use crate::error::{GovernError, Result};
use async_trait::async_trait;
use std::path::Path;

pub mod docx;
pub mod pdf;

/// Core trait for extraction backends
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract ordered text chunks from a file
    async fn extract(&self, path: &Path) -> Result<Vec<String>>;

    /// Extractor name (e.g., "text")
    fn name(&self) -> &str;
}

/// Built-in extractor
///
/// - `.txt` / `.md` / `.pdf`: one chunk per blank-line separated paragraph
/// - `.docx`: one chunk per non-empty body paragraph
/// - `.csv`: one chunk per non-empty row
///
/// Other formats yield no chunks and a warning.
#[derive(Debug, Default, Clone)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Split text into paragraphs on blank lines
    pub fn paragraphs(text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    chunks.push(current.join("\n"));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            chunks.push(current.join("\n"));
        }
        chunks
    }

    /// Split CSV text into one chunk per row
    pub fn rows(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !matches!(extension.as_str(), "txt" | "md" | "csv" | "pdf" | "docx") {
            tracing::warn!(
                path = %path.display(),
                extension = %extension,
                "No extractor for file type, treating as empty"
            );
            return Ok(Vec::new());
        }

        let fail = |reason: String| GovernError::Extraction {
            path: path.display().to_string(),
            reason,
        };
        let bytes = tokio::fs::read(path).await.map_err(|e| fail(e.to_string()))?;

        let chunks = match extension.as_str() {
            "pdf" => Self::paragraphs(&pdf::extract_text(bytes).await.map_err(fail)?),
            "docx" => docx::paragraphs(&bytes).map_err(fail)?,
            "csv" => Self::rows(&String::from_utf8_lossy(&bytes)),
            _ => Self::paragraphs(&String::from_utf8_lossy(&bytes)),
        };
        tracing::debug!(
            path = %path.display(),
            chunks = chunks.len(),
            "Extracted"
        );
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "text"
    }
}
