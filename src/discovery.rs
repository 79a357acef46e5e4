//! Source document discovery and file-system provenance

use crate::error::{GovernError, Result};
use crate::types::{DocumentRef, SystemMetadata};
use chrono::{DateTime, Local};
use std::path::Path;
use walkdir::WalkDir;

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Recursively find files under `root` whose extension is in `extensions`.
///
/// `extensions` are lower-case with a leading dot. Results are sorted by
/// relative path; relative paths always use `/` separators. Unreadable
/// entries are logged and skipped.
pub fn discover(root: &Path, extensions: &[String]) -> Result<Vec<DocumentRef>> {
    if !root.is_dir() {
        return Err(GovernError::Config(format!(
            "data directory does not exist: {}",
            root.display()
        )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !extensions.contains(&extension_of(entry.path())) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel_path = rel.to_string_lossy().replace('\\', "/");
        documents.push(DocumentRef::new(entry.path(), rel_path));
    }

    documents.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    tracing::debug!(
        root = %root.display(),
        count = documents.len(),
        "Discovery complete"
    );
    Ok(documents)
}

/// Lower-cased extension with a leading dot, or "" when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Capture size, creation time, and extension of a file
pub fn system_metadata(path: &Path) -> Result<SystemMetadata> {
    let metadata = std::fs::metadata(path)?;
    let created = metadata.created().or_else(|_| metadata.modified())?;
    let created: DateTime<Local> = created.into();

    Ok(SystemMetadata {
        file_size_kb: format_size_kb(metadata.len()),
        created_at: created.format(CREATED_AT_FORMAT).to_string(),
        extension: extension_of(path),
    })
}

/// Size in KiB rounded to two decimals, always with a fractional part
pub fn format_size_kb(bytes: u64) -> String {
    let kb = (bytes as f64 / 1024.0 * 100.0).round() / 100.0;
    let rendered = kb.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec![".txt".to_string(), ".csv".to_string(), ".pdf".to_string()]
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("hr/2024")).unwrap();
        std::fs::write(dir.path().join("z.txt"), "z").unwrap();
        std::fs::write(dir.path().join("hr/2024/payroll.CSV"), "a,b").unwrap();
        std::fs::write(dir.path().join("hr/notes.txt"), "n").unwrap();
        std::fs::write(dir.path().join("image.png"), "x").unwrap();

        let docs = discover(dir.path(), &exts()).unwrap();
        let rel: Vec<&str> = docs.iter().map(|d| d.rel_path.as_str()).collect();
        assert_eq!(rel, vec!["hr/2024/payroll.CSV", "hr/notes.txt", "z.txt"]);
        assert!(docs[0].full_path.ends_with("hr/2024/payroll.CSV"));
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), &exts()).unwrap().is_empty());
    }

    #[test]
    fn test_discover_missing_root() {
        let err = discover(Path::new("/nonexistent/data"), &exts()).unwrap_err();
        assert!(matches!(err, GovernError::Config(_)));
    }

    #[test]
    fn test_format_size_kb() {
        assert_eq!(format_size_kb(0), "0.0");
        assert_eq!(format_size_kb(1024), "1.0");
        assert_eq!(format_size_kb(1536), "1.5");
        assert_eq!(format_size_kb(12_636), "12.34");
        assert_eq!(format_size_kb(100), "0.1");
    }

    #[test]
    fn test_system_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Report.PDF");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let meta = system_metadata(&path).unwrap();
        assert_eq!(meta.file_size_kb, "2.0");
        assert_eq!(meta.extension, ".pdf");
        assert!(chrono::NaiveDateTime::parse_from_str(&meta.created_at, CREATED_AT_FORMAT).is_ok());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b.TxT")), ".txt");
        assert_eq!(extension_of(Path::new("Makefile")), "");
    }
}
