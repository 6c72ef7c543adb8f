// SheetTriage - platform/fs.rs
//
// File-system helpers for the export step: output directory creation,
// atomic file writes and file-name sanitising.

use crate::util::error::ExportError;
use std::path::Path;

/// Write `bytes` to `path` atomically (write temp → rename).
///
/// Creates the parent directory as needed. A crash between write and rename
/// leaves at most a stray `.tmp` sibling, never a truncated export.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp_name);

    std::fs::write(&tmp, bytes).map_err(|e| ExportError::Io {
        path: tmp.clone(),
        source: e,
    })?;

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        ExportError::Io {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "File written");
    Ok(())
}

/// Make an arbitrary cell value safe to use as a file-name stem.
///
/// Path separators, reserved characters and control characters become `_`;
/// surrounding whitespace and dots are trimmed. Empty input yields "vazio".
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if cleaned.is_empty() {
        "vazio".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("RELIGAÇÃO"), "RELIGAÇÃO");
        assert_eq!(sanitize_file_stem("CORTE/RELIGA: URGENTE"), "CORTE_RELIGA_ URGENTE");
        assert_eq!(sanitize_file_stem(" ..\t"), "vazio");
        assert_eq!(sanitize_file_stem(""), "vazio");
    }

    #[test]
    fn test_write_atomic_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.xlsx");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("nested").join("out.xlsx.tmp").exists());
    }
}
