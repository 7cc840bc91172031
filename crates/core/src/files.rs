//! Whole-file reads and atomic whole-file writes.
//!
//! Every document in the vault is read fully into memory, transformed, and written back
//! in one piece. Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so an interrupted run leaves either the old or the new
//! content on disk, never a mix.

use crate::{MinutesError, MinutesResult};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Reads a document that must exist.
///
/// # Errors
///
/// Returns [`MinutesError::DocumentNotFound`] if the file does not exist and
/// [`MinutesError::FileRead`] for any other I/O failure.
pub fn read_document(path: &Path) -> MinutesResult<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(MinutesError::DocumentNotFound(path.to_path_buf()))
        }
        Err(e) => Err(MinutesError::FileRead(e)),
    }
}

/// Reads a document that may legitimately be absent.
pub fn read_optional(path: &Path) -> MinutesResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MinutesError::FileRead(e)),
    }
}

/// Replaces the full content of `path` with `content`.
///
/// Parent directories are created when missing.
pub fn write_atomic(path: &Path, content: &str) -> MinutesResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(MinutesError::DirCreation)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(MinutesError::FileWrite)?;
    tmp.write_all(content.as_bytes())
        .map_err(MinutesError::FileWrite)?;
    tmp.as_file().sync_all().map_err(MinutesError::FileWrite)?;
    tmp.persist(path)
        .map_err(|e| MinutesError::FileWrite(e.error))?;

    tracing::debug!("wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents_and_replaces() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a/b/doc.md");

        write_atomic(&path, "first\n").unwrap();
        write_atomic(&path, "second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(leftovers.len(), 1, "temporary file should be renamed away");
    }

    #[test]
    fn test_read_document_missing_is_document_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing.md");
        assert!(matches!(
            read_document(&path),
            Err(MinutesError::DocumentNotFound(p)) if p == path
        ));
        assert!(read_optional(&path).unwrap().is_none());
    }
}
