//! Destination directory bootstrap and per-part persistence.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ExtractError, Result};
use crate::model::part::PartBody;

/// Create the output directory if missing; optionally clear its contents
/// first (files and subdirectories).
///
/// Individual removal failures during clearing are logged and do not stop
/// the setup; a directory that cannot be created at all is fatal.
pub fn ensure_output_dir(dir: &Path, clear: bool) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ExtractError::io(dir, e))?;
        return Ok(());
    }

    if clear {
        let entries = std::fs::read_dir(dir).map_err(|e| ExtractError::io(dir, e))?;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Failed to list entry while clearing");
                    continue;
                }
            };
            let path = entry.path();
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            if let Err(e) = removed {
                warn!(path = %path.display(), error = %e, "Failed to remove entry while clearing");
            }
        }
    }

    Ok(())
}

/// Probe that the destination accepts writes. Fatal at setup when it does not.
pub fn check_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(".mhtml-extract.probe");
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            Ok(())
        }
        Err(_) => Err(ExtractError::DestinationNotWritable(dir.to_path_buf())),
    }
}

/// Write a decoded body under `filename` inside the destination directory.
///
/// Textual bodies are written in their UTF-8 byte encoding. A failure is
/// logged and reported to the caller; it never aborts the run — that one
/// part's extraction is simply lost.
pub fn write_part(dir: &Path, filename: &str, body: &PartBody) -> bool {
    let path = dir.join(filename);
    match std::fs::write(&path, body.as_bytes()) {
        Ok(()) => {
            debug!(path = %path.display(), bytes = body.len(), "Wrote extracted file");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to write extracted file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        ensure_output_dir(&dir, false).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_clear_removes_existing_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        std::fs::write(dir.join("stale.txt"), b"old").unwrap();
        std::fs::create_dir(dir.join("subdir")).unwrap();
        std::fs::write(dir.join("subdir").join("inner.txt"), b"old").unwrap();

        ensure_output_dir(&dir, true).unwrap();
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_no_clear_keeps_existing_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        std::fs::write(dir.join("keep.txt"), b"kept").unwrap();

        ensure_output_dir(&dir, false).unwrap();
        assert!(dir.join("keep.txt").exists());
    }

    #[test]
    fn test_write_part_persists_text_as_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let body = PartBody::Text("café".to_string());
        assert!(write_part(tmp.path(), "out.txt", &body));
        assert_eq!(
            std::fs::read(tmp.path().join("out.txt")).unwrap(),
            "café".as_bytes()
        );
    }

    #[test]
    fn test_write_part_failure_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("no-such-dir");
        let body = PartBody::Binary(vec![1, 2, 3]);
        assert!(!write_part(&missing, "out.bin", &body));
    }

    #[test]
    fn test_check_writable_ok_and_cleans_probe() {
        let tmp = tempfile::tempdir().unwrap();
        check_writable(tmp.path()).unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
