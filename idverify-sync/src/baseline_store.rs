//! Baseline store, read side.
//!
//! A baseline is a plain text file `<base>/.<name>.id` holding one identifier
//! per line. Writes (rotation + atomic replace) live in [`crate::writer`].

use std::io::ErrorKind;
use std::path::Path;

use idverify_core::{IdentifierSequence, RepositoryDescriptor};

use crate::error::{io_err, StoreError};

/// Whether a baseline file exists for `descriptor`.
///
/// A missing file is `Ok(false)`; a path that cannot be inspected is an error
/// so that "unreadable" is never mistaken for "absent".
pub fn exists(descriptor: &RepositoryDescriptor) -> Result<bool, StoreError> {
    let path = descriptor.baseline_path();
    path.try_exists().map_err(|e| io_err(path, e))
}

/// Load the baseline stored at `path`.
///
/// Fails if the file cannot be read or is not text. Callers check
/// [`exists`] first; a missing file is reported as an I/O error here.
pub fn load(path: &Path) -> Result<IdentifierSequence, StoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            return Err(StoreError::InvalidText {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(io_err(path, err)),
    };
    let sequence = IdentifierSequence::from_text(&contents);
    tracing::debug!(path = %path.display(), lines = sequence.len(), "loaded baseline");
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_baseline_does_not_exist() {
        let tmp = TempDir::new().unwrap();
        let desc = RepositoryDescriptor::new(tmp.path(), "repo");
        assert!(!exists(&desc).unwrap());
    }

    #[test]
    fn load_reads_one_entry_per_line() {
        let tmp = TempDir::new().unwrap();
        let desc = RepositoryDescriptor::new(tmp.path(), "repo");
        std::fs::write(desc.baseline_path(), "a\nb\nc\n").unwrap();

        assert!(exists(&desc).unwrap());
        let seq = load(desc.baseline_path()).unwrap();
        assert_eq!(seq.lines(), &["a", "b", "c"]);
    }

    #[test]
    fn load_tolerates_missing_final_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".repo.id");
        std::fs::write(&path, "a\nb").unwrap();
        assert_eq!(load(&path).unwrap().lines(), &["a", "b"]);
    }

    #[test]
    fn empty_file_is_empty_baseline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".repo.id");
        std::fs::write(&path, "").unwrap();
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn binary_content_is_invalid_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".repo.id");
        std::fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::InvalidText { .. }), "got: {err}");
    }

    #[test]
    fn directory_in_place_of_baseline_fails_to_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".repo.id");
        std::fs::create_dir(&path).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "got: {err}");
    }
}
