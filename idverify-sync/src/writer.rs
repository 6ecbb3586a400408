//! Baseline rotation and atomic replacement.
//!
//! ## `atomic_write`: 4-step protocol
//!
//! 1. Delete `<base>/.<name>.id.old` if present.
//! 2. Rename `<base>/.<name>.id` → `<base>/.<name>.id.old` if present.
//! 3. Write the new sequence to `<base>/.<name>.id.tmp`.
//! 4. Rename the `.tmp` file onto `<base>/.<name>.id`.
//!
//! The previous baseline is rotated away before any new byte is written, so a
//! crash at any point leaves either the old baseline or its `.old` copy on
//! disk, never a half-written file under the baseline name. If step 3 or 4
//! fails, the `.tmp` file is removed and the rotated baseline is moved back.
//! At most one `.old` copy exists per repository.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use idverify_core::{IdentifierSequence, RepositoryDescriptor};

use crate::error::{io_err, StoreError};

/// Suffix of the scratch file written before the final rename.
const TMP_SUFFIX: &str = ".tmp";

/// Replace the baseline of `descriptor` with `sequence`.
///
/// On error the previous baseline is back under its own name, so the next
/// run re-verifies against it.
pub fn atomic_write(
    descriptor: &RepositoryDescriptor,
    sequence: &IdentifierSequence,
) -> Result<(), StoreError> {
    let tmp = tmp_path(descriptor.baseline_path());
    atomic_write_with_tmp(descriptor, sequence, &tmp)
}

fn atomic_write_with_tmp(
    descriptor: &RepositoryDescriptor,
    sequence: &IdentifierSequence,
    tmp: &Path,
) -> Result<(), StoreError> {
    let path = descriptor.baseline_path();

    // Steps 1 + 2.
    let rotated = rotate(path, descriptor.backup_baseline_path())?;

    // Steps 3 + 4.
    let replaced = std::fs::write(tmp, sequence.to_text())
        .map_err(|e| io_err(tmp, e))
        .and_then(|()| std::fs::rename(tmp, path).map_err(|e| io_err(path, e)));
    if let Err(err) = replaced {
        let _ = std::fs::remove_file(tmp);
        if rotated {
            restore(descriptor.backup_baseline_path(), path);
        }
        return Err(err);
    }

    tracing::info!(
        path = %path.display(),
        lines = sequence.len(),
        rotated,
        "wrote baseline"
    );
    Ok(())
}

/// Move `baseline` to `backup`, discarding any previous `backup`.
///
/// Returns `true` if a baseline was rotated, `false` if there was none.
/// Missing files are silently skipped.
pub fn rotate(baseline: &Path, backup: &Path) -> Result<bool, StoreError> {
    match std::fs::remove_file(backup) {
        Ok(()) => tracing::debug!(path = %backup.display(), "removed previous backup"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(backup, err)),
    }

    match std::fs::rename(baseline, backup) {
        Ok(()) => {
            tracing::info!(
                from = %baseline.display(),
                to = %backup.display(),
                "rotated baseline"
            );
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(baseline, err)),
    }
}

/// Move a rotated baseline back after a failed write.
fn restore(backup: &Path, baseline: &Path) {
    match std::fs::rename(backup, baseline) {
        Ok(()) => tracing::warn!(path = %baseline.display(), "restored baseline after failed write"),
        Err(err) => tracing::error!(
            path = %baseline.display(),
            error = %err,
            "could not restore baseline; previous copy left at backup path"
        ),
    }
}

/// `<baseline>.tmp` in the same directory, so the final rename never
/// crosses filesystems.
fn tmp_path(baseline: &Path) -> PathBuf {
    let mut name = baseline.as_os_str().to_os_string();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
