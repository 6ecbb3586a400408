//! Repository discovery.
//!
//! # Layout
//!
//! ```text
//! <base>/
//!   <name>/            (one borg repository per subdirectory)
//!   .<name>.id         (baseline)
//!   .<name>.id.old     (previous baseline)
//! ```
//!
//! Every immediate subdirectory of the base path is a repository, unless a
//! filter names exactly one. Results are sorted by name so reports are stable.

use std::path::Path;

use crate::error::{io_err, WalkError};
use crate::types::{RepositoryDescriptor, RepositoryName};

/// Enumerate the repositories to process under `base`.
///
/// With `filter = Some(name)` the result is exactly that repository, or
/// [`WalkError::RepositoryNotFound`] when `<base>/<name>` is not a directory.
pub fn discover_at(
    base: &Path,
    filter: Option<&str>,
) -> Result<Vec<RepositoryDescriptor>, WalkError> {
    check_base(base)?;

    if let Some(name) = filter {
        validate_name(name)?;
        if !base.join(name).is_dir() {
            return Err(WalkError::RepositoryNotFound {
                name: name.to_string(),
                base: base.to_path_buf(),
            });
        }
        return Ok(vec![RepositoryDescriptor::new(base, name)]);
    }

    let mut names = list_repository_names_at(base)?;
    names.sort();
    tracing::debug!(base = %base.display(), count = names.len(), "discovered repositories");
    Ok(names
        .into_iter()
        .map(|name| RepositoryDescriptor::new(base, name))
        .collect())
}

/// Names of all immediate subdirectories of `base`, unsorted.
///
/// Symlinks to directories count as repositories. Entries whose names are not
/// valid UTF-8 are skipped with a warning.
pub fn list_repository_names_at(base: &Path) -> Result<Vec<RepositoryName>, WalkError> {
    let entries = std::fs::read_dir(base).map_err(|e| io_err(base, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(base, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(RepositoryName::from(name)),
            Err(raw) => {
                tracing::warn!(name = ?raw, "skipping repository with non UTF-8 name");
            }
        }
    }
    Ok(names)
}

fn check_base(base: &Path) -> Result<(), WalkError> {
    if !base.exists() {
        return Err(WalkError::BaseNotFound {
            path: base.to_path_buf(),
        });
    }
    if !base.is_dir() {
        return Err(WalkError::NotADirectory {
            path: base.to_path_buf(),
        });
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), WalkError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(WalkError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}
