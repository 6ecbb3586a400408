//! Domain types shared by the walker, the baseline store and the engine.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a repository directory under the base path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryName(pub String);

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepositoryName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// RepositoryDescriptor
// ---------------------------------------------------------------------------

/// Suffix of the baseline file: `.<name>.id`.
pub const BASELINE_SUFFIX: &str = ".id";

/// Suffix appended to the baseline path for the rotated backup.
pub const BACKUP_SUFFIX: &str = ".old";

/// Everything the engine needs to locate one repository and its state files.
///
/// Derived from the base path and the repository name; fields are private so
/// the derived paths can never drift from the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    name: RepositoryName,
    path: PathBuf,
    baseline_path: PathBuf,
    backup_baseline_path: PathBuf,
}

impl RepositoryDescriptor {
    /// `<base>/<name>`, `<base>/.<name>.id` and `<base>/.<name>.id.old`.
    pub fn new(base: &Path, name: impl Into<RepositoryName>) -> Self {
        let name = name.into();
        let path = base.join(&name.0);
        let baseline_path = base.join(format!(".{}{BASELINE_SUFFIX}", name.0));
        let backup_baseline_path =
            base.join(format!(".{}{BASELINE_SUFFIX}{BACKUP_SUFFIX}", name.0));
        Self {
            name,
            path,
            baseline_path,
            backup_baseline_path,
        }
    }

    pub fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// The repository directory handed to the listing provider.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn baseline_path(&self) -> &Path {
        &self.baseline_path
    }

    pub fn backup_baseline_path(&self) -> &Path {
        &self.backup_baseline_path
    }
}

// ---------------------------------------------------------------------------
// IdentifierSequence
// ---------------------------------------------------------------------------

/// An ordered list of opaque identifier lines.
///
/// Order is significant and duplicates are kept. Entries never contain a
/// newline. Sequences are compared and replaced whole, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierSequence(Vec<String>);

impl IdentifierSequence {
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    /// Split text into entries. Accepts `\n` and `\r\n` terminators; a final
    /// terminator does not produce a trailing empty entry.
    pub fn from_text(text: &str) -> Self {
        Self(text.lines().map(str::to_owned).collect())
    }

    /// One entry per line, each terminated by `\n`.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.0.iter().map(|l| l.len() + 1).sum());
        for line in &self.0 {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for IdentifierSequence {
    fn from(lines: Vec<String>) -> Self {
        Self(lines)
    }
}

impl<'a> FromIterator<&'a str> for IdentifierSequence {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}

impl FromIterator<String> for IdentifierSequence {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// OperatingPolicy
// ---------------------------------------------------------------------------

/// Operator flags for one run. Built once from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperatingPolicy {
    /// Skip comparison and always rewrite the baseline from the live listing.
    pub force: bool,
    /// Allow creating a baseline where none exists.
    pub init: bool,
    /// Never write; report what would have happened.
    pub dryrun: bool,
    /// Restrict the run to one repository.
    pub repo_filter: Option<String>,
}
