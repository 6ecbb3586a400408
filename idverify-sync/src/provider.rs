//! Listing providers, the source of the live inventory of a repository.
//!
//! The engine only sees [`ListingProvider`]. [`BorgListing`] runs
//! `borg list <repo>` and strips advisory lines with a [`NoiseFilter`] before
//! the listing reaches the engine.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use idverify_core::IdentifierSequence;

use crate::error::ProviderError;

/// Produces the current ordered identifier listing of one repository.
pub trait ListingProvider {
    fn fetch(&self, repository: &Path) -> Result<IdentifierSequence, ProviderError>;
}

impl<F> ListingProvider for F
where
    F: Fn(&Path) -> Result<IdentifierSequence, ProviderError>,
{
    fn fetch(&self, repository: &Path) -> Result<IdentifierSequence, ProviderError> {
        self(repository)
    }
}

// ---------------------------------------------------------------------------
// Noise filter
// ---------------------------------------------------------------------------

/// Prefixes of advisory lines borg 1.x prints on stdout next to the archive
/// list.
pub const BORG_V1_NOISE: &[&str] = &[
    "Warning: ",
    "Attempting to access a previously unknown unencrypted repository",
];

/// Drops provider lines that are not part of the inventory.
///
/// Rules are plain line prefixes, tagged with a revision so a report can say
/// which rule set was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseFilter {
    revision: String,
    prefixes: Vec<String>,
}

impl NoiseFilter {
    /// Built-in rules for borg 1.x output.
    pub fn borg_v1() -> Self {
        Self {
            revision: "borg-v1".to_string(),
            prefixes: BORG_V1_NOISE.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Operator-supplied rules, replacing the built-in set.
    pub fn custom(prefixes: Vec<String>) -> Self {
        Self {
            revision: "custom".to_string(),
            prefixes: prefixes.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }

    /// Split `output` into lines, dropping noise.
    pub fn apply(&self, output: &str) -> IdentifierSequence {
        output.lines().filter(|line| !self.is_noise(line)).collect()
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::borg_v1()
    }
}

// ---------------------------------------------------------------------------
// Borg adapter
// ---------------------------------------------------------------------------

/// Environment switches that keep borg from prompting. Only applied when the
/// operator has not set them.
const NON_INTERACTIVE_ENV: &[(&str, &str)] = &[
    ("BORG_RELOCATED_REPO_ACCESS_IS_OK", "yes"),
    ("BORG_UNKNOWN_UNENCRYPTED_REPO_ACCESS_IS_OK", "yes"),
];

/// Runs `<program> list <repository>` and parses its stdout.
#[derive(Debug, Clone)]
pub struct BorgListing {
    program: OsString,
    filter: NoiseFilter,
}

impl BorgListing {
    pub fn new(program: impl Into<OsString>, filter: NoiseFilter) -> Self {
        Self {
            program: program.into(),
            filter,
        }
    }

    pub fn filter(&self) -> &NoiseFilter {
        &self.filter
    }

    fn command(&self, repository: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("list")
            .arg(repository)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in NON_INTERACTIVE_ENV {
            if std::env::var_os(key).is_none() {
                cmd.env(key, value);
            }
        }
        cmd
    }
}

impl Default for BorgListing {
    fn default() -> Self {
        Self::new("borg", NoiseFilter::default())
    }
}

impl ListingProvider for BorgListing {
    fn fetch(&self, repository: &Path) -> Result<IdentifierSequence, ProviderError> {
        if self.program.is_empty() {
            return Err(ProviderError::EmptyProgram);
        }

        tracing::debug!(
            program = %self.program.to_string_lossy(),
            repository = %repository.display(),
            "running listing provider"
        );
        let output = self
            .command(repository)
            .output()
            .map_err(|source| ProviderError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut diagnostics = stdout.into_owned();
            if !diagnostics.is_empty() && !diagnostics.ends_with('\n') && !stderr.is_empty() {
                diagnostics.push('\n');
            }
            diagnostics.push_str(&stderr);
            tracing::warn!(
                exit_code = ?output.status.code(),
                repository = %repository.display(),
                "listing provider failed"
            );
            return Err(ProviderError::Exit {
                status: output.status.to_string(),
                diagnostics,
            });
        }

        if !output.stderr.is_empty() {
            tracing::debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
                "listing provider diagnostics"
            );
        }

        let listing = self.filter.apply(&stdout);
        tracing::debug!(lines = listing.len(), filter = self.filter.revision(), "fetched listing");
        Ok(listing)
    }
}
