//! Error types for idverify-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing a repository's baseline files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The baseline file exists but is not UTF-8 text.
    #[error("baseline {path} is not valid text")]
    InvalidText { path: PathBuf },
}

/// Failures obtaining the live listing of a repository.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The configured provider program is empty.
    #[error("no listing provider program configured")]
    EmptyProgram,

    /// The provider could not be started at all.
    #[error("failed to run listing provider '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The provider ran but reported failure; `diagnostics` is its raw output.
    #[error("listing provider failed with {status}")]
    Exit { status: String, diagnostics: String },
}

impl ProviderError {
    /// Raw provider output attached to the failure, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ProviderError::Exit { diagnostics, .. } if !diagnostics.is_empty() => {
                Some(diagnostics)
            }
            _ => None,
        }
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
