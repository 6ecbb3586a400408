//! Error types for idverify-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while enumerating repositories.
///
/// Every variant is a configuration error: the run stops before any
/// repository is processed.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The base path does not exist.
    #[error("base path \"{}\" does not exist", path.display())]
    BaseNotFound { path: PathBuf },

    /// The base path exists but is not a directory.
    #[error("base path \"{}\" is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// `--repo` named a repository that has no directory under the base path.
    #[error("repository '{name}' not found under \"{}\"", base.display())]
    RepositoryNotFound { name: String, base: PathBuf },

    /// The repository name is empty or would escape the base directory.
    #[error("invalid repository name '{name}'")]
    InvalidName { name: String },

    /// Underlying I/O failure while listing the base directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`WalkError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WalkError {
    WalkError::Io {
        path: path.into(),
        source,
    }
}
