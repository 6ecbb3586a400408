//! idverify core library: domain types, repository discovery, errors.
//!
//! Public API surface:
//! - [`types`]: descriptors, identifier sequences and the operating policy
//! - [`error`]: [`WalkError`]
//! - [`walker`]: enumerate the repositories under a base path

pub mod error;
pub mod types;
pub mod walker;

pub use error::WalkError;
pub use types::{IdentifierSequence, OperatingPolicy, RepositoryDescriptor, RepositoryName};
