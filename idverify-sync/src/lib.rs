//! # idverify-sync
//!
//! Baseline store, comparison and the reconciliation engine.
//!
//! Call [`reconcile`] to verify a single repository against its baseline, or
//! [`pipeline::run`] to process every repository under a base path.

pub mod baseline_store;
pub mod compare;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod reconcile;
pub mod writer;

pub use compare::{compare, Comparison, Mismatch};
pub use error::{ProviderError, StoreError};
pub use pipeline::{RunObserver, RunReport};
pub use provider::{BorgListing, ListingProvider, NoiseFilter};
pub use reconcile::{reconcile, Extension, OutcomeStatus, ReconciliationOutcome, WriteAction};
