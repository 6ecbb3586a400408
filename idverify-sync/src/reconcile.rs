//! Reconciliation engine: one repository, one outcome.
//!
//! ```text
//! baseline file?  ── no ──  --init? ── no ──▶ MissingBaseline (nothing fetched)
//!      │                       └── yes ─▶ fetch ─▶ Extended (created)
//!     yes
//!      ▼
//!    load ─▶ fetch ─▶ decide(baseline, live, force)
//!                        empty baseline        ─▶ Match
//!                        force                 ─▶ Extended (forced)
//!                        first mismatch at i   ─▶ Diverged(i)
//!                        equal length          ─▶ Match
//!                        live longer           ─▶ Extended (appended)
//! ```
//!
//! `Extended` is the only status that writes. `--dryrun` suppresses the write
//! without changing the status. Errors never escape [`reconcile`]; they become
//! `ProviderFailure` / `StoreFailure` outcomes.

use serde::Serialize;

use idverify_core::{IdentifierSequence, OperatingPolicy, RepositoryDescriptor, RepositoryName};

use crate::baseline_store;
use crate::compare::{compare, Comparison, Mismatch};
use crate::error::{ProviderError, StoreError};
use crate::provider::ListingProvider;
use crate::writer;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Classification of one repository in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Match,
    Extended,
    Diverged,
    MissingBaseline,
    ProviderFailure,
    StoreFailure,
}

impl OutcomeStatus {
    /// Statuses that make the whole run fail. `MissingBaseline` is reported
    /// but does not count.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            OutcomeStatus::Diverged | OutcomeStatus::ProviderFailure | OutcomeStatus::StoreFailure
        )
    }
}

/// Why an `Extended` outcome rewrites the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    /// No baseline existed; `--init` creates it.
    Created,
    /// The baseline is a strict prefix of the live listing.
    Appended,
    /// `--force` bypassed the comparison.
    Forced,
}

/// What happened to the baseline file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    /// No write was required (or the write was attempted and failed).
    #[default]
    NotNeeded,
    /// The baseline was rotated and replaced.
    Written,
    /// A write was required but `--dryrun` suppressed it.
    Suppressed,
}

/// Result of reconciling one repository. Produced once per run, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationOutcome {
    pub repository: RepositoryName,
    pub status: OutcomeStatus,
    /// First divergent index (0-based) for `Diverged`.
    pub diverged_at: Option<usize>,
    pub should_write: bool,
    pub write: WriteAction,
    pub extension: Option<Extension>,
    pub baseline_len: Option<usize>,
    pub live_len: Option<usize>,
    /// Every mismatching index, first one authoritative.
    pub mismatches: Vec<Mismatch>,
    /// Rendered error for failure statuses.
    pub message: Option<String>,
    /// Raw provider output attached to a `ProviderFailure`.
    pub diagnostics: Vec<String>,
}

impl ReconciliationOutcome {
    fn new(repository: &RepositoryName, status: OutcomeStatus) -> Self {
        Self {
            repository: repository.clone(),
            status,
            diverged_at: None,
            should_write: false,
            write: WriteAction::NotNeeded,
            extension: None,
            baseline_len: None,
            live_len: None,
            mismatches: Vec::new(),
            message: None,
            diagnostics: Vec::new(),
        }
    }

    fn store_failure(repository: &RepositoryName, err: &StoreError) -> Self {
        let mut outcome = Self::new(repository, OutcomeStatus::StoreFailure);
        outcome.message = Some(err.to_string());
        outcome
    }

    fn provider_failure(repository: &RepositoryName, err: &ProviderError) -> Self {
        let mut outcome = Self::new(repository, OutcomeStatus::ProviderFailure);
        outcome.message = Some(err.to_string());
        outcome.diagnostics = err
            .diagnostics()
            .map(|d| d.lines().map(str::to_owned).collect())
            .unwrap_or_default();
        outcome
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

// ---------------------------------------------------------------------------
// Decision table
// ---------------------------------------------------------------------------

/// Pure classification of a loaded baseline (or its absence) against a live
/// listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Match,
    Extended(Extension),
    Diverged(Comparison),
}

/// `baseline = None` means no baseline file exists and `--init` was given.
pub fn decide(
    baseline: Option<&IdentifierSequence>,
    live: &IdentifierSequence,
    force: bool,
) -> Decision {
    match (baseline, force) {
        (None, _) => Decision::Extended(Extension::Created),
        (Some(base), _) if base.is_empty() => Decision::Match,
        (Some(_), true) => Decision::Extended(Extension::Forced),
        (Some(base), false) => {
            let comparison = compare(base, live);
            match (comparison.diverged_at(), live.len() > base.len()) {
                (Some(_), _) => Decision::Diverged(comparison),
                (None, false) => Decision::Match,
                (None, true) => Decision::Extended(Extension::Appended),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Verify one repository against its baseline and apply the write policy.
pub fn reconcile(
    descriptor: &RepositoryDescriptor,
    policy: &OperatingPolicy,
    provider: &dyn ListingProvider,
) -> ReconciliationOutcome {
    let name = descriptor.name();
    let span = tracing::debug_span!("reconcile", repository = %name);
    let _guard = span.enter();

    let baseline = match load_baseline(descriptor) {
        Ok(Some(baseline)) => Some(baseline),
        Ok(None) if policy.init => None,
        Ok(None) => {
            tracing::warn!(path = %descriptor.baseline_path().display(), "baseline missing");
            return ReconciliationOutcome::new(name, OutcomeStatus::MissingBaseline);
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load baseline");
            return ReconciliationOutcome::store_failure(name, &err);
        }
    };

    let live = match provider.fetch(descriptor.path()) {
        Ok(live) => live,
        Err(err) => {
            tracing::warn!(error = %err, "failed to fetch live listing");
            return ReconciliationOutcome::provider_failure(name, &err);
        }
    };

    let mut outcome = classify(name, baseline.as_ref(), &live, policy.force);
    if outcome.should_write {
        apply_write(&mut outcome, descriptor, &live, policy.dryrun);
    }
    outcome
}

/// `Ok(None)` when no baseline file exists.
fn load_baseline(
    descriptor: &RepositoryDescriptor,
) -> Result<Option<IdentifierSequence>, StoreError> {
    if !baseline_store::exists(descriptor)? {
        return Ok(None);
    }
    baseline_store::load(descriptor.baseline_path()).map(Some)
}

fn classify(
    name: &RepositoryName,
    baseline: Option<&IdentifierSequence>,
    live: &IdentifierSequence,
    force: bool,
) -> ReconciliationOutcome {
    let decision = decide(baseline, live, force);
    let mut outcome = match decision {
        Decision::Match => ReconciliationOutcome::new(name, OutcomeStatus::Match),
        Decision::Extended(extension) => {
            let mut outcome = ReconciliationOutcome::new(name, OutcomeStatus::Extended);
            outcome.extension = Some(extension);
            outcome.should_write = true;
            outcome
        }
        Decision::Diverged(comparison) => {
            let mut outcome = ReconciliationOutcome::new(name, OutcomeStatus::Diverged);
            outcome.diverged_at = comparison.diverged_at();
            for mismatch in &comparison.mismatches {
                tracing::warn!(
                    index = mismatch.index,
                    expected = %mismatch.expected,
                    observed = mismatch.observed.as_deref().unwrap_or("<end of listing>"),
                    "baseline diverges from live listing"
                );
            }
            outcome.mismatches = comparison.mismatches;
            outcome
        }
    };
    outcome.baseline_len = baseline.map(IdentifierSequence::len);
    outcome.live_len = Some(live.len());
    outcome
}

fn apply_write(
    outcome: &mut ReconciliationOutcome,
    descriptor: &RepositoryDescriptor,
    live: &IdentifierSequence,
    dryrun: bool,
) {
    if dryrun {
        tracing::info!("[dry-run] would write baseline");
        outcome.write = WriteAction::Suppressed;
        return;
    }

    match writer::atomic_write(descriptor, live) {
        Ok(()) => outcome.write = WriteAction::Written,
        Err(err) => {
            tracing::warn!(error = %err, "failed to write baseline");
            outcome.status = OutcomeStatus::StoreFailure;
            outcome.message = Some(err.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
