//! Run pipeline: discover repositories, reconcile each one, aggregate.
//!
//! Repositories are processed strictly one after another. A failing
//! repository never stops the loop; only discovery errors abort a run.

use std::path::Path;

use serde::Serialize;

use idverify_core::{walker, OperatingPolicy, RepositoryDescriptor, WalkError};

use crate::provider::ListingProvider;
use crate::reconcile::{reconcile, OutcomeStatus, ReconciliationOutcome};

/// Progress hooks, called in walker order.
pub trait RunObserver {
    /// Before a repository is reconciled.
    fn started(&mut self, _descriptor: &RepositoryDescriptor) {}

    /// After a repository is reconciled.
    fn finished(&mut self, _descriptor: &RepositoryDescriptor, _outcome: &ReconciliationOutcome) {}
}

impl RunObserver for () {}

/// All outcomes of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<ReconciliationOutcome>,
}

impl RunReport {
    /// True iff no repository diverged or failed. Missing baselines do not
    /// count as failures.
    pub fn passed(&self) -> bool {
        !self.outcomes.iter().any(ReconciliationOutcome::is_failure)
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReconciliationOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// Enumerate the repositories a run with `policy` covers.
pub fn discover(base: &Path, policy: &OperatingPolicy) -> Result<Vec<RepositoryDescriptor>, WalkError> {
    walker::discover_at(base, policy.repo_filter.as_deref())
}

/// Reconcile every repository under `base`.
///
/// This is the canonical entrypoint used by the CLI.
pub fn run(
    base: &Path,
    policy: &OperatingPolicy,
    provider: &dyn ListingProvider,
    observer: &mut dyn RunObserver,
) -> Result<RunReport, WalkError> {
    let repositories = discover(base, policy)?;
    Ok(run_repositories(&repositories, policy, provider, observer))
}

/// Reconcile an already-discovered set of repositories.
pub fn run_repositories(
    repositories: &[RepositoryDescriptor],
    policy: &OperatingPolicy,
    provider: &dyn ListingProvider,
    observer: &mut dyn RunObserver,
) -> RunReport {
    let mut outcomes = Vec::with_capacity(repositories.len());
    for descriptor in repositories {
        observer.started(descriptor);
        let outcome = reconcile(descriptor, policy, provider);
        observer.finished(descriptor, &outcome);
        outcomes.push(outcome);
    }

    let report = RunReport { outcomes };
    tracing::info!(
        repositories = report.outcomes.len(),
        passed = report.passed(),
        "run complete"
    );
    report
}
