//! Operator-facing output: per-repository verdicts, summary table, JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use idverify_core::{OperatingPolicy, RepositoryDescriptor};
use idverify_sync::{
    Extension, NoiseFilter, OutcomeStatus, ReconciliationOutcome, RunObserver, RunReport,
    WriteAction,
};

pub fn print_banner() {
    println!("BorgBackup-ID-Verify v{}", env!("CARGO_PKG_VERSION"));
    println!();
}

// ---------------------------------------------------------------------------
// Human report
// ---------------------------------------------------------------------------

/// Prints each verdict as soon as its repository is done.
pub struct HumanReport {
    dryrun: bool,
}

impl HumanReport {
    pub fn new(policy: &OperatingPolicy) -> Self {
        Self {
            dryrun: policy.dryrun,
        }
    }

    pub fn print_summary(&self, report: &RunReport) {
        if report.outcomes.is_empty() {
            println!("No Borg repositories found.");
            return;
        }

        let rows: Vec<SummaryRow> = report
            .outcomes
            .iter()
            .map(|o| SummaryRow {
                repository: o.repository.0.clone(),
                status: status_label(o.status).to_string(),
                detail: detail(o),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        let failed = report.failures().count();
        let prefix = if self.dryrun { "[dry-run] " } else { "" };
        if failed == 0 {
            println!(
                "{prefix}{} {} repositories verified",
                "✓".green().bold(),
                report.outcomes.len()
            );
        } else {
            println!(
                "{prefix}{} {failed} of {} repositories failed verification",
                "✗".red().bold(),
                report.outcomes.len()
            );
        }
    }
}

impl RunObserver for HumanReport {
    fn started(&mut self, descriptor: &RepositoryDescriptor) {
        println!("* Checking Borg path \"{}\"...", descriptor.path().display());
    }

    fn finished(&mut self, descriptor: &RepositoryDescriptor, outcome: &ReconciliationOutcome) {
        match outcome.status {
            OutcomeStatus::Match if outcome.baseline_len == Some(0) => {
                note("ID file is empty, nothing to compare");
            }
            OutcomeStatus::Match => note("Not updating ID file due to no changes"),
            OutcomeStatus::Extended => print_extension(outcome),
            OutcomeStatus::Diverged => print_divergence(descriptor, outcome),
            OutcomeStatus::MissingBaseline => error(&format!(
                "ID file {} does not exist (yet). If this is the first run, use --init",
                descriptor.baseline_path().display()
            )),
            OutcomeStatus::ProviderFailure => {
                error(outcome.message.as_deref().unwrap_or("listing provider failed"));
                for line in &outcome.diagnostics {
                    eprintln!("  {line}");
                }
            }
            OutcomeStatus::StoreFailure => {
                error(outcome.message.as_deref().unwrap_or("ID file I/O failed"));
                if outcome.should_write {
                    error(&format!(
                        "Updating ID file {} failed; it will be re-verified on the next run",
                        descriptor.baseline_path().display()
                    ));
                }
            }
        }
        println!();
    }
}

fn print_extension(outcome: &ReconciliationOutcome) {
    match outcome.extension {
        Some(Extension::Created) => note("Creating ID file since --init is specified"),
        Some(Extension::Forced) => warning("--force specified, updating ID file without verification"),
        Some(Extension::Appended) | None => {
            note(&format!("{} new archive(s) since last run", added(outcome)));
        }
    }
    match outcome.write {
        WriteAction::Written => println!("* Updating ID file..."),
        WriteAction::Suppressed => note("Skipping updating ID file due to --dryrun"),
        WriteAction::NotNeeded => {}
    }
}

fn print_divergence(descriptor: &RepositoryDescriptor, outcome: &ReconciliationOutcome) {
    for mismatch in &outcome.mismatches {
        let line = mismatch.index + 1;
        match &mismatch.observed {
            None => {
                error(&format!(
                    "Reached end of Borg listing before reaching end of ID file at line {line}:"
                ));
                eprintln!("* File={}", mismatch.expected);
            }
            Some(observed) => {
                error(&format!("Compare failed at file line {line}:"));
                eprintln!("* File={}", mismatch.expected);
                eprintln!("* Repo={observed}");
            }
        }
    }
    error(&format!(
        "Verification for Borg repository \"{}\" failed. Not updating ID file!",
        descriptor.path().display()
    ));
}

fn note(msg: &str) {
    println!("{} {msg}", "NOTE:".cyan());
}

fn warning(msg: &str) {
    println!("{} {msg}", "WARNING:".yellow().bold());
}

fn error(msg: &str) {
    eprintln!("{} {msg}", "ERROR:".red().bold());
}

fn added(outcome: &ReconciliationOutcome) -> usize {
    match (outcome.live_len, outcome.baseline_len) {
        (Some(live), Some(base)) => live.saturating_sub(base),
        (Some(live), None) => live,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Summary table
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn status_label(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Match => "MATCH",
        OutcomeStatus::Extended => "EXTENDED",
        OutcomeStatus::Diverged => "DIVERGED",
        OutcomeStatus::MissingBaseline => "NO ID FILE",
        OutcomeStatus::ProviderFailure => "LIST FAILED",
        OutcomeStatus::StoreFailure => "IO FAILED",
    }
}

fn detail(outcome: &ReconciliationOutcome) -> String {
    let detail = match outcome.status {
        OutcomeStatus::Match if outcome.baseline_len == Some(0) => "empty ID file".to_string(),
        OutcomeStatus::Match => format!("{} ids unchanged", outcome.live_len.unwrap_or(0)),
        OutcomeStatus::Extended => match outcome.extension {
            Some(Extension::Created) => format!("created ({} ids)", outcome.live_len.unwrap_or(0)),
            Some(Extension::Forced) => format!("forced ({} ids)", outcome.live_len.unwrap_or(0)),
            _ => format!("+{} ids", added(outcome)),
        },
        OutcomeStatus::Diverged => match outcome.mismatches.first() {
            Some(m) if m.is_truncation() => format!("listing ends at line {}", m.index + 1),
            Some(m) => format!("line {} differs", m.index + 1),
            None => "diverged".to_string(),
        },
        OutcomeStatus::MissingBaseline => "use --init".to_string(),
        OutcomeStatus::ProviderFailure | OutcomeStatus::StoreFailure => {
            outcome.message.clone().unwrap_or_default()
        }
    };
    if outcome.write == WriteAction::Suppressed {
        format!("{detail} [dry-run]")
    } else {
        detail
    }
}

// ---------------------------------------------------------------------------
// JSON report
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct JsonReport<'a> {
    version: &'static str,
    checked_at: DateTime<Utc>,
    passed: bool,
    policy: &'a OperatingPolicy,
    noise_filter: &'a str,
    repositories: &'a [ReconciliationOutcome],
}

impl<'a> JsonReport<'a> {
    pub fn new(policy: &'a OperatingPolicy, filter: &'a NoiseFilter, report: &'a RunReport) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            checked_at: Utc::now(),
            passed: report.passed(),
            policy,
            noise_filter: filter.revision(),
            repositories: &report.outcomes,
        }
    }

    pub fn print(&self) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(self).context("failed to serialize report JSON")?
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idverify_core::RepositoryName;
    use idverify_sync::Mismatch;

    fn outcome(status: OutcomeStatus) -> ReconciliationOutcome {
        ReconciliationOutcome {
            repository: RepositoryName::from("web01"),
            status,
            diverged_at: None,
            should_write: false,
            write: WriteAction::NotNeeded,
            extension: None,
            baseline_len: Some(2),
            live_len: Some(2),
            mismatches: Vec::new(),
            message: None,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn appended_detail_counts_new_ids() {
        let mut o = outcome(OutcomeStatus::Extended);
        o.extension = Some(Extension::Appended);
        o.live_len = Some(5);
        assert_eq!(detail(&o), "+3 ids");
    }

    #[test]
    fn suppressed_write_is_marked_dry_run() {
        let mut o = outcome(OutcomeStatus::Extended);
        o.extension = Some(Extension::Created);
        o.baseline_len = None;
        o.write = WriteAction::Suppressed;
        assert_eq!(detail(&o), "created (2 ids) [dry-run]");
    }

    #[test]
    fn truncation_detail_names_the_line() {
        let mut o = outcome(OutcomeStatus::Diverged);
        o.mismatches.push(Mismatch {
            index: 2,
            expected: "c".into(),
            observed: None,
        });
        assert_eq!(detail(&o), "listing ends at line 3");
    }

    #[test]
    fn json_report_uses_snake_case_statuses() {
        let policy = OperatingPolicy::default();
        let filter = NoiseFilter::borg_v1();
        let report = RunReport {
            outcomes: vec![outcome(OutcomeStatus::MissingBaseline)],
        };
        let json = serde_json::to_value(JsonReport::new(&policy, &filter, &report)).unwrap();
        assert_eq!(json["passed"], true);
        assert_eq!(json["noise_filter"], "borg-v1");
        assert_eq!(json["repositories"][0]["status"], "missing_baseline");
        assert_eq!(json["repositories"][0]["repository"], "web01");
    }
}
