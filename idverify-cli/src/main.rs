//! borg-id-verify: verify borg repositories against recorded archive lists.
//!
//! # Usage
//!
//! ```text
//! borg-id-verify [--force] [--init] [--dryrun] [--repo=<name>] [--json] <base_path>
//! borg-id-verify --help | --version
//! ```

mod exit_codes;
mod logging;
mod report;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Arg, ArgAction, CommandFactory, FromArgMatches, Parser};

use idverify_core::OperatingPolicy;
use idverify_sync::{pipeline, BorgListing, NoiseFilter};

use report::{HumanReport, JsonReport};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "borg-id-verify",
    version,
    about = "Verify borg repositories against their recorded archive lists",
    long_about = None,
)]
struct Cli {
    /// Base path holding one borg repository per subdirectory.
    #[arg(value_name = "BASE_PATH", env = "BORG_ID_VERIFY_BASE")]
    base_path: Option<PathBuf>,

    /// Rewrite ID files from the live listing without verifying them.
    #[arg(short, long)]
    force: bool,

    /// Create ID files for repositories that do not have one yet.
    #[arg(short, long)]
    init: bool,

    /// Do not write any files; report what would have happened.
    #[arg(short = 'n', long)]
    dryrun: bool,

    /// Only process the named repository.
    #[arg(long, value_name = "NAME")]
    repo: Option<String>,

    /// Listing provider, invoked as `<PROGRAM> list <repository>`.
    #[arg(
        long,
        value_name = "PROGRAM",
        env = "BORG_ID_VERIFY_PROVIDER",
        default_value = "borg"
    )]
    provider: OsString,

    /// Drop provider output lines starting with TEXT (repeatable; replaces the
    /// built-in borg rules).
    #[arg(long = "ignore-prefix", value_name = "TEXT")]
    ignore_prefix: Vec<String>,

    /// Print the run report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn policy(&self) -> OperatingPolicy {
        OperatingPolicy {
            force: self.force,
            init: self.init,
            dryrun: self.dryrun,
            repo_filter: self.repo.clone(),
        }
    }

    fn noise_filter(&self) -> NoiseFilter {
        if self.ignore_prefix.is_empty() {
            NoiseFilter::borg_v1()
        } else {
            NoiseFilter::custom(self.ignore_prefix.clone())
        }
    }
}

/// `-v` is the version switch (clap's default is `-V`).
fn command() -> clap::Command {
    Cli::command().disable_version_flag(true).arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("Print version"),
    )
}

fn parse_cli<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Cli::from_arg_matches(&matches)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ExitCode::from(exit_codes::OK)
                }
                _ => ExitCode::from(exit_codes::FAILED),
            };
        }
    };

    logging::init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::from(exit_codes::FAILED)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let base = cli
        .base_path
        .clone()
        .context("need to specify the Borg base path")?;
    let policy = cli.policy();
    let provider = BorgListing::new(cli.provider.clone(), cli.noise_filter());
    let context = || format!("cannot process Borg base path \"{}\"", base.display());

    let report = if cli.json {
        let report = pipeline::run(&base, &policy, &provider, &mut ()).with_context(context)?;
        JsonReport::new(&policy, provider.filter(), &report).print()?;
        report
    } else {
        report::print_banner();
        let mut human = HumanReport::new(&policy);
        let report = pipeline::run(&base, &policy, &provider, &mut human).with_context(context)?;
        human.print_summary(&report);
        report
    };

    Ok(if report.passed() {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}
