//! Black-box tests of the `borg-id-verify` binary with a scripted fake borg.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

/// A base directory with repositories plus a fake `borg` that prints
/// `<repo>/listing` for `borg list <repo>` and fails when it is missing.
struct Fixture {
    base: TempDir,
    tools: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let tools = TempDir::new().expect("tools");
        let borg = tools.path().join("borg");
        fs::write(
            &borg,
            "#!/bin/sh\n\
             [ \"$1\" = list ] || exit 64\n\
             if [ -f \"$2/listing\" ]; then\n\
             \x20 echo 'Warning: Attempting to access a previously unknown unencrypted repository!'\n\
             \x20 cat \"$2/listing\"\n\
             else\n\
             \x20 echo \"Repository $2 does not exist.\" >&2\n\
             \x20 exit 2\n\
             fi\n",
        )
        .expect("write fake borg");
        let mut perms = fs::metadata(&borg).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&borg, perms).expect("chmod");

        Self {
            base: TempDir::new().expect("base"),
            tools,
        }
    }

    fn repo(&self, name: &str, listing: Option<&str>, baseline: Option<&str>) -> &Self {
        let dir = self.base.path().join(name);
        fs::create_dir_all(&dir).expect("repo dir");
        if let Some(listing) = listing {
            fs::write(dir.join("listing"), listing).expect("listing");
        }
        if let Some(baseline) = baseline {
            fs::write(self.baseline(name), baseline).expect("baseline");
        }
        self
    }

    fn baseline(&self, name: &str) -> PathBuf {
        self.base.path().join(format!(".{name}.id"))
    }

    fn backup(&self, name: &str) -> PathBuf {
        self.base.path().join(format!(".{name}.id.old"))
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("borg-id-verify"));
        cmd.env_remove("BORG_ID_VERIFY_BASE")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .env("BORG_ID_VERIFY_PROVIDER", self.tools.path().join("borg"))
            .arg(self.base.path());
        cmd
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read")
}

#[test]
fn extended_repository_is_rewritten_and_rotated() {
    let fx = Fixture::new();
    fx.repo("web01", Some("a\nb\nc\n"), Some("a\nb\n"));

    fx.cmd()
        .assert()
        .success()
        .stdout(contains("* Checking Borg path"))
        .stdout(contains("* Updating ID file..."));

    assert_eq!(read(&fx.baseline("web01")), "a\nb\nc\n");
    assert_eq!(read(&fx.backup("web01")), "a\nb\n");
}

#[test]
fn divergence_fails_the_run_and_leaves_files_alone() {
    let fx = Fixture::new();
    fx.repo("web01", Some("a\nb\n"), Some("a\nx\n"));

    fx.cmd()
        .assert()
        .code(1)
        .stderr(contains("Compare failed at file line 2:"))
        .stderr(contains("* File=x"))
        .stderr(contains("* Repo=b"))
        .stderr(contains("Not updating ID file!"));

    assert_eq!(read(&fx.baseline("web01")), "a\nx\n");
    assert!(!fx.backup("web01").exists());
}

#[test]
fn shrunk_listing_is_reported_as_truncation() {
    let fx = Fixture::new();
    fx.repo("web01", Some("a\nb\n"), Some("a\nb\nc\n"));

    fx.cmd()
        .assert()
        .code(1)
        .stderr(contains("Reached end of Borg listing before reaching end of ID file at line 3:"));
}

#[test]
fn missing_baseline_is_reported_but_does_not_fail() {
    let fx = Fixture::new();
    fx.repo("fresh", Some("a\n"), None);

    fx.cmd()
        .assert()
        .success()
        .stderr(contains("does not exist (yet)"))
        .stderr(contains("--init"));

    assert!(!fx.baseline("fresh").exists());
    assert!(!fx.backup("fresh").exists());
}

#[test]
fn init_creates_missing_baseline() {
    let fx = Fixture::new();
    fx.repo("fresh", Some("a\nb\n"), None);

    fx.cmd().arg("--init").assert().success();

    assert_eq!(read(&fx.baseline("fresh")), "a\nb\n");
}

#[test]
fn provider_noise_never_reaches_the_baseline() {
    let fx = Fixture::new();
    fx.repo("fresh", Some("a\n"), None);

    fx.cmd().arg("-i").assert().success();

    assert!(!read(&fx.baseline("fresh")).contains("Warning"));
}

#[test]
fn dryrun_writes_nothing_then_real_run_writes() {
    let fx = Fixture::new();
    fx.repo("web01", Some("a\nb\n"), Some("a\n"));

    fx.cmd()
        .arg("--dryrun")
        .assert()
        .success()
        .stdout(contains("Skipping updating ID file due to --dryrun"));
    assert_eq!(read(&fx.baseline("web01")), "a\n");
    assert!(!fx.backup("web01").exists());

    fx.cmd().assert().success();
    assert_eq!(read(&fx.baseline("web01")), "a\nb\n");

    fx.cmd()
        .assert()
        .success()
        .stdout(contains("Not updating ID file due to no changes"));
}

#[test]
fn force_overrides_divergence() {
    let fx = Fixture::new();
    fx.repo("web01", Some("z\n"), Some("a\nb\n"));

    fx.cmd()
        .arg("-f")
        .assert()
        .success()
        .stdout(contains("--force specified"));

    assert_eq!(read(&fx.baseline("web01")), "z\n");
    assert_eq!(read(&fx.backup("web01")), "a\nb\n");
}

#[test]
fn provider_failure_fails_run_but_other_repositories_are_processed() {
    let fx = Fixture::new();
    fx.repo("a_gone", None, Some("x\n"))
        .repo("b_ok", Some("x\ny\n"), Some("x\n"));

    fx.cmd()
        .assert()
        .code(1)
        .stderr(contains("does not exist."));

    assert_eq!(read(&fx.baseline("b_ok")), "x\ny\n");
}

#[test]
fn repo_filter_limits_processing() {
    let fx = Fixture::new();
    fx.repo("web01", Some("a\nb\n"), Some("a\n"))
        .repo("web02", Some("a\nb\n"), Some("a\n"));

    fx.cmd().arg("--repo=web02").assert().success();

    assert_eq!(read(&fx.baseline("web01")), "a\n");
    assert_eq!(read(&fx.baseline("web02")), "a\nb\n");
}

#[test]
fn unknown_repo_filter_is_a_configuration_error() {
    let fx = Fixture::new();
    fx.repo("web01", Some("a\n"), Some("a\n"));

    fx.cmd()
        .arg("--repo=ghost")
        .assert()
        .code(1)
        .stderr(contains("ghost"))
        .stdout(contains("Checking").not());
}

#[test]
fn missing_base_path_exits_one() {
    Command::new(assert_cmd::cargo::cargo_bin!("borg-id-verify"))
        .env_remove("BORG_ID_VERIFY_BASE")
        .assert()
        .code(1)
        .stderr(contains("base path"));
}

#[test]
fn nonexistent_base_path_exits_one() {
    let tmp = TempDir::new().expect("tmp");
    Command::new(assert_cmd::cargo::cargo_bin!("borg-id-verify"))
        .env_remove("BORG_ID_VERIFY_BASE")
        .arg(tmp.path().join("nope"))
        .assert()
        .code(1)
        .stderr(contains("does not exist"));
}

#[test]
fn unknown_flag_exits_one() {
    Command::new(assert_cmd::cargo::cargo_bin!("borg-id-verify"))
        .arg("--bogus")
        .assert()
        .code(1);
}

#[test]
fn help_and_version_exit_zero() {
    Command::new(assert_cmd::cargo::cargo_bin!("borg-id-verify"))
        .arg("-h")
        .assert()
        .success()
        .stdout(contains("--dryrun"));

    Command::new(assert_cmd::cargo::cargo_bin!("borg-id-verify"))
        .arg("-v")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn json_report_is_machine_readable() {
    let fx = Fixture::new();
    fx.repo("web01", Some("a\nb\n"), Some("a\nx\n"))
        .repo("web02", Some("a\n"), None);

    let assert = fx.cmd().arg("--json").assert().code(1);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");

    assert_eq!(json["passed"], false);
    let repos = json["repositories"].as_array().expect("array");
    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0]["repository"], "web01");
    assert_eq!(repos[0]["status"], "diverged");
    assert_eq!(repos[0]["diverged_at"], 1);
    assert_eq!(repos[1]["status"], "missing_baseline");
}

#[test]
fn empty_base_path_succeeds() {
    let fx = Fixture::new();
    fx.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("No Borg repositories found."));
}
