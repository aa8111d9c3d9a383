//! Help and version output

use crate::prelude::forge;

#[test]
fn help_lists_subcommands() {
    let output = forge().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("show"));
    assert!(stdout.contains("list"));
}

#[test]
fn version_prints_and_exits_zero() {
    let output = forge().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("forge"));
}

#[test]
fn run_help_documents_flags() {
    let output = forge().args(["run", "--help"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--arg",
        "--dry-run",
        "--no-cleanup",
        "--cleanup-delay",
        "--no-proxy",
        "--search-path",
    ] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}
