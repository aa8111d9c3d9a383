//! Error surface: exit codes and messages

use crate::prelude::{forge, write_ttp};

#[test]
fn missing_ttp_reference_fails_with_nonzero_exit() {
    let output = forge()
        .args(["run", "definitely-not-a-real.yaml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn schema_error_names_the_problem() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "broken.yaml",
        "name: broken\nsteps:\n  - name: s\n    inline: echo a\n    print_str: b\n",
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("multiple action fields"));
}

#[test]
fn unknown_argument_is_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "probe.yaml",
        "name: probe\nsteps:\n  - name: s\n    print_str: hi\n",
    );
    let output = forge()
        .arg("run")
        .arg(&ttp)
        .args(["--arg", "bogus=1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bogus"));
}
