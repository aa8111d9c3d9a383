//! Cleanup guarantees observed end to end

use crate::prelude::{forge, read_log, write_ttp};

#[test]
fn cleanups_unwind_in_reverse_after_a_mid_run_failure() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "unwind.yaml",
        concat!(
            "name: unwind\n",
            "steps:\n",
            "  - name: s1\n    inline: echo one\n",
            "    cleanup:\n      inline: echo c1 >> order.log\n",
            "  - name: s2\n    inline: echo two\n",
            "    cleanup:\n      inline: echo c2 >> order.log\n",
            "  - name: s3\n    inline: echo three\n",
            "    cleanup:\n      inline: echo c3 >> order.log\n",
            "  - name: s4\n    inline: \"false\"\n",
            "    cleanup:\n      inline: echo c4 >> order.log\n",
        ),
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
    assert_eq!(read_log(dir.path()), vec!["c3", "c2", "c1"]);
}

#[test]
fn no_cleanup_leaves_side_effects_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "keep.yaml",
        concat!(
            "name: keep\n",
            "steps:\n",
            "  - name: stage\n",
            "    create_file: staged.txt\n",
            "    contents: payload\n",
        ),
    );
    let output = forge()
        .args(["run", "--no-cleanup"])
        .arg(&ttp)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(dir.path().join("staged.txt").exists());
}

#[test]
fn create_file_is_reversed_by_its_default_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "reverse.yaml",
        concat!(
            "name: reverse\n",
            "steps:\n",
            "  - name: stage\n",
            "    create_file: staged.txt\n",
            "    contents: payload\n",
        ),
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(!dir.path().join("staged.txt").exists());
}

#[test]
fn a_failing_cleanup_is_reported_but_others_still_run() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "besteffort.yaml",
        concat!(
            "name: besteffort\n",
            "steps:\n",
            "  - name: s1\n    inline: echo one\n",
            "    cleanup:\n      inline: echo c1 >> order.log\n",
            "  - name: s2\n    inline: echo two\n",
            "    cleanup:\n      inline: \"exit 9\"\n",
        ),
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    // Main phase passed, but the cleanup failure drives a non-zero exit.
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("s2"));
    assert_eq!(read_log(dir.path()), vec!["c1"]);
}

#[test]
fn nested_ttp_cleanups_preserve_reverse_order() {
    let dir = tempfile::tempdir().unwrap();
    write_ttp(
        dir.path(),
        "child.yaml",
        concat!(
            "name: child\n",
            "steps:\n",
            "  - name: c1\n    inline: echo child-one\n",
            "    cleanup:\n      inline: echo child-c1 >> order.log\n",
        ),
    );
    let ttp = write_ttp(
        dir.path(),
        "parent.yaml",
        concat!(
            "name: parent\n",
            "steps:\n",
            "  - name: p1\n    inline: echo parent-one\n",
            "    cleanup:\n      inline: echo parent-c1 >> order.log\n",
            "  - name: nested\n    ttp: child.yaml\n",
        ),
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    assert_eq!(read_log(dir.path()), vec!["child-c1", "parent-c1"]);
}
