//! Basic run behavior

use crate::prelude::{forge, write_ttp};

#[test]
fn a_passing_ttp_exits_zero_and_streams_output() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "hello.yaml",
        concat!(
            "name: hello\n",
            "steps:\n",
            "  - name: greet\n",
            "    inline: echo hello from forge\n",
        ),
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("hello from forge"));
}

#[test]
fn a_failing_step_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "fail.yaml",
        concat!(
            "name: fail\n",
            "steps:\n",
            "  - name: boom\n",
            "    inline: \"false\"\n",
        ),
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exit status 1"));
}

#[test]
fn steps_see_previous_step_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "chain.yaml",
        concat!(
            "name: chain\n",
            "steps:\n",
            "  - name: first\n",
            "    inline: echo chained-value\n",
            "  - name: second\n",
            "    print_str: \"got: $forge.steps.first.stdout\"\n",
        ),
    );
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("got: chained-value"));
}

#[test]
fn dry_run_executes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "dry.yaml",
        concat!(
            "name: dry\n",
            "steps:\n",
            "  - name: sideeffect\n",
            "    inline: touch ran.marker\n",
        ),
    );
    let output = forge().args(["run", "--dry-run"]).arg(&ttp).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(!dir.path().join("ran.marker").exists());
}

#[test]
fn workdir_is_the_documents_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("neighbor.txt"), "present").unwrap();
    let ttp = write_ttp(
        dir.path(),
        "where.yaml",
        concat!(
            "name: where\n",
            "steps:\n",
            "  - name: peek\n",
            "    inline: cat neighbor.txt\n",
        ),
    );
    // Run from elsewhere; the step still resolves files next to the document.
    let output = forge()
        .current_dir(std::env::temp_dir())
        .arg("run")
        .arg(&ttp)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("present"));
}

#[test]
fn show_prints_the_preamble_and_steps() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "meta.yaml",
        concat!(
            "name: meta\n",
            "description: demo document\n",
            "steps:\n",
            "  - name: only\n",
            "    print_str: hi\n",
        ),
    );
    let output = forge().arg("show").arg(&ttp).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("meta"));
    assert!(stdout.contains("demo document"));
    assert!(stdout.contains("only (print_str)"));
}

#[test]
fn list_enumerates_documents_under_search_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_ttp(
        dir.path(),
        "one.yaml",
        "name: one\nsteps:\n  - name: s\n    print_str: hi\n",
    );
    write_ttp(
        dir.path(),
        "two.yaml",
        "name: two\nsteps:\n  - name: s\n    print_str: hi\n",
    );
    let output = forge()
        .args(["list", "--search-path"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("one.yaml"));
    assert!(stdout.contains("two.yaml"));
}
