//! Argument binding through the CLI

use crate::prelude::{forge, write_ttp};

const DOC: &str = concat!(
    "name: parametrized\n",
    "args:\n",
    "  - name: target\n",
    "  - name: port\n",
    "    type: int\n",
    "    default: 443\n",
    "steps:\n",
    "  - name: report\n",
    "    inline: \"echo probing {[{stepvars.target}]}:{[{stepvars.port}]}\"\n",
);

#[test]
fn bound_and_defaulted_args_reach_templates() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(dir.path(), "param.yaml", DOC);
    let output = forge()
        .arg("run")
        .arg(&ttp)
        .args(["--arg", "target=10.0.0.5"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("probing 10.0.0.5:443"));
}

#[test]
fn missing_required_arg_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(dir.path(), "param.yaml", DOC);
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("target"));
}

#[test]
fn type_violation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(dir.path(), "param.yaml", DOC);
    let output = forge()
        .arg("run")
        .arg(&ttp)
        .args(["--arg", "target=x", "--arg", "port=not-a-number"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("integer"));
}
