//! Shared helpers for CLI specs

use std::path::{Path, PathBuf};

/// The forge binary under test.
pub fn forge() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("forge").expect("forge binary is built")
}

/// Write a TTP document into `dir` and return its path.
pub fn write_ttp(dir: &Path, file: &str, content: &str) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, content).expect("write ttp");
    path
}

/// Read the cleanup order log a spec's TTP appended to.
pub fn read_log(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("order.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
