// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Procedure repository: resolves and loads TTP documents from disk.

use crate::{ExecError, Ttp};
use std::path::{Path, PathBuf};

/// An opened handle to the on-disk procedure repository.
///
/// Resolution tries, in order: the reference as an absolute path, relative
/// to the caller-supplied base (typically the current working directory or
/// a parent TTP's directory), then each search path. References without an
/// extension also try with `.yaml` appended.
#[derive(Debug, Clone, Default)]
pub struct Repo {
    search_paths: Vec<PathBuf>,
}

impl Repo {
    /// Open a repository over the given search paths.
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Directories this repository searches.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolve a TTP reference to an existing file path.
    pub fn resolve(&self, reference: &str, relative_to: Option<&Path>) -> Result<PathBuf, ExecError> {
        if reference.is_empty() {
            return Err(ExecError::Validation("empty ttp reference".into()));
        }
        let reference = Path::new(reference);
        let mut candidates = Vec::new();
        if reference.is_absolute() {
            candidates.push(reference.to_path_buf());
        } else {
            if let Some(base) = relative_to {
                candidates.push(base.join(reference));
            }
            for search_path in &self.search_paths {
                candidates.push(search_path.join(reference));
            }
        }
        if reference.extension().is_none() {
            for candidate in candidates.clone() {
                candidates.push(candidate.with_extension("yaml"));
            }
        }
        for candidate in &candidates {
            if candidate.is_file() {
                return Ok(candidate.clone());
            }
        }
        Err(ExecError::Validation(format!(
            "ttp reference {:?} not found (searched {} location(s))",
            reference.display(),
            candidates.len()
        )))
    }

    /// Resolve, read, and parse a TTP. Returns the document and its on-disk
    /// directory, which seeds the run's working directory.
    pub fn load(&self, reference: &str, relative_to: Option<&Path>) -> Result<(Ttp, PathBuf), ExecError> {
        let path = self.resolve(reference, relative_to)?;
        let content = std::fs::read_to_string(&path)?;
        let ttp = Ttp::parse(&content)
            .map_err(|e| ExecError::Schema(format!("{}: {e}", path.display())))?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((ttp, dir))
    }

    /// Enumerate YAML documents under the search paths, sorted.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for search_path in &self.search_paths {
            collect_yaml(search_path, &mut found);
        }
        found.sort();
        found
    }
}

fn collect_yaml(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_yaml(&path, found);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        ) {
            found.push(path);
        }
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
