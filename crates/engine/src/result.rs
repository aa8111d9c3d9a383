// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step execution results and the ordered result record

use crate::ExecError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outcome of one action's execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Captured stdout of the action, verbatim.
    #[serde(default)]
    pub stdout: String,
    /// Captured stderr of the action, verbatim.
    #[serde(default)]
    pub stderr: String,
    /// Exit code of the underlying process (0 for non-process actions).
    #[serde(default)]
    pub exit_code: i32,
    /// Named values parsed from stdout per the step's output specs.
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
}

/// Ordered record of completed steps for one run.
///
/// An entry exists iff the step's action ran to completion without error.
/// Insertion order is execution order; the cleanup phase iterates it in
/// reverse.
#[derive(Debug, Clone, Default)]
pub struct ResultRecord {
    entries: IndexMap<String, ActionResult>,
}

impl ResultRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step result. Step names are unique within one record.
    pub fn insert(&mut self, name: impl Into<String>, result: ActionResult) -> Result<(), ExecError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(ExecError::Validation(format!(
                "duplicate result for step {name:?}"
            )));
        }
        self.entries.insert(name, result);
        Ok(())
    }

    /// Look up a step result by name.
    pub fn get(&self, name: &str) -> Option<&ActionResult> {
        self.entries.get(name)
    }

    /// Whether a step has a recorded result.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Step names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Step names in reverse execution order, owned (the cleanup phase
    /// mutates state while walking them).
    pub fn names_rev(&self) -> Vec<String> {
        self.entries.keys().rev().cloned().collect()
    }

    /// Iterate entries in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionResult)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
