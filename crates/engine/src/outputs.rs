// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output extraction from captured stdout.
//!
//! A step may declare named outputs, each a chain of filters applied to the
//! captured stdout. The filtered value lands in
//! [`ActionResult::outputs`](crate::ActionResult) and is reachable from
//! later steps via `$forge.steps.<name>.outputs.<key>`.

use crate::ExecError;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Declared output: a filter chain applied to captured stdout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub filters: Vec<Filter>,
}

/// One filter in an output chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Walk a dot-separated path through a JSON document
    /// (`foo.bar.0.baz`; numeric tokens index arrays).
    JsonPath(String),
    /// Keep the first regex match; capture group 1 if the pattern has one,
    /// the whole match otherwise.
    Regex(String),
}

/// Apply every declared output spec to `stdout`.
pub fn parse_outputs(
    specs: &IndexMap<String, OutputSpec>,
    stdout: &str,
) -> Result<IndexMap<String, String>, ExecError> {
    let mut outputs = IndexMap::with_capacity(specs.len());
    for (name, spec) in specs {
        let mut value = stdout.to_string();
        for filter in &spec.filters {
            value = apply_filter(name, filter, &value)?;
        }
        outputs.insert(name.clone(), value);
    }
    Ok(outputs)
}

fn apply_filter(name: &str, filter: &Filter, input: &str) -> Result<String, ExecError> {
    match filter {
        Filter::JsonPath(path) => apply_json_path(name, path, input),
        Filter::Regex(pattern) => apply_regex(name, pattern, input),
    }
}

fn apply_json_path(name: &str, path: &str, input: &str) -> Result<String, ExecError> {
    let root: serde_json::Value = serde_json::from_str(input).map_err(|e| ExecError::Output {
        name: name.to_string(),
        message: format!("stdout is not valid JSON: {e}"),
    })?;
    let mut current = &root;
    for token in path.split('.') {
        if token.is_empty() {
            return Err(ExecError::Output {
                name: name.to_string(),
                message: format!("malformed json_path {path:?}"),
            });
        }
        current = match current {
            serde_json::Value::Object(map) => map.get(token),
            serde_json::Value::Array(items) => token
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        }
        .ok_or_else(|| ExecError::Output {
            name: name.to_string(),
            message: format!("json_path {path:?} not found (at segment {token:?})"),
        })?;
    }
    Ok(match current {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn apply_regex(name: &str, pattern: &str, input: &str) -> Result<String, ExecError> {
    let re = Regex::new(pattern).map_err(|e| ExecError::Output {
        name: name.to_string(),
        message: format!("invalid regex {pattern:?}: {e}"),
    })?;
    let captures = re.captures(input).ok_or_else(|| ExecError::Output {
        name: name.to_string(),
        message: format!("no match for pattern {pattern:?}"),
    })?;
    let matched = captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    Ok(matched)
}

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;
