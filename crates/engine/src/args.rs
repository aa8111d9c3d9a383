// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument specifications and command-line binding.
//!
//! A TTP preamble may declare arguments; the binder turns `key=value` pairs
//! from the command line into the run's initial step vars, applying
//! defaults and validating types, choices, and regexps.

use crate::ExecError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One declared argument in the TTP preamble.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ArgKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<serde_yaml::Value>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub regexp: Option<String>,
}

/// Value type of an argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    #[default]
    String,
    Int,
    Bool,
    Path,
}

/// Structural validation of the declared specs themselves.
pub fn validate_specs(specs: &[ArgSpec]) -> Result<(), ExecError> {
    let mut seen = std::collections::HashSet::new();
    for spec in specs {
        if spec.name.is_empty() {
            return Err(ExecError::Schema("argument with empty name".into()));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(ExecError::Schema(format!(
                "duplicate argument {:?}",
                spec.name
            )));
        }
        if let Some(pattern) = &spec.regexp {
            Regex::new(pattern).map_err(|e| {
                ExecError::Schema(format!(
                    "argument {:?} has invalid regexp {pattern:?}: {e}",
                    spec.name
                ))
            })?;
        }
    }
    Ok(())
}

/// Bind `key=value` command-line pairs against the declared specs.
pub fn bind(specs: &[ArgSpec], cli: &[String]) -> Result<HashMap<String, String>, ExecError> {
    let mut provided = HashMap::new();
    for pair in cli {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(ExecError::Validation(format!(
                "argument {pair:?} is not of the form key=value"
            )));
        };
        if !specs.iter().any(|s| s.name == key) {
            return Err(ExecError::Validation(format!(
                "unknown argument {key:?}"
            )));
        }
        provided.insert(key.to_string(), value.to_string());
    }

    let mut bound = HashMap::with_capacity(specs.len());
    for spec in specs {
        let value = match provided.remove(&spec.name) {
            Some(v) => v,
            None => match &spec.default {
                Some(default) => value_to_string(default),
                None => {
                    return Err(ExecError::Validation(format!(
                        "missing required argument {:?}",
                        spec.name
                    )))
                }
            },
        };
        check_value(spec, &value)?;
        bound.insert(spec.name.clone(), value);
    }
    Ok(bound)
}

fn check_value(spec: &ArgSpec, value: &str) -> Result<(), ExecError> {
    match spec.kind {
        ArgKind::Int => {
            value.parse::<i64>().map_err(|_| {
                ExecError::Validation(format!(
                    "argument {:?} expects an integer, got {value:?}",
                    spec.name
                ))
            })?;
        }
        ArgKind::Bool => {
            if !matches!(value, "true" | "false") {
                return Err(ExecError::Validation(format!(
                    "argument {:?} expects true or false, got {value:?}",
                    spec.name
                )));
            }
        }
        ArgKind::String | ArgKind::Path => {}
    }
    if !spec.choices.is_empty() && !spec.choices.iter().any(|c| c == value) {
        return Err(ExecError::Validation(format!(
            "argument {:?} must be one of {:?}, got {value:?}",
            spec.name, spec.choices
        )));
    }
    if let Some(pattern) = &spec.regexp {
        let re = Regex::new(pattern).map_err(|e| {
            ExecError::Validation(format!("invalid regexp {pattern:?}: {e}"))
        })?;
        if !re.is_match(value) {
            return Err(ExecError::Validation(format!(
                "argument {:?} value {value:?} does not match {pattern:?}",
                spec.name
            )));
        }
    }
    Ok(())
}

fn value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
