// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `$forge.` variable expansion against recorded step results.
//!
//! References have the form `$forge.steps.<name>.stdout` or
//! `$forge.steps.<name>.outputs.<key>` and resolve against the current
//! [`ResultRecord`]. A doubled sigil (`$$forge.`) escapes the reference and
//! yields the literal text with one `$` stripped.

use crate::{ExecError, ResultRecord};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Matches a candidate reference including any run of leading `$` sigils.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$*\$forge\.[\w.]*").expect("constant regex pattern is valid"));

const PREFIX: &str = "$forge.";

/// Expand every `$forge.` reference in `input`.
///
/// Returns the first resolution error encountered, naming the offending
/// match.
pub fn expand_str(input: &str, record: &ResultRecord) -> Result<String, ExecError> {
    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for found in REFERENCE_PATTERN.find_iter(input) {
        result.push_str(&input[last..found.start()]);
        let text = found.as_str();
        if text.starts_with("$$") {
            // Escaped reference: strip one sigil, emit the rest verbatim.
            result.push_str(&text[1..]);
        } else {
            result.push_str(&resolve(text, record)?);
        }
        last = found.end();
    }
    result.push_str(&input[last..]);
    Ok(result)
}

/// Expand a list of strings, failing on the first error.
pub fn expand(inputs: &[String], record: &ResultRecord) -> Result<Vec<String>, ExecError> {
    inputs.iter().map(|s| expand_str(s, record)).collect()
}

/// Expand the values of an environment map.
pub fn expand_env(
    env: &HashMap<String, String>,
    record: &ResultRecord,
) -> Result<HashMap<String, String>, ExecError> {
    env.iter()
        .map(|(k, v)| Ok((k.clone(), expand_str(v, record)?)))
        .collect()
}

/// Resolve one unescaped reference like `$forge.steps.s1.stdout`.
fn resolve(reference: &str, record: &ResultRecord) -> Result<String, ExecError> {
    let path = &reference[PREFIX.len()..];
    let tokens: Vec<&str> = path.split('.').collect();
    if tokens.iter().any(|t| t.is_empty()) {
        return Err(ExecError::Expansion(format!(
            "malformed variable reference {reference:?}"
        )));
    }
    match tokens.first() {
        Some(&"steps") => resolve_step(reference, &tokens[1..], record),
        Some(scope) => Err(ExecError::Expansion(format!(
            "unknown scope {scope:?} in variable reference {reference:?}"
        ))),
        None => Err(ExecError::Expansion(format!(
            "malformed variable reference {reference:?}"
        ))),
    }
}

fn resolve_step(
    reference: &str,
    tokens: &[&str],
    record: &ResultRecord,
) -> Result<String, ExecError> {
    let [name, rest @ ..] = tokens else {
        return Err(ExecError::Expansion(format!(
            "variable reference {reference:?} is missing a step name"
        )));
    };
    let result = record.get(name).ok_or_else(|| {
        ExecError::Expansion(format!(
            "variable reference {reference:?} names unknown step {name:?}"
        ))
    })?;
    match rest {
        ["stdout"] => Ok(result.stdout.clone()),
        ["outputs", key] => result.outputs.get(*key).cloned().ok_or_else(|| {
            ExecError::Expansion(format!(
                "variable reference {reference:?} names unknown output {key:?} of step {name:?}"
            ))
        }),
        _ => Err(ExecError::Expansion(format!(
            "variable reference {reference:?} has an unsupported field path"
        ))),
    }
}

#[cfg(test)]
#[path = "vars_tests.rs"]
mod tests;
