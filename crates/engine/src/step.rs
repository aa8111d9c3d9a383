// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steps: a named unit of work wrapping one action and an optional cleanup.
//!
//! A step object carries `name`, an optional `description`, exactly one
//! action key (`inline`, `file`, `create_file`, `fetch_uri`, `http_request`,
//! `print_str`, `expect`, `ttp`) with its sibling parameter fields, and an
//! optional `cleanup` which is itself an action spec. Deserialization
//! dispatches on the single action key present.

use crate::actions::{
    Action, CreateFile, ExpectScript, FetchUri, FileScript, HttpRequest, InlineScript, PrintStr,
    SubTtp,
};
use crate::ExecError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Action keys recognized in step objects, in documentation order.
const ACTION_KEYS: [&str; 8] = [
    "inline",
    "file",
    "create_file",
    "fetch_uri",
    "http_request",
    "print_str",
    "expect",
    "ttp",
];

/// One named unit of work.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub description: Option<String>,
    pub action: Action,
    /// Declared cleanup; when absent the action's default applies.
    pub cleanup: Option<Action>,
}

impl Step {
    /// Build a step programmatically.
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            description: None,
            action,
            cleanup: None,
        }
    }

    /// Structural name rules: non-empty, no whitespace.
    pub fn check_name(&self) -> Result<(), ExecError> {
        if self.name.is_empty() {
            return Err(ExecError::Schema("step with empty name".into()));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(ExecError::Schema(format!(
                "step name {:?} contains whitespace",
                self.name
            )));
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw: BTreeMap<String, serde_yaml::Value> = BTreeMap::deserialize(deserializer)?;
        let name = match raw.remove("name") {
            Some(serde_yaml::Value::String(name)) => name,
            Some(_) => return Err(D::Error::custom("step name must be a string")),
            None => return Err(D::Error::custom("step is missing a name")),
        };
        let description = match raw.remove("description") {
            Some(serde_yaml::Value::String(description)) => Some(description),
            Some(_) => {
                return Err(D::Error::custom(format!(
                    "description of step {name:?} must be a string"
                )))
            }
            None => None,
        };
        let cleanup = match raw.remove("cleanup") {
            Some(value) => Some(
                parse_cleanup(value)
                    .map_err(|e| D::Error::custom(format!("cleanup of step {name:?}: {e}")))?,
            ),
            None => None,
        };
        let action =
            parse_action(raw).map_err(|e| D::Error::custom(format!("step {name:?}: {e}")))?;
        Ok(Step {
            name,
            description,
            action,
            cleanup,
        })
    }
}

/// Dispatch on the single action key present in the remaining fields.
fn parse_action(map: BTreeMap<String, serde_yaml::Value>) -> Result<Action, String> {
    let present: Vec<&str> = ACTION_KEYS
        .iter()
        .filter(|key| map.contains_key(**key))
        .copied()
        .collect();
    let key = match present.as_slice() {
        [key] => *key,
        [] => {
            return Err(format!(
                "no action field (expected one of {})",
                ACTION_KEYS.join(", ")
            ))
        }
        many => return Err(format!("multiple action fields: {}", many.join(", "))),
    };

    let mut mapping = serde_yaml::Mapping::new();
    for (field, value) in map {
        mapping.insert(serde_yaml::Value::String(field), value);
    }
    let value = serde_yaml::Value::Mapping(mapping);

    let action = match key {
        "inline" => Action::Inline(from_value::<InlineScript>(value)?),
        "file" => Action::FileScript(from_value::<FileScript>(value)?),
        "create_file" => Action::CreateFile(from_value::<CreateFile>(value)?),
        "fetch_uri" => Action::FetchUri(from_value::<FetchUri>(value)?),
        "http_request" => Action::Http(from_value::<HttpRequest>(value)?),
        "print_str" => Action::Print(from_value::<PrintStr>(value)?),
        "expect" => Action::Expect(from_value::<ExpectScript>(value)?),
        "ttp" => Action::SubTtp(from_value::<SubTtp>(value)?),
        other => return Err(format!("unhandled action key {other:?}")),
    };
    Ok(action)
}

/// A cleanup is a recursive step-shaped spec; its own name and description
/// are irrelevant and dropped.
fn parse_cleanup(value: serde_yaml::Value) -> Result<Action, String> {
    let mapping: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_value(value).map_err(|e| e.to_string())?;
    let mut mapping = mapping;
    mapping.remove("name");
    mapping.remove("description");
    parse_action(mapping)
}

fn from_value<T: serde::de::DeserializeOwned>(value: serde_yaml::Value) -> Result<T, String> {
    serde_yaml::from_value(value).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
