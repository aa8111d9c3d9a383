// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The TTP document: preamble plus an ordered list of steps.

use crate::args::{self, ArgSpec};
use crate::checks::Requirements;
use crate::{ExecError, Step};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use uuid::Uuid;

const SUPPORTED_API_VERSION: &str = "2.0";

/// A parsed procedure document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ttp {
    #[serde(
        default = "default_api_version",
        deserialize_with = "api_version_string"
    )]
    pub api_version: String,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mitre: Option<Mitre>,
    #[serde(default)]
    pub requirements: Option<Requirements>,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Optional ATT&CK mapping in the preamble.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mitre {
    #[serde(default)]
    pub tactics: Vec<String>,
    #[serde(default)]
    pub techniques: Vec<String>,
    #[serde(default)]
    pub subtechniques: Vec<String>,
}

impl Ttp {
    /// Parse a YAML document and run structural validation.
    pub fn parse(content: &str) -> Result<Self, ExecError> {
        let ttp: Ttp = serde_yaml::from_str(content)?;
        ttp.check()?;
        Ok(ttp)
    }

    /// Structural validation: api version, step names, argument specs.
    /// Action semantics are checked per step during the run, after
    /// templating.
    fn check(&self) -> Result<(), ExecError> {
        if self.api_version != SUPPORTED_API_VERSION {
            return Err(ExecError::Schema(format!(
                "unsupported api_version {:?} (expected {SUPPORTED_API_VERSION:?})",
                self.api_version
            )));
        }
        if self.steps.is_empty() {
            return Err(ExecError::Schema(format!(
                "ttp {:?} has no steps",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for step in &self.steps {
            step.check_name()?;
            if !seen.insert(step.name.as_str()) {
                return Err(ExecError::Schema(format!(
                    "duplicate step name {:?}",
                    step.name
                )));
            }
            if step.action.is_empty() {
                return Err(ExecError::Schema(format!(
                    "step {:?} has an empty {} action",
                    step.name,
                    step.action.kind()
                )));
            }
        }
        args::validate_specs(&self.args)?;
        Ok(())
    }
}

fn default_api_version() -> String {
    SUPPORTED_API_VERSION.to_string()
}

/// `api_version: 2.0` parses as a YAML float; accept both shapes.
fn api_version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("api_version must be a string")),
    }
}

#[cfg(test)]
#[path = "ttp_tests.rs"]
mod tests;
