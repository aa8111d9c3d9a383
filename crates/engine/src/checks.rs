// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform and privilege prechecks from the TTP preamble.

use crate::ExecError;
use serde::{Deserialize, Serialize};

/// Preconditions a TTP declares for its run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Requirements {
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub superuser: bool,
}

/// A platform the TTP supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Platform {
    pub os: String,
    #[serde(default)]
    pub arch: Option<String>,
}

impl Platform {
    fn matches_host(&self) -> bool {
        self.os == std::env::consts::OS
            && self
                .arch
                .as_deref()
                .map_or(true, |arch| arch == std::env::consts::ARCH)
    }
}

/// Verify the requirements against the current host.
pub fn verify(reqs: &Requirements) -> Result<(), ExecError> {
    if !reqs.platforms.is_empty() && !reqs.platforms.iter().any(Platform::matches_host) {
        let supported: Vec<&str> = reqs.platforms.iter().map(|p| p.os.as_str()).collect();
        return Err(ExecError::Validation(format!(
            "this ttp supports {supported:?}, host is {:?}",
            std::env::consts::OS
        )));
    }
    if reqs.superuser && !is_superuser()? {
        return Err(ExecError::Validation(
            "this ttp requires superuser privileges".into(),
        ));
    }
    Ok(())
}

#[cfg(unix)]
fn is_superuser() -> Result<bool, ExecError> {
    let output = std::process::Command::new("id").arg("-u").output()?;
    Ok(String::from_utf8_lossy(&output.stdout).trim() == "0")
}

#[cfg(not(unix))]
fn is_superuser() -> Result<bool, ExecError> {
    Err(ExecError::Validation(
        "superuser requirement checks are not supported on this platform".into(),
    ))
}
