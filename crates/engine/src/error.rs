// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the execution engine

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading, validating, or executing a TTP
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("schema error: {0}")]
    Schema(String),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("variable expansion error: {0}")]
    Expansion(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("failed to spawn {command}: {source}")]
    Spawn { command: String, source: io::Error },
    #[error("exit status {code}")]
    NonZeroExit { code: i32 },
    #[error("timed out after {}s", .timeout.as_secs())]
    Timeout { timeout: Duration },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("output {name}: {message}")]
    Output { name: String, message: String },
    #[error("shutdown requested")]
    Shutdown,
}

/// A cleanup action that failed during the unwinding phase.
///
/// Cleanup failures are collected rather than propagated so that the
/// remaining cleanups still run.
#[derive(Debug)]
pub struct CleanupFailure {
    /// Name of the step whose cleanup failed.
    pub step: String,
    /// The underlying error.
    pub error: ExecError,
}

impl std::fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cleanup for step {:?} failed: {}", self.step, self.error)
    }
}
