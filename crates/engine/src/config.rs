// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable per-run execution configuration

use crate::fs::{FileSystem, OsFs};
use crate::repo::Repo;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A shared writable sink for captured process output.
///
/// The subprocess tee forwards each captured line here in addition to
/// accumulating it for the step result.
pub type OutputSink = Arc<Mutex<dyn Write + Send>>;

/// Sink wrapping the process stdout.
pub fn stdout_sink() -> OutputSink {
    Arc::new(Mutex::new(std::io::stdout()))
}

/// Sink wrapping the process stderr.
pub fn stderr_sink() -> OutputSink {
    Arc::new(Mutex::new(std::io::stderr()))
}

/// Configuration fixed for the duration of one run.
#[derive(Clone)]
pub struct ExecutionConfig {
    /// Validate and record steps without executing them.
    pub dry_run: bool,
    /// Skip the cleanup phase entirely.
    pub no_cleanup: bool,
    /// Skip the platform/privilege precheck.
    pub skip_checks: bool,
    /// Delay between successive cleanup actions.
    pub cleanup_delay: Duration,
    /// Ignore any configured proxies for network actions.
    pub no_proxy: bool,
    /// Directories searched when resolving script and TTP references.
    pub search_paths: Vec<PathBuf>,
    /// Opened handle to the procedure repository.
    pub repo: Arc<Repo>,
    /// Filesystem used by file-writing actions.
    pub fs: Arc<dyn FileSystem>,
    /// Sink receiving captured stdout.
    pub stdout: OutputSink,
    /// Sink receiving captured stderr.
    pub stderr: OutputSink,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            no_cleanup: false,
            skip_checks: false,
            cleanup_delay: Duration::ZERO,
            no_proxy: false,
            search_paths: Vec::new(),
            repo: Arc::new(Repo::default()),
            fs: Arc::new(OsFs),
            stdout: stdout_sink(),
            stderr: stderr_sink(),
        }
    }
}

impl fmt::Debug for ExecutionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionConfig")
            .field("dry_run", &self.dry_run)
            .field("no_cleanup", &self.no_cleanup)
            .field("skip_checks", &self.skip_checks)
            .field("cleanup_delay", &self.cleanup_delay)
            .field("no_proxy", &self.no_proxy)
            .field("search_paths", &self.search_paths)
            .finish_non_exhaustive()
    }
}
