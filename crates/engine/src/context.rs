// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutable per-run execution state

use crate::{ExecutionConfig, ResultRecord};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Mutable variables shared by the steps of one run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionVars {
    /// Working directory for subprocesses and relative paths, seeded from
    /// the TTP document's on-disk location.
    pub work_dir: PathBuf,
    /// Keyed string store that actions read and write.
    pub step_vars: HashMap<String, String>,
}

/// State bundle for one run: config, vars, result record, and the shutdown
/// channel.
///
/// The context exclusively owns its vars and record. A sub-procedure gets a
/// [`child`](ExecutionContext::child) context that shares only the config
/// and the shutdown channel.
#[derive(Debug)]
pub struct ExecutionContext {
    /// Immutable run configuration.
    pub cfg: ExecutionConfig,
    /// Mutable variable store.
    pub vars: ExecutionVars,
    /// Results of completed steps, in execution order.
    pub record: ResultRecord,
    shutdown: broadcast::Sender<()>,
}

impl ExecutionContext {
    /// Create a context for a top-level run.
    ///
    /// `shutdown` is typically the sender installed by [`crate::signal`];
    /// tests pass their own channel.
    pub fn new(cfg: ExecutionConfig, work_dir: PathBuf, shutdown: broadcast::Sender<()>) -> Self {
        Self {
            cfg,
            vars: ExecutionVars {
                work_dir,
                step_vars: HashMap::new(),
            },
            record: ResultRecord::new(),
            shutdown,
        }
    }

    /// Derive a sub-procedure context: same config and shutdown channel,
    /// fresh vars and record.
    pub fn child(&self, work_dir: PathBuf) -> Self {
        Self::new(self.cfg.clone(), work_dir, self.shutdown.clone())
    }

    /// Subscribe to shutdown notifications.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }
}

/// Non-blocking check for a pending shutdown event.
pub fn shutdown_pending(rx: &mut broadcast::Receiver<()>) -> bool {
    matches!(rx.try_recv(), Ok(()) | Err(TryRecvError::Lagged(_)))
}
