// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step orchestrator: the main phase of a run.
//!
//! For each step in order: check for shutdown, template, validate, execute,
//! record. The first error aborts the phase; the cleanup orchestrator then
//! unwinds whatever was recorded. A shutdown event never preempts the
//! currently running action — it only stops subsequent steps.

use crate::{cleanup, context, ActionResult, CleanupFailure, ExecError, ExecutionContext, Step};

/// Outcome of a full run: the first main-phase error (if any) plus the
/// collected cleanup failures.
#[derive(Debug, Default)]
pub struct RunReport {
    pub error: Option<ExecError>,
    pub cleanup_failures: Vec<CleanupFailure>,
}

impl RunReport {
    /// True when both phases finished without error.
    pub fn success(&self) -> bool {
        self.error.is_none() && self.cleanup_failures.is_empty()
    }
}

/// Run the main phase, then always unwind (unless cleanup is disabled).
///
/// One receiver is subscribed up front so a shutdown arriving during the
/// main phase is still visible to the cleanup phase.
pub async fn run_ttp(ctx: &mut ExecutionContext, steps: &mut [Step]) -> RunReport {
    let mut shutdown = ctx.subscribe_shutdown();
    let error = run_phase(ctx, steps, &mut shutdown).await.err();
    if let Some(error) = &error {
        tracing::error!(%error, "main phase aborted");
    }
    let cleanup_failures = if ctx.cfg.no_cleanup {
        tracing::info!("cleanup disabled, leaving side effects in place");
        Vec::new()
    } else {
        cleanup::run(ctx, steps, &mut shutdown).await
    };
    RunReport {
        error,
        cleanup_failures,
    }
}

/// Execute steps in order, recording each success. Also used directly by
/// the sub-ttp action, which defers cleanup to its parent.
pub(crate) async fn run_phase(
    ctx: &mut ExecutionContext,
    steps: &mut [Step],
    shutdown: &mut tokio::sync::broadcast::Receiver<()>,
) -> Result<(), ExecError> {
    for step in steps.iter_mut() {
        if context::shutdown_pending(shutdown) {
            tracing::warn!(step = %step.name, "shutdown requested, stopping before step");
            return Err(ExecError::Shutdown);
        }
        tracing::info!(step = %step.name, action = step.action.kind(), "running step");
        step.action.template(ctx)?;
        step.action.validate(ctx)?;
        if ctx.cfg.dry_run {
            tracing::info!(step = %step.name, "dry run, recording empty result");
            ctx.record.insert(step.name.clone(), ActionResult::default())?;
            continue;
        }
        // A failed step records nothing; its cleanup must not run.
        let result = step.action.execute(ctx).await?;
        ctx.record.insert(step.name.clone(), result)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
