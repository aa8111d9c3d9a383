// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup orchestrator: best-effort unwinding in reverse execution order.
//!
//! Walks the result record backwards; for each recorded step it runs the
//! declared cleanup action, falling back to the action's default. Failures
//! are collected and logged but never stop the remaining cleanups. A first
//! shutdown event skips the inter-step delay; a second abandons the phase.

use crate::actions::Action;
use crate::{context, CleanupFailure, ExecError, ExecutionContext, Step};

/// Unwind the recorded steps. Returns the collected failures.
pub(crate) async fn run(
    ctx: &mut ExecutionContext,
    steps: &mut [Step],
    shutdown: &mut tokio::sync::broadcast::Receiver<()>,
) -> Vec<CleanupFailure> {
    let names = ctx.record.names_rev();
    if names.is_empty() {
        return Vec::new();
    }
    tracing::info!(steps = names.len(), "running cleanup phase");

    let mut interrupted = false;
    let mut failures = Vec::new();
    let mut first = true;

    for name in names {
        if context::shutdown_pending(shutdown) {
            if interrupted {
                tracing::warn!("second shutdown, abandoning remaining cleanups");
                break;
            }
            tracing::warn!("shutdown requested, skipping cleanup delays");
            interrupted = true;
        }
        if !first && !interrupted && !ctx.cfg.cleanup_delay.is_zero() {
            tokio::time::sleep(ctx.cfg.cleanup_delay).await;
        }
        first = false;

        let Some(step) = steps.iter_mut().find(|s| s.name == name) else {
            // Recorded under a name the step list no longer carries; nothing
            // to reverse.
            continue;
        };
        let mut synthesized;
        let action: &mut Action = if let Some(declared) = step.cleanup.as_mut() {
            declared
        } else if let Some(default) = step.action.default_cleanup() {
            synthesized = default;
            &mut synthesized
        } else {
            tracing::debug!(step = %name, "no cleanup declared or defaulted, skipping");
            continue;
        };

        if ctx.cfg.dry_run {
            tracing::info!(step = %name, "dry run, skipping cleanup execution");
            continue;
        }
        tracing::info!(step = %name, action = action.kind(), "running cleanup");
        if let Err(error) = run_one(ctx, action).await {
            tracing::error!(step = %name, %error, "cleanup failed, continuing");
            failures.push(CleanupFailure {
                step: name.clone(),
                error,
            });
        }
    }
    failures
}

async fn run_one(ctx: &mut ExecutionContext, action: &mut Action) -> Result<(), ExecError> {
    action.template(ctx)?;
    action.validate(ctx)?;
    action.execute(ctx).await?;
    Ok(())
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
