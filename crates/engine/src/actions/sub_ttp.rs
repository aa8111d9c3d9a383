// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sub-procedure action: run a nested TTP inside a derived context.
//!
//! On success the action captures the child's final steps, vars, and result
//! record into a synthesized `SubTtpCleanup`; when the parent's cleanup
//! phase reaches this step, that action drives the nested cleanup
//! orchestrator, preserving reverse ordering end to end. Capturing at
//! completion time (rather than holding a live back-reference) keeps the
//! ownership graph acyclic.

use crate::actions::Action;
use crate::{
    args, checks, cleanup, runner, template, vars, ActionResult, ExecError, ExecutionContext,
    ExecutionVars, ResultRecord, Step, Ttp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// Run another TTP as a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubTtp {
    /// Reference to the nested document, resolved against the parent's
    /// working directory and the repository search paths.
    pub ttp: String,
    #[serde(default)]
    pub args: HashMap<String, String>,
    #[serde(skip)]
    loaded: Option<Box<Loaded>>,
    #[serde(skip)]
    completed: Option<Box<SubTtpCleanup>>,
}

#[derive(Debug, Clone)]
struct Loaded {
    doc: Ttp,
    dir: PathBuf,
}

impl SubTtp {
    /// Build a sub-ttp action programmatically.
    pub fn reference(ttp: impl Into<String>) -> Self {
        Self {
            ttp: ttp.into(),
            args: HashMap::new(),
            loaded: None,
            completed: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ttp.trim().is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        template::render_fields(
            &ctx.vars,
            std::iter::once(&mut self.ttp).chain(self.args.values_mut()),
        )
    }

    pub fn validate(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("ttp reference is empty".into()));
        }
        let (doc, dir) = ctx
            .cfg
            .repo
            .load(&self.ttp, Some(&ctx.vars.work_dir))?;
        args::validate_specs(&doc.args)?;
        if !ctx.cfg.skip_checks {
            if let Some(requirements) = &doc.requirements {
                checks::verify(requirements)?;
            }
        }
        self.loaded = Some(Box::new(Loaded { doc, dir }));
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let loaded = match self.loaded.take() {
            Some(loaded) => *loaded,
            None => {
                let (doc, dir) = ctx.cfg.repo.load(&self.ttp, Some(&ctx.vars.work_dir))?;
                Loaded { doc, dir }
            }
        };
        let mut child = ctx.child(loaded.dir);

        // Argument values may reference parent step results.
        let mut pairs = Vec::with_capacity(self.args.len());
        for (key, value) in &self.args {
            let value = vars::expand_str(value, &ctx.record)?;
            pairs.push(format!("{key}={value}"));
        }
        child.vars.step_vars = args::bind(&loaded.doc.args, &pairs)?;

        let mut steps = loaded.doc.steps;
        let mut shutdown = child.subscribe_shutdown();
        tracing::info!(ttp = %self.ttp, steps = steps.len(), "running sub-ttp");
        let phase: Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + '_>> =
            Box::pin(runner::run_phase(&mut child, &mut steps, &mut shutdown));
        match phase.await {
            Ok(()) => {
                // Defer the nested cleanup to the parent's cleanup phase.
                self.completed = Some(Box::new(SubTtpCleanup {
                    steps,
                    vars: child.vars,
                    record: child.record,
                }));
                Ok(ActionResult::default())
            }
            Err(error) => {
                // The nested run aborted: unwind its completed steps now,
                // since the parent will never record this step.
                let unwind: Pin<
                    Box<dyn Future<Output = Vec<crate::CleanupFailure>> + Send + '_>,
                > = Box::pin(cleanup::run(&mut child, &mut steps, &mut shutdown));
                for failure in unwind.await {
                    tracing::error!(ttp = %self.ttp, %failure, "sub-ttp cleanup failure");
                }
                Err(error)
            }
        }
    }

    pub fn default_cleanup(&self) -> Option<Action> {
        self.completed
            .as_ref()
            .map(|completed| Action::SubTtpCleanup((**completed).clone()))
    }
}

/// Synthesized cleanup that replays the child's cleanup orchestrator.
#[derive(Debug, Clone)]
pub struct SubTtpCleanup {
    steps: Vec<Step>,
    vars: ExecutionVars,
    record: ResultRecord,
}

impl SubTtpCleanup {
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    pub fn template(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        Ok(())
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let mut child = ctx.child(self.vars.work_dir.clone());
        child.vars = self.vars.clone();
        child.record = self.record.clone();
        let mut steps = self.steps.clone();
        let mut shutdown = child.subscribe_shutdown();
        tracing::info!(steps = child.record.len(), "running nested cleanup");
        let unwind: Pin<Box<dyn Future<Output = Vec<crate::CleanupFailure>> + Send + '_>> =
            Box::pin(cleanup::run(&mut child, &mut steps, &mut shutdown));
        let failures = unwind.await;
        if failures.is_empty() {
            Ok(ActionResult::default())
        } else {
            Err(ExecError::Protocol(format!(
                "{} nested cleanup action(s) failed",
                failures.len()
            )))
        }
    }
}
