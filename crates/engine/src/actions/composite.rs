// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composite action: a sequence of nestable actions run as one unit.
//!
//! Built programmatically (most prominently as the composite-of-defaults
//! cleanup); never parsed from documents.

use crate::actions::Action;
use crate::{ActionResult, ExecError, ExecutionContext};

/// Execute contained actions in order; the first error aborts.
#[derive(Debug, Clone, Default)]
pub struct Composite {
    pub actions: Vec<Action>,
}

impl Composite {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.iter().all(Action::is_empty)
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        for action in &mut self.actions {
            action.template(ctx)?;
        }
        Ok(())
    }

    pub fn validate(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        for action in &mut self.actions {
            if !action.can_nest_in_composite() {
                return Err(ExecError::Validation(format!(
                    "{} actions cannot nest inside a composite",
                    action.kind()
                )));
            }
            action.validate(ctx)?;
        }
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let mut merged = ActionResult::default();
        for action in &mut self.actions {
            let result = action.execute(ctx).await?;
            merged.stdout.push_str(&result.stdout);
            merged.stderr.push_str(&result.stderr);
            merged.outputs.extend(result.outputs);
            merged.exit_code = result.exit_code;
        }
        Ok(merged)
    }

    pub fn default_cleanup(&self) -> Option<Action> {
        let cleanups: Vec<Action> = self
            .actions
            .iter()
            .filter_map(Action::default_cleanup)
            .collect();
        if cleanups.is_empty() {
            None
        } else {
            Some(Action::Composite(Composite::new(cleanups)))
        }
    }
}
