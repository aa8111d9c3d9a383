// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remove-file action, synthesized as the default cleanup of file-writing
//! actions. Never parsed from documents.

use super::resolve_in_workdir;
use crate::{template, ActionResult, ExecError, ExecutionContext};

/// Remove a previously created file.
#[derive(Debug, Clone)]
pub struct RemoveFile {
    pub path: String,
}

impl RemoveFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.path.trim().is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        template::render_fields(&ctx.vars, [&mut self.path])
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("remove_file path is empty".into()));
        }
        Ok(())
    }

    pub fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let target = resolve_in_workdir(&ctx.vars, &self.path);
        tracing::info!(path = %target.display(), "removing file");
        ctx.cfg.fs.remove(&target)?;
        Ok(ActionResult::default())
    }
}
