// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Print-string action: expand and write a message to the stdout sink.

use crate::{template, vars, ActionResult, ExecError, ExecutionContext};
use serde::{Deserialize, Serialize};
use std::io::Write as _;

/// Print a message, with `$forge.` references expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrintStr {
    #[serde(rename = "print_str")]
    pub message: String,
}

impl PrintStr {
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        template::render_fields(&ctx.vars, [&mut self.message])
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("print_str message is empty".into()));
        }
        Ok(())
    }

    pub fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let expanded = vars::expand_str(&self.message, &ctx.record)?;
        let line = format!("{expanded}\n");
        {
            let mut sink = ctx.cfg.stdout.lock();
            sink.write_all(line.as_bytes())?;
            sink.flush()?;
        }
        Ok(ActionResult {
            stdout: line,
            ..ActionResult::default()
        })
    }
}
