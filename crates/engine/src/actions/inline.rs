// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inline script action: run a script body via an interpreter's stdin.

use super::finish_script_result;
use crate::outputs::OutputSpec;
use crate::process::{self, Interpreter};
use crate::{template, vars, ActionResult, ExecError, ExecutionContext};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Run an inline script body. The default interpreter is bash (with
/// errexit); `executor` overrides it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlineScript {
    pub inline: String,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub outputs: IndexMap<String, OutputSpec>,
    #[serde(default)]
    pub outputvar: Option<String>,
}

impl InlineScript {
    /// Build an inline bash action programmatically (used for synthesized
    /// cleanups).
    pub fn new(inline: impl Into<String>) -> Self {
        Self {
            inline: inline.into(),
            executor: None,
            env: HashMap::new(),
            outputs: IndexMap::new(),
            outputvar: None,
        }
    }

    fn interpreter(&self) -> Result<Interpreter, ExecError> {
        match self.executor.as_deref() {
            Some(name) => Interpreter::from_name(name),
            None => Ok(Interpreter::Bash),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inline.trim().is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        template::render_fields(&ctx.vars, [&mut self.inline])
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("inline script is empty".into()));
        }
        if self.interpreter()? == Interpreter::Binary {
            return Err(ExecError::Validation(
                "the binary executor cannot run inline scripts".into(),
            ));
        }
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let interpreter = self.interpreter()?;
        let body = vars::expand_str(&self.inline, &ctx.record)?;
        tracing::info!(executor = interpreter.program(), "running inline script");
        let raw = process::run_script(
            ctx,
            &interpreter,
            &body,
            &self.env,
            process::DEFAULT_TIMEOUT,
        )
        .await?;
        finish_script_result(ctx, raw, &self.outputs, self.outputvar.as_deref())
    }
}
