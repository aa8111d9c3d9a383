// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File script action: run a script file with an inferred or explicit
//! interpreter.

use super::finish_script_result;
use crate::outputs::OutputSpec;
use crate::process::{self, Interpreter};
use crate::{template, ActionResult, ExecError, ExecutionContext};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Run a script file resolved against the working directory and the
/// configured search paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileScript {
    pub file: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub outputs: IndexMap<String, OutputSpec>,
    #[serde(default)]
    pub outputvar: Option<String>,
    #[serde(skip)]
    resolved: Option<PathBuf>,
}

impl FileScript {
    pub fn is_empty(&self) -> bool {
        self.file.trim().is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        template::render_fields(
            &ctx.vars,
            std::iter::once(&mut self.file).chain(self.args.iter_mut()),
        )
    }

    pub fn validate(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("script file is empty".into()));
        }
        let mut candidates = vec![PathBuf::from(&self.file)];
        if !candidates[0].is_absolute() {
            candidates.push(ctx.vars.work_dir.join(&self.file));
            for search_path in &ctx.cfg.search_paths {
                candidates.push(search_path.join(&self.file));
            }
        }
        let found = candidates
            .into_iter()
            .find(|c| c.is_file())
            .ok_or_else(|| {
                ExecError::Validation(format!("script file {:?} not found", self.file))
            })?;
        // Absolute-path it so execution is stable under workdir changes.
        self.resolved = Some(found.canonicalize()?);
        if let Some(executor) = self.executor.as_deref() {
            Interpreter::from_name(executor)?;
        }
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let path = self
            .resolved
            .clone()
            .ok_or_else(|| ExecError::Validation(format!("script file {:?} unresolved", self.file)))?;
        let interpreter = match self.executor.as_deref() {
            Some(name) => Interpreter::from_name(name)?,
            None => Interpreter::from_path(&path),
        };
        tracing::info!(
            file = %path.display(),
            executor = interpreter.program(),
            "running file script"
        );
        let raw = process::run_file(
            ctx,
            &interpreter,
            &path,
            &self.args,
            &self.env,
            process::DEFAULT_TIMEOUT,
        )
        .await?;
        finish_script_result(ctx, raw, &self.outputs, self.outputvar.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_in(dir: &std::path::Path) -> ExecutionContext {
        let (tx, _rx) = tokio::sync::broadcast::channel(1);
        ExecutionContext::new(
            crate::ExecutionConfig::default(),
            dir.to_path_buf(),
            tx,
        )
    }

    fn script(yaml: &str) -> FileScript {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn validate_resolves_against_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("probe.sh"), "echo hi\n").unwrap();
        let mut action = script("file: probe.sh\n");
        action.validate(&ctx_in(dir.path())).unwrap();
        assert!(action.resolved.as_ref().unwrap().is_absolute());
    }

    #[test]
    fn validate_resolves_against_search_paths() {
        let workdir = tempfile::tempdir().unwrap();
        let scripts = tempfile::tempdir().unwrap();
        std::fs::write(scripts.path().join("probe.sh"), "echo hi\n").unwrap();
        let mut ctx = ctx_in(workdir.path());
        ctx.cfg.search_paths = vec![scripts.path().to_path_buf()];
        let mut action = script("file: probe.sh\n");
        action.validate(&ctx).unwrap();
        assert!(action
            .resolved
            .as_ref()
            .unwrap()
            .starts_with(scripts.path().canonicalize().unwrap()));
    }

    #[test]
    fn missing_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut action = script("file: ghost.sh\n");
        let err = action.validate(&ctx_in(dir.path())).unwrap_err();
        assert!(err.to_string().contains("ghost.sh"));
    }

    #[tokio::test]
    async fn executes_with_args_and_outputvar() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("greet.sh"), "echo \"hi $1\"\n").unwrap();
        let mut ctx = ctx_in(dir.path());
        let mut action = script("file: greet.sh\nargs: [there]\noutputvar: greeting\n");
        action.validate(&ctx).unwrap();
        let result = action.execute(&mut ctx).await.unwrap();
        assert_eq!(result.stdout, "hi there\n");
        assert_eq!(
            ctx.vars.step_vars.get("greeting").map(String::as_str),
            Some("hi there")
        );
    }
}
