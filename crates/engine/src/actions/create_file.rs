// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Create-file action: write declared contents through the filesystem seam.

use super::{resolve_in_workdir, RemoveFile};
use crate::actions::Action;
use crate::{template, ActionResult, ExecError, ExecutionContext};
use serde::{Deserialize, Serialize};

const DEFAULT_MODE: u32 = 0o644;

/// Write `contents` to a path, refusing to clobber unless `overwrite` is
/// set. Its default cleanup removes the file again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFile {
    #[serde(rename = "create_file")]
    pub path: String,
    #[serde(default)]
    pub contents: String,
    #[serde(default)]
    pub mode: Option<u32>,
    #[serde(default)]
    pub overwrite: bool,
}

impl CreateFile {
    pub fn is_empty(&self) -> bool {
        self.path.trim().is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        template::render_fields(&ctx.vars, [&mut self.path, &mut self.contents])
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("create_file path is empty".into()));
        }
        Ok(())
    }

    pub fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let target = resolve_in_workdir(&ctx.vars, &self.path);
        if ctx.cfg.fs.exists(&target) && !self.overwrite {
            return Err(ExecError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!(
                    "file {} already exists (set overwrite: true to replace it)",
                    target.display()
                ),
            )));
        }
        tracing::info!(path = %target.display(), "creating file");
        ctx.cfg.fs.write(
            &target,
            self.contents.as_bytes(),
            self.mode.unwrap_or(DEFAULT_MODE),
        )?;
        Ok(ActionResult::default())
    }

    pub fn default_cleanup(&self) -> Option<Action> {
        Some(Action::RemoveFile(RemoveFile::new(self.path.clone())))
    }
}
