// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetch-URI action: GET a resource and write it to disk.

use super::{build_client, check_url, resolve_in_workdir, RemoveFile};
use crate::actions::Action;
use crate::{template, ActionResult, ExecError, ExecutionContext};
use serde::{Deserialize, Serialize};

/// Download `fetch_uri` to `location`, optionally through a proxy. Its
/// default cleanup removes the downloaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchUri {
    #[serde(rename = "fetch_uri")]
    pub uri: String,
    pub location: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
}

impl FetchUri {
    pub fn is_empty(&self) -> bool {
        self.uri.trim().is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        let mut fields = vec![&mut self.uri, &mut self.location];
        if let Some(proxy) = self.proxy.as_mut() {
            fields.push(proxy);
        }
        template::render_fields(&ctx.vars, fields)
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("fetch_uri is empty".into()));
        }
        if self.location.trim().is_empty() {
            return Err(ExecError::Validation("fetch location is empty".into()));
        }
        check_url("uri", &self.uri)?;
        if let Some(proxy) = self.proxy.as_deref() {
            check_url("proxy", proxy)?;
        }
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let target = resolve_in_workdir(&ctx.vars, &self.location);
        if ctx.cfg.fs.exists(&target) && !self.overwrite {
            return Err(ExecError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!(
                    "file {} already exists (set overwrite: true to replace it)",
                    target.display()
                ),
            )));
        }
        let client = build_client(ctx.cfg.no_proxy, self.proxy.as_deref())?;
        tracing::info!(uri = %self.uri, location = %target.display(), "fetching uri");
        let response = client.get(&self.uri).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExecError::Protocol(format!(
                "fetch of {} returned status {status}",
                self.uri
            )));
        }
        let bytes = response.bytes().await?;
        ctx.cfg.fs.write(&target, &bytes, 0o644)?;
        Ok(ActionResult::default())
    }

    pub fn default_cleanup(&self) -> Option<Action> {
        Some(Action::RemoveFile(RemoveFile::new(self.location.clone())))
    }
}
