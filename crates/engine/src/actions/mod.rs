// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The action registry: every kind of work a step can perform.
//!
//! Actions form a closed set. Each variant implements the same capability
//! surface (`is_empty`, `template`, `validate`, `execute`,
//! `default_cleanup`, `can_nest_in_composite`); the enum dispatches.
//! `RemoveFile`, `SubTtpCleanup`, and `Composite` are internal variants that
//! never appear in documents — they are synthesized as cleanups.

mod composite;
mod create_file;
mod expect;
mod fetch_uri;
mod file_script;
mod http;
mod inline;
mod print_str;
mod remove_file;
mod sub_ttp;

pub use composite::Composite;
pub use create_file::CreateFile;
pub use expect::{ExpectResponse, ExpectScript, ExpectSpec};
pub use fetch_uri::FetchUri;
pub use file_script::FileScript;
pub use http::{HttpRequest, KeyValue};
pub use inline::InlineScript;
pub use print_str::PrintStr;
pub use remove_file::RemoveFile;
pub use sub_ttp::{SubTtp, SubTtpCleanup};

use crate::outputs::{self, OutputSpec};
use crate::process::RawOutput;
use crate::{ActionResult, ExecError, ExecutionContext, ExecutionVars};
use indexmap::IndexMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// One step's unit of work.
#[derive(Debug, Clone)]
pub enum Action {
    Inline(InlineScript),
    FileScript(FileScript),
    CreateFile(CreateFile),
    RemoveFile(RemoveFile),
    FetchUri(FetchUri),
    Http(HttpRequest),
    Print(PrintStr),
    Expect(ExpectScript),
    SubTtp(SubTtp),
    SubTtpCleanup(SubTtpCleanup),
    Composite(Composite),
}

impl Action {
    /// Short name of the variant, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inline(_) => "inline",
            Self::FileScript(_) => "file",
            Self::CreateFile(_) => "create_file",
            Self::RemoveFile(_) => "remove_file",
            Self::FetchUri(_) => "fetch_uri",
            Self::Http(_) => "http_request",
            Self::Print(_) => "print_str",
            Self::Expect(_) => "expect",
            Self::SubTtp(_) => "ttp",
            Self::SubTtpCleanup(_) => "ttp_cleanup",
            Self::Composite(_) => "composite",
        }
    }

    /// Whether the action carries no work.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Inline(a) => a.is_empty(),
            Self::FileScript(a) => a.is_empty(),
            Self::CreateFile(a) => a.is_empty(),
            Self::RemoveFile(a) => a.is_empty(),
            Self::FetchUri(a) => a.is_empty(),
            Self::Http(a) => a.is_empty(),
            Self::Print(a) => a.is_empty(),
            Self::Expect(a) => a.is_empty(),
            Self::SubTtp(a) => a.is_empty(),
            Self::SubTtpCleanup(a) => a.is_empty(),
            Self::Composite(a) => a.is_empty(),
        }
    }

    /// Render the action's templated fields against the execution vars.
    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        match self {
            Self::Inline(a) => a.template(ctx),
            Self::FileScript(a) => a.template(ctx),
            Self::CreateFile(a) => a.template(ctx),
            Self::RemoveFile(a) => a.template(ctx),
            Self::FetchUri(a) => a.template(ctx),
            Self::Http(a) => a.template(ctx),
            Self::Print(a) => a.template(ctx),
            Self::Expect(a) => a.template(ctx),
            Self::SubTtp(a) => a.template(ctx),
            Self::SubTtpCleanup(a) => a.template(ctx),
            Self::Composite(a) => a.template(ctx),
        }
    }

    /// Check the action's fields after templating.
    pub fn validate(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        match self {
            Self::Inline(a) => a.validate(ctx),
            Self::FileScript(a) => a.validate(ctx),
            Self::CreateFile(a) => a.validate(ctx),
            Self::RemoveFile(a) => a.validate(ctx),
            Self::FetchUri(a) => a.validate(ctx),
            Self::Http(a) => a.validate(ctx),
            Self::Print(a) => a.validate(ctx),
            Self::Expect(a) => a.validate(ctx),
            Self::SubTtp(a) => a.validate(ctx),
            Self::SubTtpCleanup(a) => a.validate(ctx),
            Self::Composite(a) => a.validate(ctx),
        }
    }

    /// Perform the work. Runs exactly once per step in the main phase.
    ///
    /// Boxed explicitly (rather than a plain `async fn`) because this
    /// dispatch is mutually recursive with `Composite`/`SubTtp`, which
    /// themselves box their nested calls to assert `Send`; leaving this
    /// one as an opaque `impl Future` creates a recursive opaque type
    /// the compiler cannot resolve.
    pub fn execute<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<ActionResult, ExecError>> + Send + 'a>> {
        Box::pin(async move {
            match self {
                Self::Inline(a) => a.execute(ctx).await,
                Self::FileScript(a) => a.execute(ctx).await,
                Self::CreateFile(a) => a.execute(ctx),
                Self::RemoveFile(a) => a.execute(ctx),
                Self::FetchUri(a) => a.execute(ctx).await,
                Self::Http(a) => a.execute(ctx).await,
                Self::Print(a) => a.execute(ctx),
                Self::Expect(a) => a.execute(ctx).await,
                Self::SubTtp(a) => a.execute(ctx).await,
                Self::SubTtpCleanup(a) => a.execute(ctx).await,
                Self::Composite(a) => a.execute(ctx).await,
            }
        })
    }

    /// The reverse operation used when the step declares no cleanup.
    pub fn default_cleanup(&self) -> Option<Action> {
        match self {
            Self::CreateFile(a) => a.default_cleanup(),
            Self::FetchUri(a) => a.default_cleanup(),
            Self::Expect(a) => a.default_cleanup(),
            Self::SubTtp(a) => a.default_cleanup(),
            Self::Composite(a) => a.default_cleanup(),
            _ => None,
        }
    }

    /// Whether this action may appear inside a composite.
    pub fn can_nest_in_composite(&self) -> bool {
        !matches!(self, Self::SubTtp(_) | Self::SubTtpCleanup(_) | Self::Composite(_))
    }
}

/// Resolve a possibly relative path against the run's working directory.
pub(crate) fn resolve_in_workdir(vars: &ExecutionVars, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        vars.work_dir.join(path)
    }
}

/// Shared tail of the script actions: parse declared outputs, store the
/// trimmed stdout into the step var if requested, assemble the result.
pub(crate) fn finish_script_result(
    ctx: &mut ExecutionContext,
    raw: RawOutput,
    specs: &IndexMap<String, OutputSpec>,
    outputvar: Option<&str>,
) -> Result<ActionResult, ExecError> {
    let parsed = outputs::parse_outputs(specs, &raw.stdout)?;
    if let Some(var) = outputvar {
        ctx.vars
            .step_vars
            .insert(var.to_string(), raw.stdout.trim().to_string());
    }
    Ok(ActionResult {
        stdout: raw.stdout,
        stderr: raw.stderr,
        exit_code: raw.exit_code,
        outputs: parsed,
    })
}

/// Build an HTTP client honouring the run's proxy settings.
pub(crate) fn build_client(
    no_proxy: bool,
    proxy: Option<&str>,
) -> Result<reqwest::Client, ExecError> {
    let mut builder = reqwest::Client::builder();
    if no_proxy {
        builder = builder.no_proxy();
    } else if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

/// Validate a URL-shaped field: parseable with a host.
pub(crate) fn check_url(what: &str, value: &str) -> Result<(), ExecError> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| ExecError::Validation(format!("invalid {what} {value:?}: {e}")))?;
    if url.host_str().is_none() {
        return Err(ExecError::Validation(format!(
            "{what} {value:?} has no host"
        )));
    }
    Ok(())
}
