// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge run` - execute a TTP with guaranteed cleanup

use anyhow::{Context, Result};
use clap::Args;
use forge_engine::{
    args as ttp_args, checks, run_ttp, signal, ExecutionConfig, ExecutionContext, Repo,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// TTP reference: a path, or a name resolved against the search paths
    pub ttp: String,

    /// Argument binding, repeatable
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Validate and record steps without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the cleanup phase, leaving side effects in place
    #[arg(long)]
    pub no_cleanup: bool,

    /// Seconds to sleep between successive cleanup actions
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub cleanup_delay: u64,

    /// Ignore any configured proxies
    #[arg(long)]
    pub no_proxy: bool,

    /// Skip the platform/privilege precheck
    #[arg(long)]
    pub skip_checks: bool,

    /// Additional search path for TTPs and scripts, repeatable
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,
}

pub async fn execute(args: RunArgs) -> Result<i32> {
    let repo = Arc::new(Repo::new(args.search_paths.clone()));
    let cwd = std::env::current_dir()?;
    let (mut ttp, dir) = repo
        .load(&args.ttp, Some(&cwd))
        .with_context(|| format!("loading ttp {:?}", args.ttp))?;

    if !args.skip_checks {
        if let Some(requirements) = &ttp.requirements {
            checks::verify(requirements).context("requirements check failed")?;
        }
    }

    let cfg = ExecutionConfig {
        dry_run: args.dry_run,
        no_cleanup: args.no_cleanup,
        skip_checks: args.skip_checks,
        cleanup_delay: Duration::from_secs(args.cleanup_delay),
        no_proxy: args.no_proxy,
        search_paths: args.search_paths,
        repo,
        ..ExecutionConfig::default()
    };
    let shutdown = signal::install();
    let mut ctx = ExecutionContext::new(cfg, dir, shutdown);
    ctx.vars.step_vars =
        ttp_args::bind(&ttp.args, &args.args).context("binding arguments")?;

    tracing::info!(name = %ttp.name, steps = ttp.steps.len(), "running ttp");
    let report = run_ttp(&mut ctx, &mut ttp.steps).await;

    for failure in &report.cleanup_failures {
        eprintln!("{failure}");
    }
    if let Some(error) = &report.error {
        eprintln!("run failed: {error}");
    }
    Ok(if report.success() { 0 } else { 1 })
}
