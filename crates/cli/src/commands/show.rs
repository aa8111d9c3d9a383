// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge show` - print a TTP's preamble, arguments, and steps

use anyhow::{Context, Result};
use clap::Args;
use forge_engine::Repo;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// TTP reference: a path, or a name resolved against the search paths
    pub ttp: String,

    /// Additional search path, repeatable
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,
}

pub fn execute(args: ShowArgs) -> Result<i32> {
    let repo = Repo::new(args.search_paths);
    let cwd = std::env::current_dir()?;
    let (ttp, _dir) = repo
        .load(&args.ttp, Some(&cwd))
        .with_context(|| format!("loading ttp {:?}", args.ttp))?;

    println!("name:        {}", ttp.name);
    if !ttp.description.is_empty() {
        println!("description: {}", ttp.description);
    }
    println!("api_version: {}", ttp.api_version);
    if let Some(uuid) = &ttp.uuid {
        println!("uuid:        {uuid}");
    }
    if let Some(mitre) = &ttp.mitre {
        if !mitre.tactics.is_empty() {
            println!("tactics:     {}", mitre.tactics.join(", "));
        }
        if !mitre.techniques.is_empty() {
            println!("techniques:  {}", mitre.techniques.join(", "));
        }
    }
    if !ttp.args.is_empty() {
        println!("args:");
        for arg in &ttp.args {
            let default = arg
                .default
                .as_ref()
                .and_then(|v| serde_yaml::to_string(v).ok())
                .map(|v| format!(" (default: {})", v.trim_end()))
                .unwrap_or_default();
            println!("  - {}{default}", arg.name);
        }
    }
    println!("steps:");
    for (index, step) in ttp.steps.iter().enumerate() {
        let cleanup = if step.cleanup.is_some() {
            " [cleanup]"
        } else {
            ""
        };
        println!(
            "  {}. {} ({}){cleanup}",
            index + 1,
            step.name,
            step.action.kind()
        );
    }
    Ok(0)
}
