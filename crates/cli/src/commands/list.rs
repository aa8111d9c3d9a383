// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge list` - enumerate TTP documents under the search paths

use anyhow::Result;
use clap::Args;
use forge_engine::Repo;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Search path, repeatable (defaults to the current directory)
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,
}

pub fn execute(args: ListArgs) -> Result<i32> {
    let search_paths = if args.search_paths.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        args.search_paths
    };
    let repo = Repo::new(search_paths);
    for path in repo.list() {
        println!("{}", path.display());
    }
    Ok(0)
}
