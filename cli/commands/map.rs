use anyhow::{Context, Result};
use std::path::PathBuf;

use super::StageContext;
use crate::cli_args::MapArgs;
use crate::output;
use codeloom_core as core;

pub fn handle(args: MapArgs, quiet: bool) -> Result<()> {
    let ctx = super::stage_context(&args.project)?;
    execute(&ctx, &args.directories, args.max_lines, quiet)
}

pub fn execute(
    ctx: &StageContext,
    directories: &[PathBuf],
    max_lines_override: Option<u64>,
    quiet: bool,
) -> Result<()> {
    output::print_stage("Mapping codebase", quiet);
    let max_lines = max_lines_override.unwrap_or(ctx.config.scan.max_lines);

    ctx.layout
        .ensure()
        .context("Failed to create output directory")?;
    let tree = core::map_codebase(
        &ctx.project_root,
        directories,
        max_lines,
        &ctx.excluded_paths,
    )
    .context("Failed to map the codebase")?;
    let path = ctx
        .layout
        .save_map(&tree)
        .context("Failed to save the codebase map")?;
    output::print_saved("Codebase map", &path, quiet);
    Ok(())
}
