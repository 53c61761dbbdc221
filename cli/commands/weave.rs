use anyhow::{Context, Result};

use super::StageContext;
use crate::cli_args::WeaveArgs;
use crate::output;
use codeloom_core as core;

pub fn handle(args: WeaveArgs, quiet: bool) -> Result<()> {
    let ctx = super::stage_context(&args.project)?;
    execute(&ctx, quiet)
}

pub fn execute(ctx: &StageContext, quiet: bool) -> Result<()> {
    output::print_stage("Weaving codebase", quiet);
    let tree = ctx.layout.load_map()?;
    let output_file = ctx.layout.weave_path();
    core::weave_to_file(&tree, &ctx.project_root, &ctx.excluded_paths, &output_file)
        .context("Failed to weave the codebase")?;
    output::print_saved("Woven codebase", &output_file, quiet);
    Ok(())
}
