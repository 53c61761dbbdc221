use anyhow::Result;

use super::{analyze, map, optimize, weave};
use crate::cli_args::RunArgs;

/// The whole pipeline in one invocation: map, weave, analyze, optimize.
/// Each stage reads its input from the previous stage's artifact, so a
/// stage failure aborts the run with that stage's diagnostic.
pub fn handle(args: RunArgs, quiet: bool) -> Result<()> {
    let ctx = super::stage_context(&args.project)?;
    let client = super::build_model_client(&ctx.config, &args.model)?;

    map::execute(&ctx, &args.directories, args.max_lines, quiet)?;
    weave::execute(&ctx, quiet)?;
    analyze::execute(&ctx, &client, args.max_critical_files, quiet)?;
    optimize::execute(&ctx, &client, quiet)?;

    if !quiet {
        println!("\ncodeloom pipeline complete.");
    }
    Ok(())
}
