use anyhow::{Context, Result};

use super::StageContext;
use crate::cli_args::OptimizeArgs;
use crate::output;
use codeloom_core::analysis::ModelClient;
use codeloom_core::{AppError, CriticalFilesReport, optimize_files};

pub fn handle(args: OptimizeArgs, quiet: bool) -> Result<()> {
    let ctx = super::stage_context(&args.project)?;
    let client = super::build_model_client(&ctx.config, &args.model)?;
    execute(&ctx, &client, quiet)
}

pub fn execute(ctx: &StageContext, client: &dyn ModelClient, quiet: bool) -> Result<()> {
    output::print_stage("Optimizing critical files", quiet);

    let value = ctx.layout.load_critical_files_value()?;
    if value.get("error").is_some() {
        return Err(AppError::InvalidArgument(
            "critical-files report records a failed analysis; re-run the analyze stage".to_string(),
        )
        .into());
    }
    let report =
        CriticalFilesReport::from_value(value).context("Malformed critical-files report")?;
    if report.critical_files.is_empty() {
        if !quiet {
            println!("No critical files to optimize.");
        }
        return Ok(());
    }

    let summary = optimize_files(client, &ctx.project_root, &report)
        .context("Failed to optimize critical files")?;
    output::print_optimize_summary(&summary, quiet);
    Ok(())
}
