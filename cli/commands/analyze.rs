use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;

use super::StageContext;
use crate::cli_args::AnalyzeArgs;
use crate::output;
use codeloom_core::analysis::{self, ModelClient};
use codeloom_core::{CriticalFilesReport, ExtractionResult, split_artifact};

pub fn handle(args: AnalyzeArgs, quiet: bool) -> Result<()> {
    let ctx = super::stage_context(&args.project)?;
    let client = super::build_model_client(&ctx.config, &args.model)?;
    execute(&ctx, &client, args.max_critical_files, quiet)
}

pub fn execute(
    ctx: &StageContext,
    client: &dyn ModelClient,
    max_files_override: Option<usize>,
    quiet: bool,
) -> Result<()> {
    output::print_stage("Analyzing codebase", quiet);
    let max_files = max_files_override.unwrap_or(ctx.config.model.max_critical_files);

    let tree = ctx.layout.load_map()?;
    let organization = analysis::review_organization(client, &tree)
        .context("Organization analysis request failed")?;
    output::save_extraction(
        &ctx.layout,
        &ctx.layout.organization_path(),
        "Organization suggestions",
        &organization,
        quiet,
    )?;

    // The model boundary is rate-limited here, between consecutive calls,
    // never inside the core components.
    thread::sleep(Duration::from_millis(ctx.config.model.call_delay_ms));

    let woven_text = ctx.layout.load_weave_text()?;
    let records = split_artifact(&woven_text);
    let critical = analysis::select_critical_files(client, &records, max_files)
        .context("Critical-file selection request failed")?;
    output::save_extraction(
        &ctx.layout,
        &ctx.layout.critical_files_path(),
        "Critical-file suggestions",
        &critical,
        quiet,
    )?;

    if let ExtractionResult::Parsed(value) = critical {
        if let Ok(report) = CriticalFilesReport::from_value(value) {
            output::print_critical_files(&report, quiet);
        }
    }
    Ok(())
}
