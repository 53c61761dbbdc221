use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Table, presets::UTF8_BORDERS_ONLY};
use serde_json::json;
use std::path::Path;

use codeloom_core::{CriticalFilesReport, ExtractionResult, FileOutcome, OptimizeSummary, OutputLayout};

pub fn print_stage(title: &str, quiet: bool) {
    if !quiet {
        println!("\n{}", title.cyan().bold());
    }
}

pub fn print_saved(label: &str, path: &Path, quiet: bool) {
    if !quiet {
        println!(
            "{} {} saved to: {}",
            "*".green(),
            label,
            path.display().to_string().blue()
        );
    }
}

/// Persist an extraction outcome: the parsed value as pretty JSON, or a
/// diagnostic record carrying the raw text when the model's reply could
/// not be parsed.
pub fn save_extraction(
    layout: &OutputLayout,
    path: &Path,
    label: &str,
    outcome: &ExtractionResult,
    quiet: bool,
) -> Result<()> {
    match outcome {
        ExtractionResult::Parsed(value) => {
            layout
                .save_report(path, value)
                .with_context(|| format!("Failed to save {}", label))?;
            print_saved(label, path, quiet);
        }
        ExtractionResult::Failed(raw_text) => {
            log::warn!("Could not parse model reply for {}; saving raw text.", label);
            let record = json!({
                "error": "Failed to parse model response as JSON",
                "rawResponse": raw_text,
            });
            layout
                .save_report(path, &record)
                .with_context(|| format!("Failed to save raw response for {}", label))?;
            if !quiet {
                println!(
                    "{} {} could not be parsed; raw response saved to: {}",
                    "!".yellow(),
                    label,
                    path.display().to_string().blue()
                );
            }
        }
    }
    Ok(())
}

pub fn print_critical_files(report: &CriticalFilesReport, quiet: bool) {
    if quiet || report.critical_files.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Reason", "Suggested improvements"]);
    for file in &report.critical_files {
        table.add_row(vec![
            file.path.clone(),
            file.reason.clone(),
            file.suggested_improvements.clone(),
        ]);
    }
    println!("{}", table);
}

pub fn print_optimize_summary(summary: &OptimizeSummary, quiet: bool) {
    if quiet {
        return;
    }
    for (path, outcome) in &summary.outcomes {
        match outcome {
            FileOutcome::Rewritten => {
                println!("{} {}: optimized content written", "*".green(), path)
            }
            FileOutcome::Unchanged => println!("{} {}: no changes necessary", "-".dimmed(), path),
            FileOutcome::Failed(reason) => {
                println!("{} {}: {}", "!".yellow(), path, reason)
            }
        }
    }
    println!(
        "\n{} {} file(s) rewritten.",
        "*".green(),
        summary.rewritten()
    );
}
