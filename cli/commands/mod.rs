pub mod analyze;
pub mod map;
pub mod optimize;
pub mod run;
pub mod weave;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::cli_args::{ModelOpts, ProjectOpts};
use crate::model::GeminiClient;
use codeloom_core::{AppError, Config, OutputLayout};

/// Everything a pipeline stage needs: the resolved project root, the
/// merged configuration, the artifact layout, and the output-directory
/// exclusion that keeps the tool from ingesting its own prior output.
pub struct StageContext {
    pub project_root: PathBuf,
    pub config: Config,
    pub layout: OutputLayout,
    pub excluded_paths: Vec<PathBuf>,
}

pub fn stage_context(project: &ProjectOpts) -> Result<StageContext> {
    let project_root = Config::determine_project_root(project.project_root.as_ref())
        .context("Failed to determine project root")?;
    let mut config = Config::load(&project_root).context("Failed to load configuration")?;
    if let Some(dir) = &project.output_dir {
        config.output.dir = dir.clone();
    }

    let output_dir = config.output_dir(&project_root);
    let mut excluded_paths = Vec::new();
    match pathdiff::diff_paths(&output_dir, &project_root) {
        Some(relative) if !relative.starts_with("..") => excluded_paths.push(relative),
        _ => log::debug!(
            "Output directory {} lies outside the project root; no exclusion needed.",
            output_dir.display()
        ),
    }

    Ok(StageContext {
        project_root,
        config,
        layout: OutputLayout::new(output_dir),
        excluded_paths,
    })
}

/// The API key is an environment concern of the CLI alone; the core
/// receives it only through the constructed client.
pub fn build_model_client(config: &Config, opts: &ModelOpts) -> Result<GeminiClient> {
    let api_key = match &opts.api_key {
        Some(key) => key.clone(),
        None => env::var("GEMINI_API_KEY").map_err(|_| {
            AppError::Config(
                "GEMINI_API_KEY environment variable is not set (or pass --api-key)".to_string(),
            )
        })?,
    };
    let model_name = opts
        .model_name
        .clone()
        .unwrap_or_else(|| config.model.name.clone());
    Ok(GeminiClient::new(api_key, model_name)?)
}
