use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = "codeloom.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "codeloom_out";
pub const DEFAULT_MAX_LINES: u64 = 500;
pub const DEFAULT_MAX_CRITICAL_FILES: usize = 3;
pub const DEFAULT_MODEL_NAME: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_CALL_DELAY_MS: u64 = 1000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Files longer than this many lines are left out of the map.
    #[serde(default = "default_max_lines")]
    pub max_lines: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory (relative to the project root) receiving all artifacts.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_max_critical_files")]
    pub max_critical_files: usize,
    /// Pause between consecutive model calls, in milliseconds.
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            max_lines: DEFAULT_MAX_LINES,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            name: DEFAULT_MODEL_NAME.to_string(),
            max_critical_files: DEFAULT_MAX_CRITICAL_FILES,
            call_delay_ms: DEFAULT_CALL_DELAY_MS,
        }
    }
}

fn default_max_lines() -> u64 {
    DEFAULT_MAX_LINES
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}
fn default_max_critical_files() -> usize {
    DEFAULT_MAX_CRITICAL_FILES
}
fn default_call_delay_ms() -> u64 {
    DEFAULT_CALL_DELAY_MS
}

impl Config {
    /// Load `codeloom.toml` from the project root, falling back to defaults
    /// when the file is absent.
    pub fn load(project_root: &Path) -> Result<Config> {
        let config_path = project_root.join(DEFAULT_CONFIG_FILENAME);
        if !config_path.is_file() {
            log::debug!(
                "No config file at {}, using defaults.",
                config_path.display()
            );
            return Ok(Config::default());
        }
        log::debug!("Loading config file: {}", config_path.display());
        let content = fs::read_to_string(&config_path).map_err(|e| AppError::FileRead {
            path: config_path.clone(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::TomlParse(format!(
                "Failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    /// Resolve the project root from an optional CLI override, defaulting to
    /// the current working directory.
    pub fn determine_project_root(cli_root: Option<&PathBuf>) -> Result<PathBuf> {
        let root = match cli_root {
            Some(path) => {
                if !path.is_dir() {
                    return Err(AppError::InvalidArgument(format!(
                        "Project root is not a directory: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
            None => env::current_dir()?,
        };
        log::debug!("Project root resolved: {}", root.display());
        Ok(root)
    }

    /// Absolute path of the output directory for a given project root.
    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        if self.output.dir.is_absolute() {
            self.output.dir.clone()
        } else {
            project_root.join(&self.output.dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.scan.max_lines, DEFAULT_MAX_LINES);
        assert_eq!(config.output.dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.model.max_critical_files, DEFAULT_MAX_CRITICAL_FILES);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILENAME),
            "[scan]\nmax_lines = 120\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.scan.max_lines, 120);
        assert_eq!(config.model.name, DEFAULT_MODEL_NAME);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILENAME),
            "[scan]\nmax_files = 9\n",
        )
        .unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(AppError::TomlParse(_))
        ));
    }
}
