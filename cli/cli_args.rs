use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectOpts {
    #[arg(
        long,
        help = "Target project directory (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        help = "Output directory for codeloom artifacts (default: codeloom_out).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ModelOpts {
    #[arg(
        short = 'n',
        long,
        help = "Model name to use for analysis.",
        help_heading = "Model",
        value_name = "NAME"
    )]
    pub model_name: Option<String>,

    #[arg(
        long,
        help = "API key for the model service (default: GEMINI_API_KEY env var).",
        help_heading = "Model",
        value_name = "KEY"
    )]
    pub api_key: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Map, weave and AI-analyze a codebase.",
    long_about = "codeloom indexes a source tree into a JSON map, weaves the mapped files \ninto one delimited text artifact, asks a generative model for structural and \nper-file improvement suggestions, and can rewrite the selected files in place.",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(visible_alias = "m", about = "Map directories into the codebase map artifact.")]
    Map(MapArgs),

    #[command(
        visible_alias = "w",
        about = "Weave the mapped files into one delimited text artifact."
    )]
    Weave(WeaveArgs),

    #[command(
        visible_alias = "a",
        about = "Ask the model for organization and critical-file suggestions."
    )]
    Analyze(AnalyzeArgs),

    #[command(about = "Rewrite the critical files with model-optimized content.")]
    Optimize(OptimizeArgs),

    #[command(visible_alias = "r", about = "Run the full map-weave-analyze-optimize pipeline.")]
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    #[arg(required = true, help = "Directories to scan, relative to the project root.")]
    pub directories: Vec<PathBuf>,

    #[arg(
        short = 'l',
        long,
        help = "Maximum number of lines per file to include.",
        value_name = "N"
    )]
    pub max_lines: Option<u64>,

    #[command(flatten)]
    pub project: ProjectOpts,
}

#[derive(Args, Debug, Clone)]
pub struct WeaveArgs {
    #[command(flatten)]
    pub project: ProjectOpts,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        short = 'm',
        long,
        help = "Maximum number of critical files the model may select.",
        value_name = "N"
    )]
    pub max_critical_files: Option<usize>,

    #[command(flatten)]
    pub project: ProjectOpts,

    #[command(flatten)]
    pub model: ModelOpts,
}

#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub project: ProjectOpts,

    #[command(flatten)]
    pub model: ModelOpts,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(required = true, help = "Directories to scan, relative to the project root.")]
    pub directories: Vec<PathBuf>,

    #[arg(
        short = 'l',
        long,
        help = "Maximum number of lines per file to include.",
        value_name = "N"
    )]
    pub max_lines: Option<u64>,

    #[arg(
        short = 'm',
        long,
        help = "Maximum number of critical files the model may select.",
        value_name = "N"
    )]
    pub max_critical_files: Option<usize>,

    #[command(flatten)]
    pub project: ProjectOpts,

    #[command(flatten)]
    pub model: ModelOpts,
}
