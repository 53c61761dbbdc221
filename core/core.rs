pub mod analysis;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod extractor;
pub mod mapper;
pub mod optimizer;
pub mod weaver;

pub use analysis::{
    CriticalFile, CriticalFilesReport, ModelClient, OrganizationReport, Suggestion,
    review_organization, select_critical_files,
};
pub use artifacts::OutputLayout;
pub use config::Config;
pub use error::{AppError, Result};
pub use extractor::{ExtractionResult, extract};
pub use mapper::{DirectoryNode, FileNode, TreeNode, map_codebase};
pub use optimizer::{FileOutcome, OptimizeSummary, optimize_files};
pub use weaver::{WovenRecord, split_artifact, weave, weave_to_file};
