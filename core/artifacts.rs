use crate::error::{AppError, Result};
use crate::mapper::{DirectoryNode, TreeNode};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAP_FILENAME: &str = "codeloom-map.json";
pub const WEAVE_FILENAME: &str = "codeloom-output.txt";
pub const ORGANIZATION_FILENAME: &str = "organization-suggestions.json";
pub const CRITICAL_FILES_FILENAME: &str = "critical-files-suggestions.json";

/// The on-disk layout of the output directory shared by all pipeline
/// stages. A later stage that needs an earlier stage's artifact fails
/// loudly with `MissingArtifact` instead of guessing.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
}

impl OutputLayout {
    pub fn new(dir: PathBuf) -> Self {
        OutputLayout { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if absent.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| AppError::DirCreation {
            path: self.dir.clone(),
            source: e,
        })
    }

    pub fn map_path(&self) -> PathBuf {
        self.dir.join(MAP_FILENAME)
    }

    pub fn weave_path(&self) -> PathBuf {
        self.dir.join(WEAVE_FILENAME)
    }

    pub fn organization_path(&self) -> PathBuf {
        self.dir.join(ORGANIZATION_FILENAME)
    }

    pub fn critical_files_path(&self) -> PathBuf {
        self.dir.join(CRITICAL_FILES_FILENAME)
    }

    /// Persist the map artifact. The root is written as a tagged tree
    /// node so the JSON matches what [`load_map`] and older artifacts
    /// expect.
    pub fn save_map(&self, tree: &DirectoryNode) -> Result<PathBuf> {
        let path = self.map_path();
        let tagged = TreeNode::Directory(tree.clone());
        write_pretty_json(&path, &tagged)?;
        log::info!("Codebase map saved to {}", path.display());
        Ok(path)
    }

    /// Load the map artifact, failing with `MissingArtifact` when the
    /// map stage has not run yet.
    pub fn load_map(&self) -> Result<DirectoryNode> {
        let path = self.map_path();
        if !path.is_file() {
            return Err(AppError::MissingArtifact(format!(
                "codebase map not found at {} (run the map stage first)",
                path.display()
            )));
        }
        let data = fs::read_to_string(&path).map_err(|e| AppError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        match serde_json::from_str::<TreeNode>(&data)? {
            TreeNode::Directory(root) => Ok(root),
            TreeNode::File(_) => Err(AppError::Config(format!(
                "map artifact root at {} is a file node, expected a directory",
                path.display()
            ))),
        }
    }

    /// Load the woven artifact's raw text for re-splitting.
    pub fn load_weave_text(&self) -> Result<String> {
        let path = self.weave_path();
        if !path.is_file() {
            return Err(AppError::MissingArtifact(format!(
                "woven codebase not found at {} (run the weave stage first)",
                path.display()
            )));
        }
        fs::read_to_string(&path).map_err(|e| AppError::FileRead { path, source: e })
    }

    pub fn load_critical_files_value(&self) -> Result<serde_json::Value> {
        let path = self.critical_files_path();
        if !path.is_file() {
            return Err(AppError::MissingArtifact(format!(
                "critical-files report not found at {} (run the analyze stage first)",
                path.display()
            )));
        }
        let data = fs::read_to_string(&path).map_err(|e| AppError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save_report<T: Serialize>(&self, path: &Path, report: &T) -> Result<()> {
        write_pretty_json(path, report)
    }
}

fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{FileNode, ROOT_NODE_NAME};

    fn sample_tree() -> DirectoryNode {
        DirectoryNode {
            name: ROOT_NODE_NAME.to_string(),
            children: vec![TreeNode::Directory(DirectoryNode {
                name: "src".to_string(),
                children: vec![TreeNode::File(FileNode {
                    name: "main.rs".to_string(),
                    extension: ".rs".to_string(),
                    lines: 7,
                })],
            })],
        }
    }

    #[test]
    fn map_artifact_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().to_path_buf());
        layout.ensure().unwrap();

        let tree = sample_tree();
        layout.save_map(&tree).unwrap();
        let loaded = layout.load_map().unwrap();
        assert_eq!(loaded, tree);

        // The persisted root carries the `type` tag.
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(layout.map_path()).unwrap()).unwrap();
        assert_eq!(raw["type"], "directory");
        assert_eq!(raw["name"], ROOT_NODE_NAME);
    }

    #[test]
    fn loading_a_missing_map_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("codeloom_out"));
        assert!(matches!(
            layout.load_map(),
            Err(AppError::MissingArtifact(_))
        ));
        assert!(matches!(
            layout.load_weave_text(),
            Err(AppError::MissingArtifact(_))
        ));
    }

    #[test]
    fn ensure_creates_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("nested").join("codeloom_out"));
        layout.ensure().unwrap();
        assert!(layout.dir().is_dir());
    }
}
