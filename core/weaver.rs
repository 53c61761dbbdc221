use crate::error::{AppError, Result};
use crate::mapper::{DirectoryNode, TreeNode};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sentinel framing token. Must never occur verbatim inside woven source
/// files; re-splitting the artifact depends on it.
pub const DELIMITER: &str = "//==== CODELOOM_DELIMITER ====//";

pub const BINARY_PLACEHOLDER: &str = "[Binary file content not included]";

const FILE_PATH_HEADER: &str = "FILE_PATH: ";

/// How many leading bytes are sniffed for a null byte before a file is
/// treated as binary.
const BINARY_CHECK_BYTES: usize = 8000;

/// One `(path, content)` pair recovered from a woven artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WovenRecord {
    #[serde(rename = "path")]
    pub relative_path: String,
    pub content: String,
}

/// Serialize every file the map references into `sink`, in depth-first
/// map order, each entry framed by [`DELIMITER`].
///
/// Unreadable files get an inline error marker instead of content and
/// the weave continues. Subtrees under `excluded_paths` are skipped even
/// if the map still references them.
pub fn weave<W: Write>(
    tree: &DirectoryNode,
    root_dir: &Path,
    excluded_paths: &[PathBuf],
    sink: &mut W,
) -> Result<()> {
    log::info!("Weaving codebase from {}", root_dir.display());
    for child in &tree.children {
        weave_node(child, Path::new(""), root_dir, excluded_paths, sink)?;
    }
    Ok(())
}

/// Weave straight to a file, creating it (and truncating any previous
/// artifact) at `output_file`.
pub fn weave_to_file(
    tree: &DirectoryNode,
    root_dir: &Path,
    excluded_paths: &[PathBuf],
    output_file: &Path,
) -> Result<()> {
    let file = File::create(output_file).map_err(|e| AppError::FileWrite {
        path: output_file.to_path_buf(),
        source: e,
    })?;
    let mut sink = BufWriter::new(file);
    weave(tree, root_dir, excluded_paths, &mut sink)?;
    sink.flush().map_err(|e| AppError::FileWrite {
        path: output_file.to_path_buf(),
        source: e,
    })?;
    log::info!("Woven codebase saved to {}", output_file.display());
    Ok(())
}

fn weave_node<W: Write>(
    node: &TreeNode,
    current_path: &Path,
    root_dir: &Path,
    excluded_paths: &[PathBuf],
    sink: &mut W,
) -> Result<()> {
    match node {
        TreeNode::File(file) => {
            let relative_path = current_path.join(&file.name);
            if is_excluded(&relative_path, excluded_paths) {
                log::debug!("Skipping excluded path: {}", relative_path.display());
                return Ok(());
            }
            write_file_entry(&relative_path, root_dir, sink)?;
        }
        TreeNode::Directory(dir) => {
            let dir_path = current_path.join(&dir.name);
            if is_excluded(&dir_path, excluded_paths) {
                log::debug!("Skipping excluded subtree: {}", dir_path.display());
                return Ok(());
            }
            for child in &dir.children {
                weave_node(child, &dir_path, root_dir, excluded_paths, sink)?;
            }
        }
    }
    Ok(())
}

fn is_excluded(relative_path: &Path, excluded_paths: &[PathBuf]) -> bool {
    excluded_paths
        .iter()
        .any(|ex| relative_path == ex || relative_path.starts_with(ex))
}

fn write_file_entry<W: Write>(
    relative_path: &Path,
    root_dir: &Path,
    sink: &mut W,
) -> Result<()> {
    let full_path = root_dir.join(relative_path);
    let header_path = relative_path.to_string_lossy();

    write!(sink, "\n\n{}\n", DELIMITER)?;
    write!(sink, "{}{}\n", FILE_PATH_HEADER, header_path)?;
    write!(sink, "{}\n", DELIMITER)?;

    match fs::read(&full_path) {
        Ok(bytes) => {
            if is_binary_content(&bytes) {
                log::debug!("Binary content detected: {}", header_path);
                writeln!(sink, "{}", BINARY_PLACEHOLDER)?;
            } else {
                sink.write_all(String::from_utf8_lossy(&bytes).as_bytes())?;
            }
        }
        Err(e) => {
            log::warn!("Error reading file {}: {}", full_path.display(), e);
            writeln!(sink, "Error reading file: {}", e)?;
        }
    }
    Ok(())
}

/// A file is considered binary when any of its first
/// [`BINARY_CHECK_BYTES`] bytes is a null byte. Heuristic: rare binary
/// formats without an early null byte slip through.
fn is_binary_content(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .take(BINARY_CHECK_BYTES)
        .any(|&b| b == 0)
}

/// Split a woven artifact back into `(path, content)` pairs.
///
/// Segments between delimiters alternate between a `FILE_PATH:` header
/// and that file's content; anything that is neither is skipped, so a
/// truncated tail degrades to fewer records rather than an error.
pub fn split_artifact(text: &str) -> Vec<WovenRecord> {
    let mut records = Vec::new();
    let mut pending_path: Option<String> = None;

    for segment in text.split(DELIMITER) {
        let trimmed = segment.trim();
        if let Some(path_line) = trimmed.strip_prefix(FILE_PATH_HEADER) {
            if let Some(orphan) = pending_path.take() {
                log::warn!("Artifact entry without content: {}", orphan);
                records.push(WovenRecord {
                    relative_path: orphan,
                    content: String::new(),
                });
            }
            pending_path = Some(path_line.trim().to_string());
        } else if let Some(path) = pending_path.take() {
            records.push(WovenRecord {
                relative_path: path,
                content: trimmed.to_string(),
            });
        } else if !trimmed.is_empty() {
            log::trace!("Skipping stray artifact segment ({} bytes)", trimmed.len());
        }
    }

    if let Some(orphan) = pending_path {
        records.push(WovenRecord {
            relative_path: orphan,
            content: String::new(),
        });
    }
    records
}
