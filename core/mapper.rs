use crate::error::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the synthetic node holding all scanned targets.
pub const ROOT_NODE_NAME: &str = "root";

pub const IGNORE_FILENAME: &str = ".gitignore";

/// One node of the codebase map. Serialized layout matches the persisted
/// map artifact: a `type` tag of `"file"` or `"directory"` alongside the
/// variant's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    File(FileNode),
    Directory(DirectoryNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    /// Extension including the leading dot, empty when the name has none.
    pub extension: String,
    pub lines: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    pub children: Vec<TreeNode>,
}

/// Extensions never worth weaving into a text artifact. Matched on the
/// file name, case-insensitively, without opening the file.
static EXCLUDED_EXTENSION_SET: Lazy<GlobSet> = Lazy::new(|| {
    const PATTERNS: &[&str] = &[
        // Images
        "*.jpg", "*.jpeg", "*.png", "*.gif", "*.bmp", "*.webp", "*.tif", "*.tiff", "*.ico",
        "*.heic", "*.svg",
        // Fonts
        "*.woff", "*.woff2", "*.ttf", "*.otf", "*.eot",
        // Audio
        "*.mp3", "*.wav", "*.ogg", "*.flac", "*.aac", "*.m4a",
        // Video
        "*.mp4", "*.avi", "*.mkv", "*.mov", "*.wmv", "*.webm", "*.flv",
        // Archives
        "*.zip", "*.tar", "*.gz", "*.tgz", "*.bz2", "*.xz", "*.7z", "*.rar", "*.jar",
        // Office documents
        "*.pdf", "*.doc", "*.docx", "*.xls", "*.xlsx", "*.ppt", "*.pptx", "*.odt", "*.ods",
        "*.odp",
    ];
    let mut builder = GlobSetBuilder::new();
    for pattern in PATTERNS {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("Invalid built-in extension pattern");
        builder.add(glob);
    }
    builder.build().expect("Failed to build extension glob set")
});

struct MapContext<'a> {
    root_dir: &'a Path,
    gitignore: Gitignore,
    max_lines: u64,
    excluded_paths: &'a [PathBuf],
}

/// Walk `scan_targets`, apply the ignore filters and assemble the codebase
/// map under a synthetic root node.
///
/// Individual unreadable entries are logged and skipped; a missing or
/// non-directory scan target is skipped with a diagnostic. The walk itself
/// never fails for per-entry reasons.
pub fn map_codebase(
    root_dir: &Path,
    scan_targets: &[PathBuf],
    max_lines: u64,
    excluded_paths: &[PathBuf],
) -> Result<DirectoryNode> {
    log::info!("Mapping codebase rooted at {}", root_dir.display());
    log::debug!("Max lines per file: {}", max_lines);

    let ctx = MapContext {
        root_dir,
        gitignore: load_ignore_rules(root_dir),
        max_lines,
        excluded_paths,
    };

    let mut root = DirectoryNode {
        name: ROOT_NODE_NAME.to_string(),
        children: Vec::new(),
    };

    for target in scan_targets {
        let full_target = if target.is_absolute() {
            target.clone()
        } else {
            root_dir.join(target)
        };
        match fs::metadata(&full_target) {
            Ok(meta) if meta.is_dir() => {
                let subtree = map_directory(&full_target, &ctx);
                if subtree.children.is_empty() {
                    log::debug!(
                        "Scan target produced no entries after filtering: {}",
                        full_target.display()
                    );
                } else {
                    root.children.push(TreeNode::Directory(subtree));
                }
            }
            Ok(_) => {
                log::warn!("{} is not a directory. Skipping.", full_target.display());
            }
            Err(e) => {
                log::warn!(
                    "Error accessing scan target {}: {}",
                    full_target.display(),
                    e
                );
            }
        }
    }

    log::info!(
        "Mapping complete: {} top-level subtree(s).",
        root.children.len()
    );
    Ok(root)
}

/// Read `.gitignore` at the scan root. Absence is not an error; an
/// unreadable or malformed file degrades to whatever rules did parse.
fn load_ignore_rules(root_dir: &Path) -> Gitignore {
    let ignore_path = root_dir.join(IGNORE_FILENAME);
    if !ignore_path.is_file() {
        log::info!("No {} file found. Proceeding without ignore rules.", IGNORE_FILENAME);
        return Gitignore::empty();
    }
    let mut builder = GitignoreBuilder::new(root_dir);
    if let Some(e) = builder.add(&ignore_path) {
        log::warn!("Error in {}: {}", ignore_path.display(), e);
    }
    match builder.build() {
        Ok(gitignore) => {
            log::debug!(
                "Loaded {} ignore rule(s) from {}",
                gitignore.len(),
                ignore_path.display()
            );
            gitignore
        }
        Err(e) => {
            log::warn!("Failed to build ignore rules: {}", e);
            Gitignore::empty()
        }
    }
}

fn map_directory(dir_path: &Path, ctx: &MapContext) -> DirectoryNode {
    let name = dir_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir_path.to_string_lossy().into_owned());
    let mut node = DirectoryNode {
        name,
        children: Vec::new(),
    };

    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Error reading directory {}: {}", dir_path.display(), e);
            return node;
        }
    };

    // Entry enumeration order is preserved as-is so that re-weaving an
    // unchanged filesystem reproduces the artifact byte for byte.
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error reading entry in {}: {}", dir_path.display(), e);
                continue;
            }
        };
        let full_path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                log::warn!("Error stat-ing {}: {}", full_path.display(), e);
                continue;
            }
        };

        if is_filtered(&full_path, file_type.is_dir(), ctx) {
            continue;
        }

        if file_type.is_dir() {
            let subtree = map_directory(&full_path, ctx);
            if !subtree.children.is_empty() {
                node.children.push(TreeNode::Directory(subtree));
            }
        } else if file_type.is_file() {
            match count_lines(&full_path) {
                Ok(lines) if lines <= ctx.max_lines => {
                    let file_name = entry.file_name().to_string_lossy().into_owned();
                    node.children.push(TreeNode::File(FileNode {
                        extension: extension_of(&file_name),
                        name: file_name,
                        lines,
                    }));
                }
                Ok(lines) => {
                    log::info!(
                        "Skipping {} ({} lines)",
                        relative_display(&full_path, ctx.root_dir),
                        lines
                    );
                }
                Err(e) => {
                    log::warn!("Error processing file {}: {}", full_path.display(), e);
                }
            }
        }
    }

    node
}

/// Ignore filters in short-circuit order: gitignore rules, output-path
/// exclusion, then (files only) the excluded-extension set.
fn is_filtered(full_path: &Path, is_dir: bool, ctx: &MapContext) -> bool {
    if ctx
        .gitignore
        .matched(full_path, is_dir)
        .is_ignore()
    {
        log::trace!("Ignored by rules: {}", full_path.display());
        return true;
    }

    if let Some(relative) = pathdiff::diff_paths(full_path, ctx.root_dir) {
        for excluded in ctx.excluded_paths {
            if relative == *excluded || relative.starts_with(excluded) {
                log::trace!("Excluded path: {}", relative.display());
                return true;
            }
        }
    }

    if !is_dir {
        if let Some(file_name) = full_path.file_name() {
            if EXCLUDED_EXTENSION_SET.is_match(Path::new(file_name)) {
                log::trace!("Excluded extension: {}", full_path.display());
                return true;
            }
        }
    }

    false
}

/// Newline-delimited line count: the number of `\n` bytes plus one, the
/// same figure the map artifact has always recorded.
fn count_lines(path: &Path) -> std::io::Result<u64> {
    let bytes = fs::read(path)?;
    Ok(bytes.iter().filter(|&&b| b == b'\n').count() as u64 + 1)
}

fn extension_of(file_name: &str) -> String {
    match Path::new(file_name).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => String::new(),
    }
}

fn relative_display(path: &Path, root_dir: &Path) -> String {
    pathdiff::diff_paths(path, root_dir)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
