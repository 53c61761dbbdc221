use crate::analysis::{CriticalFile, CriticalFilesReport, ModelClient};
use crate::error::Result;
use std::fs;
use std::path::Path;

/// What happened to one critical file during an optimization pass.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Rewritten,
    Unchanged,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct OptimizeSummary {
    pub outcomes: Vec<(String, FileOutcome)>,
}

impl OptimizeSummary {
    pub fn rewritten(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == FileOutcome::Rewritten)
            .count()
    }
}

/// Rewrite each critical file with the model's optimized version.
///
/// Content is replaced verbatim, whole-file; there is no diffing or
/// merging. A failure on one file is recorded and the pass moves on.
pub fn optimize_files(
    client: &dyn ModelClient,
    root_dir: &Path,
    report: &CriticalFilesReport,
) -> Result<OptimizeSummary> {
    let mut summary = OptimizeSummary::default();
    for file in &report.critical_files {
        log::info!("Optimizing file: {}", file.path);
        let outcome = match optimize_one(client, root_dir, file) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Error processing file {}: {}", file.path, e);
                FileOutcome::Failed(e.to_string())
            }
        };
        summary.outcomes.push((file.path.clone(), outcome));
    }
    Ok(summary)
}

fn optimize_one(
    client: &dyn ModelClient,
    root_dir: &Path,
    file: &CriticalFile,
) -> Result<FileOutcome> {
    let full_path = root_dir.join(&file.path);
    let content = fs::read_to_string(&full_path)?;

    let prompt = optimize_prompt(file, &content);
    let response = client.complete(&prompt)?;
    let optimized = extract_code_block(&response);

    if optimized == content.trim() {
        log::info!("No changes were necessary for {}", file.path);
        return Ok(FileOutcome::Unchanged);
    }
    fs::write(&full_path, optimized)?;
    log::info!("File updated: {}", full_path.display());
    Ok(FileOutcome::Rewritten)
}

fn optimize_prompt(file: &CriticalFile, content: &str) -> String {
    format!(
        r#"You are an expert code optimizer. Please review and optimize the following file, focusing only on critical changes:

File path: {path}
Reason for optimization: {reason}
Suggested improvements: {improvements}

Current file content:
```
{content}
```

Instructions:
1. Focus only on critical changes that significantly improve the code.
2. If the file is already well-optimized, it's okay to make no changes.
3. Do not add any new dependencies, libraries or imports that are not already present in the project.
4. Maintain the existing code structure and style unless a change is critically necessary.
5. Provide only the optimized code without any explanations or markdown formatting.

If no changes are necessary, return the original code as-is."#,
        path = file.path,
        reason = file.reason,
        improvements = file.suggested_improvements,
        content = content,
    )
}

/// Pull the code out of a model reply: the body of the first fenced code
/// block if there is one, otherwise the whole reply trimmed.
pub fn extract_code_block(response: &str) -> String {
    let trimmed = response.trim();
    if let Some(open) = trimmed.find("```") {
        let after_fence = &trimmed[open + 3..];
        // Skip the language tag up to the end of the opening line.
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(close) = body.find("```") {
            return body[..close].trim().to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::fs;

    struct EchoClient {
        reply: String,
    }

    impl ModelClient for EchoClient {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct FailingClient;

    impl ModelClient for FailingClient {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Err(AppError::Model("quota exhausted".to_string()))
        }
    }

    fn report_for(path: &str) -> CriticalFilesReport {
        CriticalFilesReport {
            critical_files: vec![CriticalFile {
                path: path.to_string(),
                reason: "complexity".to_string(),
                suggested_improvements: "simplify".to_string(),
            }],
        }
    }

    #[test]
    fn fenced_reply_is_unwrapped_before_writing() {
        assert_eq!(
            extract_code_block("```rust\nfn f() {}\n```"),
            "fn f() {}"
        );
        assert_eq!(extract_code_block("```\nplain\n```"), "plain");
        assert_eq!(extract_code_block("  bare reply  "), "bare reply");
    }

    #[test]
    fn changed_content_is_written_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn old() {}\n").unwrap();
        let client = EchoClient {
            reply: "```rust\nfn new() {}\n```".to_string(),
        };

        let summary = optimize_files(&client, dir.path(), &report_for("a.rs")).unwrap();
        assert_eq!(summary.rewritten(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.rs")).unwrap(),
            "fn new() {}"
        );
    }

    #[test]
    fn identical_content_leaves_the_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn same() {}\n").unwrap();
        let client = EchoClient {
            reply: "fn same() {}".to_string(),
        };

        let summary = optimize_files(&client, dir.path(), &report_for("a.rs")).unwrap();
        assert_eq!(summary.outcomes[0].1, FileOutcome::Unchanged);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.rs")).unwrap(),
            "fn same() {}\n"
        );
    }

    #[test]
    fn one_failing_file_does_not_abort_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.rs"), "fn ok() {}\n").unwrap();
        let client = EchoClient {
            reply: "fn better() {}".to_string(),
        };

        let report = CriticalFilesReport {
            critical_files: vec![
                CriticalFile {
                    path: "missing.rs".to_string(),
                    reason: "r".to_string(),
                    suggested_improvements: "s".to_string(),
                },
                CriticalFile {
                    path: "ok.rs".to_string(),
                    reason: "r".to_string(),
                    suggested_improvements: "s".to_string(),
                },
            ],
        };
        let summary = optimize_files(&client, dir.path(), &report).unwrap();
        assert!(matches!(summary.outcomes[0].1, FileOutcome::Failed(_)));
        assert_eq!(summary.outcomes[1].1, FileOutcome::Rewritten);
    }

    #[test]
    fn model_transport_failure_is_recorded_per_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn f() {}\n").unwrap();

        let summary = optimize_files(&FailingClient, dir.path(), &report_for("a.rs")).unwrap();
        assert!(matches!(summary.outcomes[0].1, FileOutcome::Failed(_)));
    }
}
