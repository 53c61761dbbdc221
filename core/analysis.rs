use crate::error::Result;
use crate::extractor::{ExtractionResult, extract};
use crate::mapper::DirectoryNode;
use crate::weaver::WovenRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The external generative-model boundary. Implementations own transport,
/// retries and timeouts; the core only hands over a prompt and receives
/// raw text back.
pub trait ModelClient {
    fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationReport {
    pub overall_assessment: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalFile {
    pub path: String,
    pub reason: String,
    pub suggested_improvements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalFilesReport {
    #[serde(default)]
    pub critical_files: Vec<CriticalFile>,
}

impl CriticalFilesReport {
    /// Build the typed report from an extracted (and already normalized)
    /// JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Ask the model for organizational suggestions about the codebase map.
/// A malformed reply is returned as `Failed`, not an error.
pub fn review_organization(
    client: &dyn ModelClient,
    tree: &DirectoryNode,
) -> Result<ExtractionResult> {
    let tree_json = serde_json::to_string_pretty(tree)?;
    let prompt = organization_prompt(&tree_json);
    log::info!("Requesting organization review ({} map bytes)", tree_json.len());
    let response = client.complete(&prompt)?;
    Ok(extract(&response))
}

/// Ask the model to pick at most `max_files` files most in need of
/// improvement out of the woven records.
pub fn select_critical_files(
    client: &dyn ModelClient,
    records: &[WovenRecord],
    max_files: usize,
) -> Result<ExtractionResult> {
    let files_json = serde_json::to_string_pretty(records)?;
    let prompt = critical_files_prompt(&files_json, max_files);
    log::info!(
        "Requesting critical-file selection ({} candidate file(s), max {})",
        records.len(),
        max_files
    );
    let response = client.complete(&prompt)?;
    Ok(extract(&response))
}

fn organization_prompt(tree_json: &str) -> String {
    format!(
        r#"Analyze the following codebase structure and suggest organizational improvements:

{tree_json}

Please provide suggestions for:
1. Improved file/folder organization
2. Potential modularization
3. Adherence to best practices for the specific language/framework (if identifiable)
4. Any other structural improvements

Format your response as a JSON object with the following structure:
{{
  "overallAssessment": "A brief overall assessment of the codebase structure",
  "suggestions": [
    {{
      "type": "The type of suggestion (e.g., 'organization', 'modularization', 'best practice')",
      "description": "Detailed description of the suggestion",
      "impact": "Potential impact of implementing this suggestion"
    }}
  ]
}}"#
    )
}

fn critical_files_prompt(files_json: &str, max_files: usize) -> String {
    format!(
        r#"Analyze the following files and select the most critical ones that need improvement:

{files_json}

Please select up to {max_files} files that are most critical for improvement.
Consider factors such as code complexity, potential bugs, performance issues, and adherence to best practices.

Format your response as a JSON object with the following structure:
{{
  "criticalFiles": [
    {{
      "path": "Path to the critical file",
      "reason": "Reason why this file is critical for improvement",
      "suggestedImprovements": "Brief description of suggested improvements"
    }}
  ]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ROOT_NODE_NAME;
    use serde_json::json;
    use std::cell::RefCell;

    struct CannedClient {
        reply: String,
        prompts: RefCell<Vec<String>>,
    }

    impl CannedClient {
        fn new(reply: &str) -> Self {
            CannedClient {
                reply: reply.to_string(),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelClient for CannedClient {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn empty_tree() -> DirectoryNode {
        DirectoryNode {
            name: ROOT_NODE_NAME.to_string(),
            children: Vec::new(),
        }
    }

    #[test]
    fn critical_files_prompt_carries_the_limit_and_content() {
        let client = CannedClient::new("{\"criticalFiles\": []}");
        let records = vec![WovenRecord {
            relative_path: "src/lib.rs".to_string(),
            content: "pub fn f() {}".to_string(),
        }];
        let result = select_critical_files(&client, &records, 5).unwrap();
        assert!(result.is_parsed());

        let prompts = client.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("select up to 5 files"));
        assert!(prompts[0].contains("src/lib.rs"));
    }

    #[test]
    fn fenced_reply_round_trips_into_a_typed_report() {
        let client = CannedClient::new(
            "Sure!\n```json\n{\"criticalFiles\": [{\"path\": \"a.rs\", \"reason\": \"r\", \"suggestedImprovements\": \"s\"}]}\n```",
        );
        let result = select_critical_files(&client, &[], 3).unwrap();
        let value = match result {
            ExtractionResult::Parsed(v) => v,
            other => panic!("expected Parsed, got {:?}", other),
        };
        let report = CriticalFilesReport::from_value(value).unwrap();
        assert_eq!(report.critical_files.len(), 1);
        assert_eq!(report.critical_files[0].path, "a.rs");
    }

    #[test]
    fn single_object_reply_normalizes_into_a_report() {
        let client = CannedClient::new(
            "{\"criticalFiles\": {\"path\": \"x\", \"reason\": \"y\", \"suggestedImprovements\": \"z\"}}",
        );
        let result = select_critical_files(&client, &[], 3).unwrap();
        let value = match result {
            ExtractionResult::Parsed(v) => v,
            other => panic!("expected Parsed, got {:?}", other),
        };
        let report = CriticalFilesReport::from_value(value).unwrap();
        assert_eq!(report.critical_files.len(), 1);
        assert_eq!(report.critical_files[0].suggested_improvements, "z");
    }

    #[test]
    fn garbled_reply_surfaces_as_failed_outcome() {
        let client = CannedClient::new("model had a bad day");
        let result = review_organization(&client, &empty_tree()).unwrap();
        assert_eq!(
            result,
            ExtractionResult::Failed("model had a bad day".to_string())
        );
    }

    #[test]
    fn organization_report_deserializes_from_wire_shape() {
        let value = json!({
            "overallAssessment": "solid",
            "suggestions": [
                {"type": "organization", "description": "d", "impact": "i"}
            ]
        });
        let report: OrganizationReport = serde_json::from_value(value).unwrap();
        assert_eq!(report.overall_assessment, "solid");
        assert_eq!(report.suggestions[0].kind, "organization");
    }
}
