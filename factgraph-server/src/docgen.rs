// Copyright 2025 Factgraph Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Documentation and diagram generation for uploaded file content.
//!
//! Unlike the fact pipeline, these endpoints degrade instead of erroring:
//! a model failure produces a fixed failure string the client renders
//! inline, so one bad file never breaks a documentation page.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::llm::TextModel;

const DOCUMENTATION_PROMPT: &str = "Generate 3 sentences of concise documentation for this file, \
covering: 1) how it handles core functionality, 2) the operation it performs, \
and 3) its typical usage in context or purpose.";

const MERMAID_PROMPT: &str = r#"
Given the details below, generate a Mermaid diagram that represents the internal structure and processes. Capture all relevant elements such as functions, classes, conditionals, and loops.

<TASK_INSTRUCTIONS>
Generate the diagram using the correct Mermaid syntax, starting directly with the diagram type (e.g., flowchart TD, classDiagram). The output should include only the Mermaid code.

IMPORTANT: Do not include any prefixes, markdown formatting, or code block syntax. Return only the Mermaid code starting with the diagram type declaration.

Correct Output Example:
flowchart TD
    A[Start] --> B{Condition}
    B -->|Yes| C[Process 1]
    B -->|No| D[Process 2]
    C --> E[End]
    D --> E

Incorrect Output Example:
'''mermaid
flowchart TD
    A[Start] --> B{Condition}
    B -->|Yes| C[Process 1]
    B -->|No| D[Process 2]
    C --> E[End]
    D --> E

Ensure the output matches the correct example format.
</TASK_INSTRUCTIONS>

<FILE_DETAILS>
File Type: {fileType}
File Content:
{fileContent}
</FILE_DETAILS>
"#;

const VALID_MERMAID_KEYWORDS: &[&str] = &[
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
    "gantt",
    "pie",
    "gitGraph",
];

pub const DOCUMENTATION_FAILURE: &str = "Failed to generate documentation";
pub const MERMAID_FAILURE: &str = "Failed to generate Mermaid diagram";
pub const MERMAID_INVALID: &str = "Failed to generate valid Mermaid diagram";

pub struct DocGenerator {
    model: Arc<dyn TextModel>,
}

impl DocGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Three-sentence summary of a file's purpose and behavior.
    pub async fn generate_documentation(&self, file_content: &str) -> String {
        let prompt = format!("{DOCUMENTATION_PROMPT}\n\nFile content:\n{file_content}");

        info!("Generating documentation");
        match self.model.complete(&prompt).await {
            Ok(documentation) => documentation.trim().to_string(),
            Err(e) => {
                error!("Error generating documentation: {e}");
                DOCUMENTATION_FAILURE.to_string()
            }
        }
    }

    /// Mermaid diagram of a file's internal structure.
    pub async fn generate_mermaid_diagram(&self, file_content: &str, file_type: &str) -> String {
        let prompt = MERMAID_PROMPT
            .replace("{fileContent}", file_content)
            .replace("{fileType}", file_type);

        info!("Generating Mermaid diagram");
        match self.model.complete(&prompt).await {
            Ok(raw) => {
                debug!(raw = %raw.chars().take(100).collect::<String>(), "Received raw Mermaid code");
                clean_mermaid_code(&raw)
            }
            Err(e) => {
                error!("Error generating Mermaid diagram: {e}");
                MERMAID_FAILURE.to_string()
            }
        }
    }
}

/// Strip code fences the model sometimes adds anyway, then require the code
/// to open with a known diagram type.
fn clean_mermaid_code(raw: &str) -> String {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```mermaid") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    let cleaned = cleaned.trim();

    let valid = VALID_MERMAID_KEYWORDS
        .iter()
        .any(|keyword| cleaned.starts_with(keyword));
    if !valid {
        warn!("Mermaid code does not start with a valid diagram type");
        return MERMAID_INVALID.to_string();
    }

    cleaned.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FixedModel(anyhow::Result<String>);

    #[async_trait::async_trait]
    impl TextModel for FixedModel {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow!("{e}")),
            }
        }
    }

    #[test]
    fn test_clean_strips_fences() {
        let raw = "```mermaid\nflowchart TD\n    A --> B\n```";
        assert_eq!(clean_mermaid_code(raw), "flowchart TD\n    A --> B");
    }

    #[test]
    fn test_clean_passes_bare_diagram() {
        let raw = "sequenceDiagram\n    Alice->>Bob: Hello";
        assert_eq!(clean_mermaid_code(raw), raw);
    }

    #[test]
    fn test_clean_rejects_prose() {
        let raw = "Here is your diagram:\nflowchart TD\n    A --> B";
        assert_eq!(clean_mermaid_code(raw), MERMAID_INVALID);
    }

    #[tokio::test]
    async fn test_documentation_failure_string_on_model_error() {
        let docgen = DocGenerator::new(Arc::new(FixedModel(Err(anyhow!("down")))));
        assert_eq!(docgen.generate_documentation("fn main() {}").await, DOCUMENTATION_FAILURE);
    }

    #[tokio::test]
    async fn test_mermaid_failure_string_on_model_error() {
        let docgen = DocGenerator::new(Arc::new(FixedModel(Err(anyhow!("down")))));
        assert_eq!(
            docgen.generate_mermaid_diagram("fn main() {}", "rust").await,
            MERMAID_FAILURE
        );
    }

    #[tokio::test]
    async fn test_documentation_trims_response() {
        let docgen = DocGenerator::new(Arc::new(FixedModel(Ok("  A summary.  ".to_string()))));
        assert_eq!(docgen.generate_documentation("x").await, "A summary.");
    }
}
