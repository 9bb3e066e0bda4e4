//! Prompt payloads asking a model for patch operations.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Minimum length of a task description, in characters.
pub const MIN_TASK_LEN: usize = 5;

const INSTRUCTIONS: &str = "You are an expert software engineer. You will receive a \
Markdown export containing the full folder structure and source code of a project. \
Based on the user's task, reply with a JSON array of file operations. Each operation \
is an object with: action (create|update|delete), path (relative path) and content \
(the complete new file content, for create and update). Paths are relative to the \
project root shown in the exported folder structure (e.g. 'src/main/java/...'); never \
use absolute paths and never prefix paths with the project folder name. Return JSON \
only, without Markdown fences.";

/// Request for a prompt payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// What the user wants changed.
    pub task: String,

    /// Optional project summary to include.
    #[serde(default)]
    pub project_summary: Option<String>,
}

impl PromptRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.task.chars().count() < MIN_TASK_LEN {
            return Err(CoreError::validation(format!(
                "Task must be at least {MIN_TASK_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Shape of one expected operation, described for the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSchema {
    pub action: String,
    pub path: String,
    pub content: String,
}

impl Default for OperationSchema {
    fn default() -> Self {
        Self {
            action: "create|update|delete".to_string(),
            path: "relative/file/path.ext".to_string(),
            content: "file content for create/update".to_string(),
        }
    }
}

/// Payload handed to a model alongside the export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub task: String,
    pub project_summary: Option<String>,
    pub output_format: String,
    pub instructions: String,
    pub schema: OperationSchema,
}

impl PromptPayload {
    /// Build the payload for a validated request.
    pub fn build(request: PromptRequest) -> CoreResult<Self> {
        request.validate()?;
        Ok(Self {
            task: request.task,
            project_summary: request.project_summary,
            output_format: "JSON".to_string(),
            instructions: INSTRUCTIONS.to_string(),
            schema: OperationSchema::default(),
        })
    }
}
