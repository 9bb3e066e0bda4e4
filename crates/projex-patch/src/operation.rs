//! Mutation operations and their outcomes.

use crate::{PatchError, PatchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an operation does to its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether the action writes content.
    pub fn writes(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl FromStr for Action {
    type Err = PatchError;

    /// Parse an action name, ignoring ASCII case.
    fn from_str(s: &str) -> PatchResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(PatchError::invalid_operation(format!("Unknown action: {s}"))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested file mutation.
///
/// `action` stays a plain string on the wire so that an unknown action is
/// reported when the batch reaches it, after the operations before it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOperation {
    /// `create`, `update` or `delete`, in any case.
    pub action: String,

    /// Path relative to the project root.
    pub path: String,

    /// Full new content; required for create and update, ignored for delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl MutationOperation {
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            action: Action::Create.to_string(),
            path: path.into(),
            content: Some(content.into()),
        }
    }

    pub fn update(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            action: Action::Update.to_string(),
            path: path.into(),
            content: Some(content.into()),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            action: Action::Delete.to_string(),
            path: path.into(),
            content: None,
        }
    }

    /// Parse the action.
    pub fn action(&self) -> PatchResult<Action> {
        self.action.parse()
    }
}

/// Human-readable result of one applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationOutcome(String);

impl MutationOutcome {
    /// `"<action>: <path>"` for a write.
    pub fn written(action: Action, path: &str) -> Self {
        Self(format!("{action}: {path}"))
    }

    pub fn deleted(path: &str) -> Self {
        Self(format!("deleted: {path}"))
    }

    pub fn skipped_missing(path: &str) -> Self {
        Self(format!("skipped (missing): {path}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for MutationOutcome {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
