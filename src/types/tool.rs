//! Tool-call types for capability invocation.

use serde::{Deserialize, Serialize};

use super::schema::SchemaDescriptor;
use crate::error::SkaldError;

/// A tool call issued by the model during a generation round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier attributing the eventual outcome back to this call.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Lifecycle of a single tool call.
///
/// `Requested → ArgumentsValidated → Executing → Completed | Failed`.
/// Argument validation failure jumps straight to `Failed` without the
/// capability ever running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallState {
    Requested,
    ArgumentsValidated,
    Executing,
    Completed,
    Failed,
}

/// Outcome of one tool call, attributed by call id.
#[derive(Debug)]
pub struct ToolOutcome {
    pub call_id: String,
    pub name: String,
    pub result: std::result::Result<serde_json::Value, SkaldError>,
}

impl ToolOutcome {
    /// Terminal state this outcome represents.
    pub fn state(&self) -> ToolCallState {
        if self.result.is_ok() {
            ToolCallState::Completed
        } else {
            ToolCallState::Failed
        }
    }
}

/// Passive description of a registered tool, snapshotted into generation
/// requests so the backend can offer it to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub argument_schema: SchemaDescriptor,
}
