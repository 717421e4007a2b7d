//! Generation request built by the session for the model backend.

use serde::{Deserialize, Serialize};

use super::schema::SchemaDescriptor;
use super::tool::ToolSpec;

/// Everything a backend needs to produce one response.
///
/// Built by the session from the prompt, the immutable configuration, the
/// tool snapshot taken at initialize/reset, and any tool outcomes gathered
/// in earlier rounds of the same generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,

    /// Target shape for structured generation; `None` requests plain text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDescriptor>,

    pub temperature: f32,
    pub max_tokens: usize,

    /// Tools the model may call, as snapshotted at session initialize.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,

    /// Combined results of completed tool rounds, fed back into context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolRoundResult>,
}

/// One resolved tool call carried back into the generation context.
///
/// Only successful calls are carried forward; failures propagate to the
/// caller instead of being fed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRoundResult {
    pub call_id: String,
    pub name: String,
    pub result: serde_json::Value,
}

/// Reply from the model backend for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// A finished value: structured JSON when a schema was supplied,
    /// otherwise a JSON string of plain text.
    Complete(serde_json::Value),

    /// The model wants tool results before it can finish.
    ToolCalls(Vec<super::tool::ToolCall>),
}

/// Reported state of the model collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Loading,
    Unavailable,
}
