//! Conversation transcript types.

use serde::{Deserialize, Serialize};

/// One entry in a session's transcript.
///
/// Tool-call errors are stringified so the transcript stays serializable
/// and self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Prompt { text: String },
    Response { text: String },
    ToolCall {
        name: String,
        arguments: serde_json::Value,
        result: std::result::Result<serde_json::Value, String>,
    },
}

/// Append-only ordered log of prompts, responses, and tool calls.
///
/// Owned exclusively by the session for its lifetime; consumers read it
/// through cloned snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub(crate) fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
