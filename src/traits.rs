//! Boundary traits: the model collaborator and tool capabilities.

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

use crate::types::{Availability, GenerationRequest, ModelResponse, SchemaDescriptor};
use crate::Result;

/// Raw fragment stream produced by a backend for one streaming request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<serde_json::Value>> + Send>>;

/// The opaque model collaborator a session drives.
///
/// The real implementation is a platform-supplied on-device inference
/// engine; skald never inspects its internals. Availability may be read
/// concurrently with any in-flight operation.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Current state of the underlying model.
    fn availability(&self) -> Availability;

    /// Produce one response for the request.
    ///
    /// With a schema attached the value must mirror its shape (the session
    /// validates it regardless); without one, the value is a JSON string
    /// of plain text. May instead return tool calls the session resolves
    /// before asking again.
    async fn respond(&self, request: &GenerationRequest) -> Result<ModelResponse>;

    /// Produce a stream of value-tree fragments for the request.
    ///
    /// Fragments extend one in-progress generation monotonically; the
    /// session merges them into partial snapshots.
    async fn stream_response(&self, request: &GenerationRequest) -> Result<FragmentStream>;
}

/// An application-supplied tool the model may call.
///
/// Arguments are validated against [`argument_schema`](Self::argument_schema)
/// before [`invoke`](Self::invoke) runs; invalid arguments mean the
/// capability is never invoked.
#[async_trait]
pub trait ToolCapability: Send + Sync {
    /// Unique name within a session.
    fn name(&self) -> &str;

    /// What the tool does, offered to the model alongside the schema.
    fn description(&self) -> &str {
        ""
    }

    /// Schema the call arguments must satisfy.
    fn argument_schema(&self) -> &SchemaDescriptor;

    /// Run the tool. Arguments have already passed the argument schema.
    async fn invoke(&self, arguments: &serde_json::Value) -> Result<serde_json::Value>;
}
