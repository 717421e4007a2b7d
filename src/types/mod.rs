//! Public types for the Skald API.

mod options;
mod request;
mod schema;
mod tool;
mod transcript;
mod validation;
mod value;

pub use options::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, MIN_MAX_TOKENS, SessionConfig};
pub use request::{Availability, GenerationRequest, ModelResponse, ToolRoundResult};
pub use schema::{Constraint, CountBounds, PrimitiveKind, SchemaDescriptor};
pub use tool::{ToolCall, ToolCallState, ToolOutcome, ToolSpec};
pub use transcript::{Transcript, TranscriptEntry};
pub use validation::PatternMatchPolicy;
pub use value::{GeneratedValue, PartialValue};
