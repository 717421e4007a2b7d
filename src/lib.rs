//! Skald - schema-guided structured generation sessions
//!
//! This crate provides a `Session` orchestrator over an opaque, on-device
//! language-model backend (the [`ModelBackend`] trait), with declarative
//! [`SchemaDescriptor`]s for structured output, total constraint
//! validation, streaming partial-value snapshots, and schema-validated
//! tool calling.
//!
//! # Structured generation
//!
//! ```rust,no_run
//! use skald::{Skald, SchemaDescriptor};
//! # use std::sync::Arc;
//! # fn backend() -> Arc<dyn skald::ModelBackend> { unimplemented!() }
//!
//! #[tokio::main]
//! async fn main() -> skald::Result<()> {
//!     let session = Skald::builder()
//!         .backend(backend())
//!         .temperature(0.4)
//!         .max_tokens(512)
//!         .build()?;
//!     session.initialize().await?;
//!
//!     let schema = SchemaDescriptor::structure([
//!         ("sentiment", SchemaDescriptor::enumeration(["positive", "neutral", "negative"])),
//!         ("confidence", SchemaDescriptor::float_range(0.0, 1.0)),
//!     ]);
//!     let review = session
//!         .generate("Classify: 'the coffee was cold again'", Some(&schema))
//!         .await?;
//!     println!("{}", review.as_value());
//!     Ok(())
//! }
//! ```
//!
//! # Streaming partial snapshots
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut stream = session.generate_streaming("7-day forecast", &schema).await?;
//! while let Some(snapshot) = stream.next().await {
//!     let partial = snapshot?;
//!     // absent fields simply read as None
//!     if let Some(city) = partial.pointer("/city") {
//!         println!("city so far: {city}");
//!     }
//! }
//! ```

pub mod error;
pub mod merge;
pub mod session;
pub mod telemetry;
pub mod tools;
pub mod traits;
pub mod types;
pub mod validate;
pub mod version;

// Re-export main types at crate root
pub use error::{Result, SkaldError};
pub use merge::{DEFAULT_FRAGMENT_BUFFER, SnapshotStream, merge_fragment};
pub use session::{PartialStream, Session, Skald, SkaldBuilder};
pub use tools::ToolRegistry;
pub use traits::{FragmentStream, ModelBackend, ToolCapability};
pub use validate::{ConstraintKind, ValidationReport, Violation, validate, validate_with};

// Re-export all types
pub use types::{
    Availability, Constraint, CountBounds, GeneratedValue, GenerationRequest, ModelResponse,
    PartialValue, PatternMatchPolicy, PrimitiveKind, SchemaDescriptor, SessionConfig, ToolCall,
    ToolCallState, ToolOutcome, ToolRoundResult, ToolSpec, Transcript, TranscriptEntry,
};
