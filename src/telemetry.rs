//! Telemetry metric name constants.
//!
//! Centralised metric names for skald operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `skald_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `operation` — "generate" | "generate_streaming" | "generate_batch"
//! - `status` — outcome: "ok" or "error"
//! - `tool` — tool name for tool-call metrics

/// Total generation requests sequenced through a session.
///
/// Labels: `operation`, `status` ("ok" | "error").
pub const GENERATIONS_TOTAL: &str = "skald_generations_total";

/// Total tool calls executed (or rejected before execution).
///
/// Labels: `tool`, `status` ("ok" | "error").
pub const TOOL_CALLS_TOTAL: &str = "skald_tool_calls_total";

/// Total constraint violations reported by the validator on generation
/// results.
///
/// Labels: `operation`.
pub const SCHEMA_VIOLATIONS_TOTAL: &str = "skald_schema_violations_total";

/// Total session resets (explicit or via configuration update).
pub const SESSION_RESETS_TOTAL: &str = "skald_session_resets_total";
