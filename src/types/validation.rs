//! Pattern-matching policy types.

use serde::{Deserialize, Serialize};

/// How regex constraints are matched against candidate strings.
///
/// Full-string matching is the deterministic default: a `Pattern` constraint
/// accepts a value only when the whole string matches. Callers that want
/// substring semantics opt into `Partial` rather than anchoring patterns by
/// hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternMatchPolicy {
    /// The entire value must match the pattern.
    #[default]
    Full,

    /// Any substring of the value may match the pattern.
    Partial,
}
