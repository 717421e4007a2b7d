//! Schema descriptor types for structured generation.
//!
//! A [`SchemaDescriptor`] is an explicit, runtime-inspectable description of
//! the shape a generation must produce: primitives with optional field-level
//! constraints, ordered structs, bounded lists, and closed string
//! enumerations. Descriptors are pure data — the validator
//! ([`crate::validate`]) interprets them, and backends receive them as part
//! of a [`GenerationRequest`](crate::types::GenerationRequest).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkaldError};

/// Primitive value kinds a schema leaf can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Float,
    Bool,
}

impl PrimitiveKind {
    /// Whether this kind accepts a `Range` constraint.
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveKind::Integer | PrimitiveKind::Float)
    }
}

/// Constraint attached to a primitive schema leaf.
///
/// Structural compatibility is enforced at construction: `Range` applies
/// only to numeric kinds, `MemberOf` and `Pattern` only to strings, and
/// `Hint` to anything. Hints are guidance passed through to the backend's
/// generation request; they are never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric bounds.
    Range { min: f64, max: f64 },
    /// Closed set of allowed string values.
    MemberOf { allowed: Vec<String> },
    /// Regex the value must match (full-string by default, see
    /// [`PatternMatchPolicy`](crate::PatternMatchPolicy)).
    Pattern { pattern: String },
    /// Free-text guidance for the generator. Descriptive only.
    Hint { description: String },
}

impl Constraint {
    /// Whether this constraint is structurally valid for the given kind.
    pub fn is_compatible_with(&self, kind: PrimitiveKind) -> bool {
        match self {
            Constraint::Range { .. } => kind.is_numeric(),
            Constraint::MemberOf { .. } | Constraint::Pattern { .. } => {
                kind == PrimitiveKind::String
            }
            Constraint::Hint { .. } => true,
        }
    }
}

/// Inclusive element-count bounds for a list schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBounds {
    pub min: usize,
    pub max: usize,
}

/// Recursive description of a structured-generation shape.
///
/// ```rust
/// use skald::SchemaDescriptor;
///
/// let forecast = SchemaDescriptor::structure([
///     ("city", SchemaDescriptor::string()),
///     (
///         "days",
///         SchemaDescriptor::list_bounded(
///             SchemaDescriptor::structure([
///                 ("day", SchemaDescriptor::enumeration(["mon", "tue", "wed"])),
///                 ("high_c", SchemaDescriptor::float_range(-60.0, 60.0)),
///             ]),
///             1,
///             7,
///         ),
///     ),
/// ]);
/// assert_eq!(forecast.field_names(), vec!["city", "days"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaDescriptor {
    /// A single value of the given kind, optionally constrained.
    Primitive {
        kind: PrimitiveKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        constraint: Option<Constraint>,
    },

    /// Ordered named fields. Order is preserved for prompt construction.
    Struct {
        fields: Vec<(String, SchemaDescriptor)>,
    },

    /// Homogeneous sequence, optionally bounded in length.
    List {
        element: Box<SchemaDescriptor>,
        #[serde(skip_serializing_if = "Option::is_none")]
        count: Option<CountBounds>,
    },

    /// Closed string vocabulary (self-describing case list).
    Enum { allowed: Vec<String> },
}

impl SchemaDescriptor {
    /// Construct a primitive leaf, checking kind/constraint compatibility.
    pub fn primitive(kind: PrimitiveKind, constraint: Option<Constraint>) -> Result<Self> {
        if let Some(ref c) = constraint
            && !c.is_compatible_with(kind)
        {
            return Err(SkaldError::InvalidInput(format!(
                "constraint {c:?} is not compatible with {kind:?}"
            )));
        }
        Ok(SchemaDescriptor::Primitive { kind, constraint })
    }

    /// Unconstrained string leaf.
    pub fn string() -> Self {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::String,
            constraint: None,
        }
    }

    /// Unconstrained integer leaf.
    pub fn integer() -> Self {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::Integer,
            constraint: None,
        }
    }

    /// Unconstrained float leaf.
    pub fn float() -> Self {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::Float,
            constraint: None,
        }
    }

    /// Boolean leaf.
    pub fn boolean() -> Self {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::Bool,
            constraint: None,
        }
    }

    /// Integer leaf with inclusive bounds.
    pub fn integer_range(min: i64, max: i64) -> Self {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::Integer,
            constraint: Some(Constraint::Range {
                min: min as f64,
                max: max as f64,
            }),
        }
    }

    /// Float leaf with inclusive bounds.
    pub fn float_range(min: f64, max: f64) -> Self {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::Float,
            constraint: Some(Constraint::Range { min, max }),
        }
    }

    /// String leaf restricted to a closed set of values.
    pub fn string_member_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::String,
            constraint: Some(Constraint::MemberOf {
                allowed: allowed.into_iter().map(Into::into).collect(),
            }),
        }
    }

    /// String leaf that must match a regex pattern.
    ///
    /// Pattern validity is checked at validation time; an uncompilable
    /// pattern reports as a `Pattern` violation rather than panicking.
    pub fn string_pattern(pattern: impl Into<String>) -> Self {
        SchemaDescriptor::Primitive {
            kind: PrimitiveKind::String,
            constraint: Some(Constraint::Pattern {
                pattern: pattern.into(),
            }),
        }
    }

    /// Closed string enumeration node.
    pub fn enumeration<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaDescriptor::Enum {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Unbounded list of `element`.
    pub fn list(element: SchemaDescriptor) -> Self {
        SchemaDescriptor::List {
            element: Box::new(element),
            count: None,
        }
    }

    /// List with inclusive length bounds.
    pub fn list_bounded(element: SchemaDescriptor, min: usize, max: usize) -> Self {
        SchemaDescriptor::List {
            element: Box::new(element),
            count: Some(CountBounds { min, max }),
        }
    }

    /// List of exactly `n` elements.
    pub fn list_exact(element: SchemaDescriptor, n: usize) -> Self {
        Self::list_bounded(element, n, n)
    }

    /// Struct node with ordered fields.
    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, SchemaDescriptor)>,
        S: Into<String>,
    {
        SchemaDescriptor::Struct {
            fields: fields
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        }
    }

    /// Attach a free-text hint to a primitive leaf.
    ///
    /// Replaces any existing constraint-free hint; returns an error when
    /// called on a non-primitive node or one already carrying a checked
    /// constraint.
    pub fn with_hint(self, description: impl Into<String>) -> Result<Self> {
        match self {
            SchemaDescriptor::Primitive {
                kind,
                constraint: None | Some(Constraint::Hint { .. }),
            } => Ok(SchemaDescriptor::Primitive {
                kind,
                constraint: Some(Constraint::Hint {
                    description: description.into(),
                }),
            }),
            other => Err(SkaldError::InvalidInput(format!(
                "hint can only replace an empty constraint slot on a primitive, got {other:?}"
            ))),
        }
    }

    /// Field names of a struct node, in declaration order. Empty for
    /// non-struct nodes.
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            SchemaDescriptor::Struct { fields } => {
                fields.iter().map(|(name, _)| name.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Constraint of a named struct field, when that field is a
    /// constrained primitive.
    pub fn constraint_of(&self, field: &str) -> Option<&Constraint> {
        match self {
            SchemaDescriptor::Struct { fields } => {
                fields.iter().find(|(name, _)| name == field).and_then(
                    |(_, schema)| match schema {
                        SchemaDescriptor::Primitive { constraint, .. } => constraint.as_ref(),
                        _ => None,
                    },
                )
            }
            _ => None,
        }
    }

    /// Schema of a named struct field.
    pub fn field(&self, field: &str) -> Option<&SchemaDescriptor> {
        match self {
            SchemaDescriptor::Struct { fields } => fields
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, schema)| schema),
            _ => None,
        }
    }

    /// Length bounds of a list node.
    pub fn count_bounds(&self) -> Option<CountBounds> {
        match self {
            SchemaDescriptor::List { count, .. } => *count,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_incompatible_with_string() {
        let result = SchemaDescriptor::primitive(
            PrimitiveKind::String,
            Some(Constraint::Range { min: 0.0, max: 1.0 }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn pattern_incompatible_with_integer() {
        let result = SchemaDescriptor::primitive(
            PrimitiveKind::Integer,
            Some(Constraint::Pattern {
                pattern: "[a-z]+".into(),
            }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn hint_compatible_with_any_kind() {
        for kind in [
            PrimitiveKind::String,
            PrimitiveKind::Integer,
            PrimitiveKind::Float,
            PrimitiveKind::Bool,
        ] {
            assert!(
                SchemaDescriptor::primitive(
                    kind,
                    Some(Constraint::Hint {
                        description: "freeform".into()
                    })
                )
                .is_ok()
            );
        }
    }

    #[test]
    fn field_names_preserve_declaration_order() {
        let schema = SchemaDescriptor::structure([
            ("zulu", SchemaDescriptor::string()),
            ("alpha", SchemaDescriptor::integer()),
            ("mike", SchemaDescriptor::boolean()),
        ]);
        assert_eq!(schema.field_names(), vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn constraint_of_finds_primitive_constraint() {
        let schema = SchemaDescriptor::structure([
            ("score", SchemaDescriptor::integer_range(1, 10)),
            ("nested", SchemaDescriptor::structure::<[(&str, _); 0], &str>([])),
        ]);
        assert!(matches!(
            schema.constraint_of("score"),
            Some(Constraint::Range { .. })
        ));
        assert!(schema.constraint_of("nested").is_none());
        assert!(schema.constraint_of("missing").is_none());
    }
}
