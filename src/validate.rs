//! Constraint validation of value trees against schema descriptors.
//!
//! Validation is total: the walker visits every leaf regardless of earlier
//! failures and returns the complete set of violations, so callers can
//! assert on multiplicity rather than just the first problem. A value that
//! fails validation is never surfaced as a
//! [`GeneratedValue`](crate::GeneratedValue) — the session raises
//! [`SkaldError::SchemaViolation`](crate::SkaldError::SchemaViolation)
//! carrying the report instead.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Constraint, PatternMatchPolicy, PrimitiveKind, SchemaDescriptor};

/// Which rule a violation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Range,
    Count,
    MemberOf,
    Pattern,
    /// Value kind does not match the schema leaf kind.
    Type,
    /// Schema declares a field the value does not carry.
    MissingField,
    /// Value carries a field the schema does not declare.
    UnknownField,
}

/// A single constraint violation: where, what rule, and what was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Path from the root, e.g. `$.days[2].high_c`.
    pub path: String,
    pub kind: ConstraintKind,
    pub observed: serde_json::Value,
    /// Human-readable bound or expectation, e.g. `expected 1..=7 elements`.
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: {} (observed {})",
            match self.kind {
                ConstraintKind::Range => "range violation",
                ConstraintKind::Count => "count violation",
                ConstraintKind::MemberOf => "disallowed value",
                ConstraintKind::Pattern => "pattern mismatch",
                ConstraintKind::Type => "type mismatch",
                ConstraintKind::MissingField => "missing field",
                ConstraintKind::UnknownField => "unknown field",
            },
            self.path,
            self.detail,
            self.observed
        )
    }
}

/// Complete result of validating one value against one schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// No violations found.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    fn push(
        &mut self,
        path: &str,
        kind: ConstraintKind,
        observed: &serde_json::Value,
        detail: impl Into<String>,
    ) {
        self.violations.push(Violation {
            path: path.to_owned(),
            kind,
            observed: observed.clone(),
            detail: detail.into(),
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return f.write_str("no violations");
        }
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Validate with the default full-string pattern policy.
pub fn validate(schema: &SchemaDescriptor, value: &serde_json::Value) -> ValidationReport {
    validate_with(schema, value, PatternMatchPolicy::Full)
}

/// Validate `value` against `schema`, collecting every violation.
pub fn validate_with(
    schema: &SchemaDescriptor,
    value: &serde_json::Value,
    policy: PatternMatchPolicy,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    walk(schema, value, "$", policy, &mut report);
    report
}

fn walk(
    schema: &SchemaDescriptor,
    value: &serde_json::Value,
    path: &str,
    policy: PatternMatchPolicy,
    report: &mut ValidationReport,
) {
    match schema {
        SchemaDescriptor::Primitive { kind, constraint } => {
            check_primitive(*kind, constraint.as_ref(), value, path, policy, report);
        }

        SchemaDescriptor::Enum { allowed } => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => {}
            Some(_) => report.push(
                path,
                ConstraintKind::MemberOf,
                value,
                format!("expected one of {allowed:?}"),
            ),
            None => report.push(path, ConstraintKind::Type, value, "expected string"),
        },

        SchemaDescriptor::Struct { fields } => {
            let Some(map) = value.as_object() else {
                report.push(path, ConstraintKind::Type, value, "expected object");
                return;
            };
            for (name, field_schema) in fields {
                match map.get(name) {
                    Some(field_value) => {
                        let child = format!("{path}.{name}");
                        walk(field_schema, field_value, &child, policy, report);
                    }
                    None => report.push(
                        &format!("{path}.{name}"),
                        ConstraintKind::MissingField,
                        &serde_json::Value::Null,
                        "field required by schema",
                    ),
                }
            }
            for key in map.keys() {
                if !fields.iter().any(|(name, _)| name == key) {
                    report.push(
                        &format!("{path}.{key}"),
                        ConstraintKind::UnknownField,
                        &map[key],
                        "field not declared by schema",
                    );
                }
            }
        }

        SchemaDescriptor::List { element, count } => {
            let Some(items) = value.as_array() else {
                report.push(path, ConstraintKind::Type, value, "expected array");
                return;
            };
            if let Some(bounds) = count
                && (items.len() < bounds.min || items.len() > bounds.max)
            {
                report.push(
                    path,
                    ConstraintKind::Count,
                    &serde_json::Value::from(items.len()),
                    format!("expected {}..={} elements", bounds.min, bounds.max),
                );
            }
            for (i, item) in items.iter().enumerate() {
                let child = format!("{path}[{i}]");
                walk(element, item, &child, policy, report);
            }
        }
    }
}

fn check_primitive(
    kind: PrimitiveKind,
    constraint: Option<&Constraint>,
    value: &serde_json::Value,
    path: &str,
    policy: PatternMatchPolicy,
    report: &mut ValidationReport,
) {
    let kind_matches = match kind {
        PrimitiveKind::String => value.is_string(),
        PrimitiveKind::Integer => value.is_i64() || value.is_u64(),
        PrimitiveKind::Float => value.is_number(),
        PrimitiveKind::Bool => value.is_boolean(),
    };
    if !kind_matches {
        report.push(
            path,
            ConstraintKind::Type,
            value,
            format!("expected {kind:?}").to_lowercase(),
        );
        return;
    }

    let Some(constraint) = constraint else {
        return;
    };

    match constraint {
        Constraint::Range { min, max } => {
            // kind check above guarantees a number here
            if let Some(v) = value.as_f64()
                && !(*min <= v && v <= *max)
            {
                report.push(
                    path,
                    ConstraintKind::Range,
                    value,
                    format!("expected value in {min}..={max}"),
                );
            }
        }

        Constraint::MemberOf { allowed } => {
            let s = value.as_str().unwrap_or_default();
            if !allowed.iter().any(|a| a == s) {
                report.push(
                    path,
                    ConstraintKind::MemberOf,
                    value,
                    format!("expected one of {allowed:?}"),
                );
            }
        }

        Constraint::Pattern { pattern } => {
            let s = value.as_str().unwrap_or_default();
            let compiled = match policy {
                PatternMatchPolicy::Full => Regex::new(&format!("^(?:{pattern})$")),
                PatternMatchPolicy::Partial => Regex::new(pattern),
            };
            match compiled {
                Ok(re) => {
                    if !re.is_match(s) {
                        report.push(
                            path,
                            ConstraintKind::Pattern,
                            value,
                            format!("expected match for /{pattern}/"),
                        );
                    }
                }
                Err(e) => report.push(
                    path,
                    ConstraintKind::Pattern,
                    value,
                    format!("pattern failed to compile: {e}"),
                ),
            }
        }

        // Guidance for the generator, never a checkable property.
        Constraint::Hint { .. } => {}
    }
}
