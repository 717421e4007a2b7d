//! Generated value trees: complete and partial views.
//!
//! Streaming produces [`PartialValue`] snapshots (absent fields are missing
//! keys); only a snapshot proven complete against its schema converts into
//! a [`GeneratedValue`]. The canonical type is never optional-everywhere —
//! partiality is confined to the streaming path.

use serde::{Deserialize, Serialize};

use super::schema::SchemaDescriptor;
use crate::error::{Result, SkaldError};

/// A fully generated, schema-validated value tree.
///
/// Produced by [`Session::generate`](crate::Session::generate) or by a
/// completed snapshot stream. Guaranteed to have no absent leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedValue {
    value: serde_json::Value,
}

impl GeneratedValue {
    pub(crate) fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Borrow the underlying JSON tree.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Take ownership of the underlying JSON tree.
    pub fn into_inner(self) -> serde_json::Value {
        self.value
    }

    /// Deserialize into a concrete application type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// An in-progress snapshot of a structured generation.
///
/// Fields not yet produced are simply missing from the tree; presence is
/// monotonic across successive snapshots of one stream (a field never
/// reverts to absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialValue {
    root: serde_json::Value,
}

impl PartialValue {
    /// Empty partial (no fields present yet).
    pub fn empty() -> Self {
        Self {
            root: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub(crate) fn root_mut(&mut self) -> &mut serde_json::Value {
        &mut self.root
    }

    /// Borrow the snapshot tree.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.root
    }

    /// Look up a field by JSON pointer (e.g. `/days/0/high_c`).
    ///
    /// Returns `None` for absent fields, which is exactly how absence
    /// reads on a partial view.
    pub fn pointer(&self, pointer: &str) -> Option<&serde_json::Value> {
        self.root.pointer(pointer)
    }

    /// Whether every leaf the schema declares is present.
    pub fn is_complete(&self, schema: &SchemaDescriptor) -> bool {
        is_complete(schema, &self.root)
    }

    /// Convert into the canonical complete type.
    ///
    /// Fails with [`SkaldError::GenerationIncomplete`] when any schema
    /// leaf is still absent.
    pub fn into_generated(self, schema: &SchemaDescriptor) -> Result<GeneratedValue> {
        if self.is_complete(schema) {
            Ok(GeneratedValue::new(self.root))
        } else {
            Err(SkaldError::GenerationIncomplete)
        }
    }
}

fn is_complete(schema: &SchemaDescriptor, value: &serde_json::Value) -> bool {
    match schema {
        SchemaDescriptor::Primitive { .. } | SchemaDescriptor::Enum { .. } => !value.is_null(),
        SchemaDescriptor::Struct { fields } => match value.as_object() {
            Some(map) => fields.iter().all(|(name, field_schema)| {
                map.get(name)
                    .is_some_and(|v| is_complete(field_schema, v))
            }),
            None => false,
        },
        SchemaDescriptor::List { element, .. } => match value.as_array() {
            Some(items) => items.iter().all(|item| is_complete(element, item)),
            None => false,
        },
    }
}
