//! # Date Normalization
//!
//! Rewrites every string leaf that the schema marks `format: date` into the
//! canonical `YYYY-MM-DD` form, walking the schema and the record together.
//!
//! - A leaf that starts with a valid date (`2015-01-01 13:00`) becomes that
//!   date; anything else, including non-strings, is left as it is.
//! - Object keys the schema does not declare pass through untouched, as do
//!   whole subtrees of a schema without `properties`.
//! - Array elements follow `items` (the positional entry for tuple-form
//!   `items`); order, length and `null` elements are kept.
//!
//! The input record is never modified. Applying the normalizer to its own
//! output returns the same value.

use std::sync::Arc;

use recval_core::{CanonicalDate, SchemaError};
use serde_json::{Map, Value};

use crate::store::SchemaStore;
use crate::walker::{resolve_ref, SchemaNode};

/// Schema-guided date normalizer.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    store: Arc<SchemaStore>,
}

impl DateNormalizer {
    pub fn new(store: Arc<SchemaStore>) -> Self {
        Self { store }
    }

    /// Return a copy of `record` with its date leaves in canonical form.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` when a `$ref` on the way cannot be loaded or
    /// forms a cycle.
    pub fn normalize(&self, schema: Option<&SchemaNode>, record: &Value) -> Result<Value, SchemaError> {
        let Some(schema) = schema else {
            return Ok(record.clone());
        };
        let schema = resolve_ref(&self.store, schema)?;

        match record {
            Value::Object(fields) => {
                let mut out = Map::with_capacity(fields.len());
                for (key, value) in fields {
                    let normalized = self.normalize(schema.property(key).as_ref(), value)?;
                    out.insert(key.clone(), normalized);
                }
                Ok(Value::Object(out))
            }
            Value::Array(elements) => elements
                .iter()
                .enumerate()
                .map(|(index, element)| self.normalize(schema.items(Some(index)).as_ref(), element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::String(s) if schema.format() == Some("date") => Ok(normalize_date(s)
                .map(Value::String)
                .unwrap_or_else(|| record.clone())),
            _ => Ok(record.clone()),
        }
    }
}

/// Canonical form of a string starting with a `YYYY-MM-DD` date.
fn normalize_date(s: &str) -> Option<String> {
    CanonicalDate::parse_prefix(s).map(|date| date.to_canonical_string())
}
