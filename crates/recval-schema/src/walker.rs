//! # Schema Walker
//!
//! Navigation over a schema tree, in lock-step with a record, given a path.
//! Shared by the error interpreter (to find the `oneOf` governing a failed
//! record node) and the date normalizer (to find the schema governing each
//! record leaf).
//!
//! A [`SchemaNode`] is a position inside a loaded document: the shared
//! document, its absolute base URI, and a JSON pointer. Stepping through
//! `properties` or `items` only extends the pointer; following `$ref`
//! switches document and pointer through the [`SchemaStore`].
//!
//! ## Reference Cycles
//!
//! [`resolve_ref`] follows `$ref` chains (a reference whose target is
//! itself a reference) and records each absolute URI it visits. Reaching a
//! URI twice raises `SchemaError::CyclicReference` instead of recursing.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use recval_core::{escape_pointer_segment, pointer_segments, SchemaError};
use serde_json::Value;
use url::Url;

use crate::store::SchemaStore;

static NULL: Value = Value::Null;

/// A position inside a loaded schema document.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    base: Url,
    doc: Arc<Value>,
    pointer: String,
}

impl SchemaNode {
    /// The root node of a document.
    pub(crate) fn root(base: Url, doc: Arc<Value>) -> Self {
        Self {
            base,
            doc,
            pointer: String::new(),
        }
    }

    /// The node at `pointer`, if the document has one there.
    fn at(base: Url, doc: Arc<Value>, pointer: String) -> Option<Self> {
        doc.pointer(&pointer)?;
        Some(Self { base, doc, pointer })
    }

    /// The schema value at this position.
    pub fn value(&self) -> &Value {
        self.doc.pointer(&self.pointer).unwrap_or(&NULL)
    }

    /// URI of the document containing this node.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// JSON pointer of this node within its document.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Absolute URI naming this node (`<document>#<pointer>`).
    pub fn uri(&self) -> String {
        let mut url = self.base.clone();
        url.set_fragment(Some(&self.pointer));
        url.to_string()
    }

    /// Step into a raw child (object key or array index) of this node.
    pub fn child(&self, segment: &str) -> Option<SchemaNode> {
        let pointer = format!("{}/{}", self.pointer, escape_pointer_segment(segment));
        Self::at(self.base.clone(), Arc::clone(&self.doc), pointer)
    }

    /// The value of a keyword on this node.
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.value().get(name)
    }

    /// The `$ref` string, if this node is a reference.
    pub fn reference(&self) -> Option<&str> {
        self.keyword("$ref").and_then(Value::as_str)
    }

    /// Whether the node declares a `properties` mapping.
    pub fn has_properties(&self) -> bool {
        self.keyword("properties").is_some_and(Value::is_object)
    }

    /// The schema of a declared property.
    pub fn property(&self, name: &str) -> Option<SchemaNode> {
        if !self.has_properties() {
            return None;
        }
        self.child("properties")?.child(name)
    }

    /// All declared properties, in declaration order.
    pub fn properties(&self) -> Vec<(String, SchemaNode)> {
        let Some(props) = self.keyword("properties").and_then(Value::as_object) else {
            return Vec::new();
        };
        props
            .keys()
            .filter_map(|name| self.property(name).map(|node| (name.clone(), node)))
            .collect()
    }

    /// The schema governing an array element. Tuple-form `items` picks the
    /// entry at `index`.
    pub fn items(&self, index: Option<usize>) -> Option<SchemaNode> {
        match self.keyword("items")? {
            Value::Array(_) => self.child("items")?.child(&index?.to_string()),
            _ => self.child("items"),
        }
    }

    /// Whether the node describes an array position.
    pub fn describes_array(&self) -> bool {
        self.keyword("items").is_some() || self.type_names().contains(&"array")
    }

    /// Candidate sub-schemas of a combinator keyword (`oneOf`, `anyOf`).
    pub fn branches(&self, keyword: &str) -> Vec<SchemaNode> {
        let count = self
            .keyword(keyword)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        let Some(list) = self.child(keyword) else {
            return Vec::new();
        };
        (0..count)
            .filter_map(|i| list.child(&i.to_string()))
            .collect()
    }

    /// Declared `type` names; a single string or a list.
    pub fn type_names(&self) -> Vec<&str> {
        match self.keyword("type") {
            Some(Value::String(t)) => vec![t.as_str()],
            Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn format(&self) -> Option<&str> {
        self.keyword("format").and_then(Value::as_str)
    }

    /// Members of a non-empty `enum`.
    pub fn enum_values(&self) -> Option<&[Value]> {
        self.keyword("enum")
            .and_then(Value::as_array)
            .filter(|values| !values.is_empty())
            .map(Vec::as_slice)
    }
}

/// Follow one `$ref` hop from `node`.
fn resolve_once(store: &SchemaStore, node: &SchemaNode, reference: &str) -> Result<SchemaNode, SchemaError> {
    let target = node.base.join(reference).map_err(|e| SchemaError::InvalidReference {
        reference: reference.to_string(),
        base: node.base.to_string(),
        reason: e.to_string(),
    })?;
    let pointer = decode_fragment(target.fragment().unwrap_or(""));
    let mut doc_url = target;
    doc_url.set_fragment(None);

    let doc = store.document(&doc_url)?;
    let uri = doc_url.to_string();
    SchemaNode::at(doc_url, doc, pointer.clone()).ok_or_else(|| SchemaError::InvalidReference {
        reference: reference.to_string(),
        base: node.base.to_string(),
        reason: format!("'{uri}' has no node at '{pointer}'"),
    })
}

/// Dereference `node` if it is a `$ref`, following reference chains.
///
/// Nodes without `$ref` are returned unchanged.
///
/// # Errors
///
/// `SchemaError::CyclicReference` when the chain revisits a URI; load and
/// reference errors from the store otherwise.
pub fn resolve_ref(store: &SchemaStore, node: &SchemaNode) -> Result<SchemaNode, SchemaError> {
    let mut current = node.clone();
    let mut chain = vec![current.uri()];
    while let Some(reference) = current.reference() {
        let next = resolve_once(store, &current, reference)?;
        let uri = next.uri();
        if chain.contains(&uri) {
            return Err(SchemaError::CyclicReference { uri, chain });
        }
        tracing::trace!(from = %current.uri(), to = %uri, "followed $ref");
        chain.push(uri);
        current = next;
    }
    Ok(current)
}

/// The schema node governing the record position named by `segments`.
///
/// Each segment steps into `properties[segment]`, or into `items` when the
/// node describes an array (the segment is the element index). References
/// are resolved before and after every step.
///
/// # Errors
///
/// `SchemaError::PathNotFound` when the schema has no matching structure.
pub fn node_at_path(
    store: &SchemaStore,
    schema: &SchemaNode,
    segments: &[String],
) -> Result<SchemaNode, SchemaError> {
    let mut current = resolve_ref(store, schema)?;
    for (depth, segment) in segments.iter().enumerate() {
        let next = match current.property(segment) {
            Some(node) => Some(node),
            None if current.describes_array() => current.items(segment.parse().ok()),
            None => None,
        };
        let next = next.ok_or_else(|| SchemaError::PathNotFound {
            path: segments[..=depth].join("."),
        })?;
        current = resolve_ref(store, &next)?;
    }
    Ok(current)
}

/// The record value at the position named by `segments`.
pub fn value_at_path<'v>(record: &'v Value, segments: &[String]) -> Result<&'v Value, SchemaError> {
    let mut current = record;
    for (depth, segment) in segments.iter().enumerate() {
        let next = match current {
            Value::Object(fields) => fields.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| SchemaError::PathNotFound {
            path: segments[..=depth].join("."),
        })?;
    }
    Ok(current)
}

/// Follow an engine keyword location (a JSON pointer into the schema that
/// may pass through `$ref`) from `origin` to the node it names.
///
/// A `$ref` segment dereferences the current node. When a location omits
/// `$ref` hops, a segment missing from a reference node is looked up in the
/// reference target instead.
pub fn follow_keyword_path(
    store: &SchemaStore,
    origin: &SchemaNode,
    location: &str,
) -> Result<SchemaNode, SchemaError> {
    let segments = pointer_segments(location);
    let mut current = origin.clone();
    for (depth, segment) in segments.iter().enumerate() {
        if segment == "$ref" {
            if let Some(reference) = current.reference() {
                current = resolve_once(store, &current, reference)?;
                continue;
            }
        }
        current = match current.child(segment) {
            Some(node) => node,
            None if current.reference().is_some() => resolve_ref(store, &current)?
                .child(segment)
                .ok_or_else(|| SchemaError::PathNotFound {
                    path: segments[..=depth].join("."),
                })?,
            None => {
                return Err(SchemaError::PathNotFound {
                    path: segments[..=depth].join("."),
                })
            }
        };
    }
    Ok(current)
}

/// Decode `%XX` escapes in a URI fragment.
fn decode_fragment(fragment: &str) -> String {
    percent_decode_str(fragment).decode_utf8_lossy().into_owned()
}
