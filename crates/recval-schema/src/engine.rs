//! # Validation Engine
//!
//! The structural JSON Schema check is delegated to the `jsonschema` crate.
//! [`JsonSchemaEngine`] adapts it to the [`ValidationEngine`] seam: it
//! compiles draft-04 validators for schema nodes held in the
//! [`SchemaStore`], runs them, and turns each engine error into a
//! [`RawFailure`].
//!
//! ## Compilation
//!
//! A node is compiled as the one-line wrapper `{"$ref": "<node uri>"}`, so
//! the engine fetches the node's document (and every document it refers
//! to) through [`StoreRetriever`]. Compiled validators are memoized by node
//! URI for the lifetime of the engine.
//!
//! ## Combinator Branches
//!
//! For a failed `oneOf`/`anyOf`, the engine only reports that the
//! combinator failed. The adapter re-runs the failing record node against
//! each branch on its own and records those failures under the branch
//! index, with fragments relative to the record root. Nested combinator
//! failures get the same treatment, up to [`MAX_BRANCH_DEPTH`] levels.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, ValidationOptions, Validator};
use parking_lot::RwLock;
use recval_core::{pointer_segments, Keyword, RawFailure, SchemaError};
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::formats::FormatSet;
use crate::store::{SchemaStore, StoreRetriever};
use crate::walker::{follow_keyword_path, SchemaNode};

/// Combinator nesting followed when collecting branch failures.
pub const MAX_BRANCH_DEPTH: usize = 32;

/// Runs structural validation of a record against a schema node.
pub trait ValidationEngine: Send + Sync {
    /// Validate `record` against `schema` and return the failures in engine
    /// order. An empty list means the record is valid.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the schema cannot be compiled or one of its
    /// references cannot be loaded.
    fn run_validation(&self, schema: &SchemaNode, record: &Value)
        -> Result<Vec<RawFailure>, SchemaError>;
}

/// [`ValidationEngine`] backed by the `jsonschema` crate in draft-04 mode.
pub struct JsonSchemaEngine {
    store: Arc<SchemaStore>,
    formats: FormatSet,
    validate_formats: bool,
    fast_path: bool,
    validators: RwLock<HashMap<String, Arc<Validator>>>,
}

impl std::fmt::Debug for JsonSchemaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaEngine")
            .field("formats", &self.formats)
            .field("validate_formats", &self.validate_formats)
            .field("fast_path", &self.fast_path)
            .field("compiled", &self.validators.read().len())
            .finish_non_exhaustive()
    }
}

impl JsonSchemaEngine {
    /// Create an engine resolving references through `store` and checking
    /// the custom `formats`.
    pub fn new(store: Arc<SchemaStore>, formats: FormatSet) -> Self {
        Self {
            store,
            formats,
            validate_formats: true,
            fast_path: true,
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// Enable or disable `format` checks entirely.
    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    /// Enable or disable the boolean pre-check before collecting failures.
    pub fn with_fast_path(mut self, enabled: bool) -> Self {
        self.fast_path = enabled;
        self
    }

    pub fn formats(&self) -> &FormatSet {
        &self.formats
    }

    /// Number of validators compiled so far.
    pub fn compiled_count(&self) -> usize {
        self.validators.read().len()
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft4);
        opts.should_validate_formats(self.validate_formats);

        for format in self.formats.iter() {
            let check = format.checker();
            opts.with_format(format.name().to_string(), move |value: &str| check(value));
        }

        opts.with_retriever(StoreRetriever::new(Arc::clone(&self.store)));
        opts
    }

    /// The compiled validator for `node`, built on first use.
    fn validator(&self, node: &SchemaNode) -> Result<Arc<Validator>, SchemaError> {
        let uri = node.uri();
        if let Some(validator) = self.validators.read().get(&uri) {
            return Ok(Arc::clone(validator));
        }

        let wrapper = json!({ "$ref": uri });
        let validator = self
            .build_options()
            .build(&wrapper)
            .map_err(|e| SchemaError::ValidatorBuild {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(uri = %uri, "compiled validator");

        let mut validators = self.validators.write();
        let validator = validators
            .entry(uri)
            .or_insert_with(|| Arc::new(validator));
        Ok(Arc::clone(validator))
    }

    /// Collect failures of `instance` against `origin`, prefixing every
    /// fragment with `prefix` (the pointer of `instance` in the record).
    fn collect(
        &self,
        origin: &SchemaNode,
        instance: &Value,
        prefix: &str,
        depth: usize,
    ) -> Result<Vec<RawFailure>, SchemaError> {
        let validator = self.validator(origin)?;
        if self.fast_path && validator.is_valid(instance) {
            return Ok(Vec::new());
        }

        let mut failures = Vec::new();
        for error in validator.iter_errors(instance) {
            let instance_path = error.instance_path.to_string();
            let schema_path = error.schema_path.to_string();
            let keyword = keyword_of(&error.kind, &schema_path);
            let mut failure = RawFailure::new(
                format!("{prefix}{instance_path}"),
                keyword,
                error.to_string(),
            );

            let location = relative_location(&schema_path);
            match follow_keyword_path(&self.store, origin, location) {
                Ok(node) => {
                    failure.schema_value = Some(node.value().clone());
                    if failure.keyword.is_combinator() && depth < MAX_BRANCH_DEPTH {
                        if let Some(value) = instance.pointer(&instance_path) {
                            failure.branches =
                                self.branch_failures(&node, value, &failure.fragment, depth)?;
                        }
                    }
                }
                Err(e) => {
                    tracing::trace!(location = %schema_path, error = %e, "keyword location not followed");
                }
            }
            if failure.keyword == Keyword::AdditionalProperties {
                if let Some(object) = instance.pointer(&instance_path).and_then(Value::as_object) {
                    failure.unexpected = self.unexpected_at(origin, location, object);
                }
            }
            failures.push(failure);
        }
        Ok(failures)
    }

    /// Keys of `object` that the schema owning the `additionalProperties`
    /// keyword at `location` neither declares nor matches by pattern.
    fn unexpected_at(
        &self,
        origin: &SchemaNode,
        location: &str,
        object: &Map<String, Value>,
    ) -> Vec<String> {
        let parent = location.rsplit_once('/').map_or("", |(parent, _)| parent);
        match follow_keyword_path(&self.store, origin, parent) {
            Ok(node) => unexpected_properties(&node, object),
            Err(e) => {
                tracing::trace!(location = %location, error = %e, "additionalProperties owner not followed");
                Vec::new()
            }
        }
    }

    /// Failures of `value` against each branch of the combinator at `list`.
    fn branch_failures(
        &self,
        list: &SchemaNode,
        value: &Value,
        fragment: &str,
        depth: usize,
    ) -> Result<BTreeMap<usize, Vec<RawFailure>>, SchemaError> {
        let count = list.value().as_array().map_or(0, Vec::len);
        let mut branches = BTreeMap::new();
        for index in 0..count {
            let Some(branch) = list.child(&index.to_string()) else {
                continue;
            };
            let failures = self.collect(&branch, value, fragment, depth + 1)?;
            branches.insert(index, failures);
        }
        Ok(branches)
    }
}

impl ValidationEngine for JsonSchemaEngine {
    fn run_validation(
        &self,
        schema: &SchemaNode,
        record: &Value,
    ) -> Result<Vec<RawFailure>, SchemaError> {
        self.collect(schema, record, "", 0)
    }
}

/// Map an engine error to the keyword that failed.
fn keyword_of(kind: &ValidationErrorKind, schema_path: &str) -> Keyword {
    match kind {
        ValidationErrorKind::Required { .. } => Keyword::Required,
        ValidationErrorKind::AdditionalProperties { .. } => Keyword::AdditionalProperties,
        ValidationErrorKind::OneOfNotValid { .. } | ValidationErrorKind::OneOfMultipleValid { .. } => {
            Keyword::OneOf
        }
        ValidationErrorKind::AnyOf { .. } => Keyword::AnyOf,
        ValidationErrorKind::MinLength { .. } => Keyword::MinLength,
        ValidationErrorKind::MaxLength { .. } => Keyword::MaxLength,
        ValidationErrorKind::Type { .. } => Keyword::Type,
        ValidationErrorKind::Enum { .. } => Keyword::Enum,
        ValidationErrorKind::Format { .. } => Keyword::Format,
        _ => pointer_segments(schema_path)
            .pop()
            .map_or_else(|| Keyword::Other(String::new()), |name| Keyword::from_name(&name)),
    }
}

/// Keys of `object` in record order that `schema` does not list under
/// `properties` and that match none of its `patternProperties`.
fn unexpected_properties(schema: &SchemaNode, object: &Map<String, Value>) -> Vec<String> {
    let declared = schema.keyword("properties").and_then(Value::as_object);
    let patterns: Vec<Regex> = schema
        .keyword("patternProperties")
        .and_then(Value::as_object)
        .map(|patterns| patterns.keys().filter_map(|p| Regex::new(p).ok()).collect())
        .unwrap_or_default();

    object
        .keys()
        .filter(|key| !declared.is_some_and(|declared| declared.contains_key(*key)))
        .filter(|key| !patterns.iter().any(|re| re.is_match(key)))
        .cloned()
        .collect()
}

/// Keyword location relative to the compiled node: the wrapper's leading
/// `$ref` hop is dropped.
fn relative_location(schema_path: &str) -> &str {
    match schema_path.strip_prefix("/$ref") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => schema_path,
    }
}
