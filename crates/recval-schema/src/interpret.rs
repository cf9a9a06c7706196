//! # Error Interpreter
//!
//! Turns the first [`RawFailure`] of a validation run into one
//! [`ValidationError`].
//!
//! ## `oneOf` Disambiguation
//!
//! When a record node matches none of a `oneOf`'s branches, the engine only
//! says so. The interpreter instead tries to work out which branch the
//! record was meant to satisfy and reports that branch's first failure:
//!
//! 1. Branches whose shape cannot hold the node's runtime type are dropped
//!    (an object needs a branch with `properties`, a string a `string` or
//!    untyped leaf branch, and so on).
//! 2. A single survivor is the intended branch.
//! 3. With several survivors and an object node, the first branch with a
//!    property whose non-empty `enum` contains the node's value for that
//!    property wins (the discriminator field).
//!
//! The selected failure is resolved again when it is itself an unmatched
//! `oneOf`, with the chosen branch as the new schema scope. When no branch
//! can be picked, or the schema cannot be walked along the failure's path,
//! the `oneOf` failure is reported as is.
//!
//! ## Classification
//!
//! [`classify`] maps the resolved failure to one of the eleven error kinds.
//! Keyword parameters come from [`crate::params`]; a parameter that cannot
//! be extracted turns the failure into an `unknown` error.

use std::sync::Arc;

use recval_core::{
    join_path, pointer_segments, Keyword, RawFailure, SchemaError, ValidationError,
};
use serde_json::Value;

use crate::formats::FormatSet;
use crate::params::{self, OneOfOutcome};
use crate::store::SchemaStore;
use crate::walker::{node_at_path, resolve_ref, value_at_path, SchemaNode};

/// Interprets raw engine failures against the schema and record they came
/// from.
#[derive(Debug, Clone)]
pub struct Interpreter {
    store: Arc<SchemaStore>,
    formats: FormatSet,
}

impl Interpreter {
    pub fn new(store: Arc<SchemaStore>, formats: FormatSet) -> Self {
        Self { store, formats }
    }

    /// The structured error for the first failure, or `None` when there
    /// are no failures.
    pub fn interpret(
        &self,
        failures: &[RawFailure],
        record: &Value,
        schema: &SchemaNode,
    ) -> Option<ValidationError> {
        let first = failures.first()?;
        let resolved = self.resolve_ambiguity(first, record, schema);
        Some(classify(&resolved, &self.formats))
    }

    /// Replace an unmatched `oneOf` failure by the first failure of the
    /// branch the record was meant to satisfy, recursively. Any other
    /// failure is returned unchanged.
    pub fn resolve_ambiguity(
        &self,
        failure: &RawFailure,
        record: &Value,
        schema: &SchemaNode,
    ) -> RawFailure {
        self.resolve_within(failure, record, schema, &[])
    }

    fn resolve_within(
        &self,
        failure: &RawFailure,
        record: &Value,
        scope: &SchemaNode,
        scope_segments: &[String],
    ) -> RawFailure {
        if !is_unmatched_one_of(failure) {
            return failure.clone();
        }

        let segments = pointer_segments(&failure.fragment);
        let Some(relative) = segments.strip_prefix(scope_segments) else {
            tracing::debug!(path = %failure.path(), "oneOf failure outside the current scope");
            return failure.clone();
        };

        let selected = match self.select_branch(record, &segments, scope, relative) {
            Ok(selected) => selected,
            Err(e) if e.is_navigation() => {
                tracing::debug!(path = %failure.path(), error = %e, "cannot walk schema to oneOf");
                None
            }
            Err(e) => {
                tracing::warn!(path = %failure.path(), error = %e, "schema error while disambiguating oneOf");
                None
            }
        };

        let Some((index, branch)) = selected else {
            tracing::debug!(path = %failure.path(), "oneOf left unresolved");
            return failure.clone();
        };
        let Some(nested) = failure.first_in_branch(index) else {
            tracing::debug!(path = %failure.path(), index, "selected oneOf branch has no failures");
            return failure.clone();
        };

        tracing::debug!(path = %failure.path(), index, "disambiguated oneOf");
        self.resolve_within(nested, record, &branch, &segments)
    }

    /// Pick the `oneOf` branch meant for the record node at `segments`.
    ///
    /// `relative` is `segments` below the scope node.
    fn select_branch(
        &self,
        record: &Value,
        segments: &[String],
        scope: &SchemaNode,
        relative: &[String],
    ) -> Result<Option<(usize, SchemaNode)>, SchemaError> {
        let sub_record = value_at_path(record, segments)?;
        let sub_schema = node_at_path(&self.store, scope, relative)?;

        let mut candidates = Vec::new();
        for (index, branch) in sub_schema.branches("oneOf").into_iter().enumerate() {
            let branch = resolve_ref(&self.store, &branch)?;
            if accepts_runtime_type(&branch, sub_record) {
                candidates.push((index, branch));
            }
        }

        if candidates.len() == 1 {
            return Ok(candidates.pop());
        }

        let Value::Object(fields) = sub_record else {
            return Ok(None);
        };
        for (index, branch) in candidates {
            for (name, property) in branch.properties() {
                let property = resolve_ref(&self.store, &property)?;
                let discriminates = property
                    .enum_values()
                    .zip(fields.get(&name))
                    .is_some_and(|(allowed, value)| allowed.contains(value));
                if discriminates {
                    return Ok(Some((index, branch)));
                }
            }
        }
        Ok(None)
    }
}

fn is_unmatched_one_of(failure: &RawFailure) -> bool {
    failure.keyword == Keyword::OneOf && params::one_of_outcome(failure) == OneOfOutcome::NoMatch
}

/// Whether a branch could describe a value of `value`'s runtime type.
fn accepts_runtime_type(branch: &SchemaNode, value: &Value) -> bool {
    let types = branch.type_names();
    let declares = |name: &str| types.contains(&name);
    match value {
        Value::Object(_) => branch.has_properties(),
        Value::String(_) => declares("string") || (types.is_empty() && !branch.has_properties()),
        Value::Number(n) if n.is_i64() || n.is_u64() => declares("integer") || declares("number"),
        Value::Number(_) => declares("number"),
        Value::Array(_) => declares("array"),
        Value::Bool(_) => declares("boolean"),
        Value::Null => declares("null"),
    }
}

/// Map a failure to its structured error.
///
/// `formats` supplies the wording of custom format failures.
pub fn classify(failure: &RawFailure, formats: &FormatSet) -> ValidationError {
    let path = failure.path();
    let unknown = || ValidationError::unknown(path.clone(), failure.keyword.as_str(), &failure.message);

    match &failure.keyword {
        Keyword::Required => match params::missing_property(failure) {
            Some(name) => ValidationError::missing(join_path(&path, &name)),
            None => unknown(),
        },
        Keyword::AdditionalProperties => {
            let extras = params::extra_properties(failure).unwrap_or_default();
            match extras.first().map(|name| join_path(&path, name)) {
                Some(first) => ValidationError::additional(first, extras),
                None => unknown(),
            }
        }
        Keyword::OneOf => match params::one_of_outcome(failure) {
            OneOfOutcome::ManyMatch => ValidationError::one_of_many_matches(path),
            OneOfOutcome::NoMatch => ValidationError::one_of_no_matches(path),
        },
        Keyword::AnyOf => ValidationError::any_of_no_matches(path),
        Keyword::MinLength => match params::min_length(failure) {
            Some(length) => ValidationError::too_short(path, length),
            None => unknown(),
        },
        Keyword::MaxLength => match params::max_length(failure) {
            Some(length) => ValidationError::too_long(path, length),
            None => unknown(),
        },
        Keyword::Type => match params::allowed_types(failure) {
            Some(types) => ValidationError::type_mismatch(path, types),
            None => unknown(),
        },
        Keyword::Enum => match params::allowed_values(failure) {
            Some(values) => ValidationError::enum_mismatch(path, values),
            None => unknown(),
        },
        Keyword::Format => match params::format_name(failure) {
            Some(name) => {
                let (expected, clause) = formats.describe(&name);
                ValidationError::format_mismatch(path, expected, &clause)
            }
            None => unknown(),
        },
        Keyword::Other(_) => unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recval_core::{ErrorDetail, ErrorKind};
    use serde_json::json;

    const NO_MATCH: &str = "{} is not valid under any of the schemas listed in the 'oneOf' keyword";

    fn interpreter_with(schema: Value) -> (Interpreter, SchemaNode) {
        let store = Arc::new(SchemaStore::in_memory());
        let root = store.register("json-schema:///root.json", schema).unwrap();
        (Interpreter::new(store, FormatSet::standard()), root)
    }

    fn discriminated_schema() -> Value {
        json!({
            "properties": {
                "aaa": {
                    "oneOf": [
                        {
                            "properties": {
                                "a_type": {"enum": ["a1"]},
                                "a_properties": {"required": ["bbb"]}
                            }
                        },
                        {
                            "properties": {
                                "a_type": {"enum": ["a2"]},
                                "a_properties": {"required": ["ccc"]}
                            }
                        }
                    ]
                }
            }
        })
    }

    fn discriminated_failure() -> RawFailure {
        RawFailure::new("/aaa", Keyword::OneOf, NO_MATCH)
            .with_branch(
                0,
                vec![RawFailure::new(
                    "/aaa/a_properties",
                    Keyword::Required,
                    r#""bbb" is a required property"#,
                )],
            )
            .with_branch(
                1,
                vec![
                    RawFailure::new("/aaa/a_type", Keyword::Enum, r#""a1" is not one of ["a2"]"#),
                    RawFailure::new(
                        "/aaa/a_properties",
                        Keyword::Required,
                        r#""ccc" is a required property"#,
                    ),
                ],
            )
    }

    #[test]
    fn test_no_failures_is_valid() {
        let (interpreter, root) = interpreter_with(json!({}));
        assert!(interpreter.interpret(&[], &json!({}), &root).is_none());
    }

    #[test]
    fn test_only_first_failure_is_reported() {
        let (interpreter, root) = interpreter_with(json!({}));
        let failures = vec![
            RawFailure::new("", Keyword::Required, r#""aaa" is a required property"#),
            RawFailure::new("", Keyword::Required, r#""bbb" is a required property"#),
        ];
        let error = interpreter.interpret(&failures, &json!({}), &root).unwrap();
        assert_eq!(error.kind(), ErrorKind::Missing);
        assert_eq!(error.path(), "aaa");
    }

    #[test]
    fn test_discriminator_selects_branch() {
        let (interpreter, root) = interpreter_with(discriminated_schema());
        let record = json!({"aaa": {"a_type": "a1", "a_properties": {}}});
        let error = interpreter
            .interpret(&[discriminated_failure()], &record, &root)
            .unwrap();
        assert_eq!(error.kind(), ErrorKind::Missing);
        assert_eq!(error.path(), "aaa.a_properties.bbb");
        assert_eq!(error.message(), "Missing required property: aaa.a_properties.bbb");
    }

    #[test]
    fn test_discriminator_value_outside_every_enum_is_unresolved() {
        let (interpreter, root) = interpreter_with(discriminated_schema());
        let record = json!({"aaa": {"a_type": "a9", "a_properties": {}}});
        let error = interpreter
            .interpret(&[discriminated_failure()], &record, &root)
            .unwrap();
        assert_eq!(error.kind(), ErrorKind::OneOfNoMatches);
        assert_eq!(error.path(), "aaa");
        assert_eq!(error.message(), "No match for property: aaa");
    }

    #[test]
    fn test_without_discriminator_is_unresolved() {
        let (interpreter, root) = interpreter_with(json!({
            "properties": {
                "aaa": {
                    "oneOf": [
                        {"properties": {"bbb": {"required": ["ccc"]}}},
                        {"properties": {"bbb": {"required": ["ddd"]}}}
                    ]
                }
            }
        }));
        let failure = RawFailure::new("/aaa", Keyword::OneOf, NO_MATCH)
            .with_branch(0, vec![RawFailure::new("/aaa/bbb", Keyword::Required, r#""ccc" is a required property"#)])
            .with_branch(1, vec![RawFailure::new("/aaa/bbb", Keyword::Required, r#""ddd" is a required property"#)]);
        let error = interpreter
            .interpret(&[failure], &json!({"aaa": {"bbb": {}}}), &root)
            .unwrap();
        assert_eq!(error.kind(), ErrorKind::OneOfNoMatches);
        assert_eq!(error.path(), "aaa");
    }

    #[test]
    fn test_runtime_type_selects_single_branch() {
        let (interpreter, root) = interpreter_with(json!({
            "properties": {
                "aaa": {
                    "oneOf": [
                        {"type": "string", "minLength": 3},
                        {"properties": {"bbb": {"type": "string"}}, "required": ["bbb"]}
                    ]
                }
            }
        }));
        let failure = RawFailure::new("/aaa", Keyword::OneOf, NO_MATCH)
            .with_branch(0, vec![RawFailure::new("/aaa", Keyword::MinLength, r#""x" is shorter than 3 characters"#)])
            .with_branch(1, vec![RawFailure::new("/aaa", Keyword::Type, r#""x" is not of type "object""#)]);
        let error = interpreter
            .interpret(&[failure], &json!({"aaa": "x"}), &root)
            .unwrap();
        assert_eq!(error.kind(), ErrorKind::TooShort);
        assert_eq!(error.detail(), &ErrorDetail::TooShort { length: 3 });
    }

    #[test]
    fn test_nested_one_of_is_resolved_recursively() {
        let (interpreter, root) = interpreter_with(json!({
            "properties": {
                "aaa": {
                    "oneOf": [
                        {
                            "properties": {
                                "kind": {"enum": ["x"]},
                                "inner": {
                                    "oneOf": [
                                        {"type": "string", "maxLength": 2},
                                        {"type": "array"}
                                    ]
                                }
                            }
                        },
                        {"properties": {"kind": {"enum": ["y"]}}}
                    ]
                }
            }
        }));
        let inner = RawFailure::new("/aaa/inner", Keyword::OneOf, NO_MATCH)
            .with_branch(0, vec![RawFailure::new("/aaa/inner", Keyword::MaxLength, r#""abc" is longer than 2 characters"#)])
            .with_branch(1, vec![RawFailure::new("/aaa/inner", Keyword::Type, r#""abc" is not of type "array""#)]);
        let outer = RawFailure::new("/aaa", Keyword::OneOf, NO_MATCH)
            .with_branch(0, vec![inner])
            .with_branch(1, vec![RawFailure::new("/aaa/kind", Keyword::Enum, r#""x" is not one of ["y"]"#)]);

        let record = json!({"aaa": {"kind": "x", "inner": "abc"}});
        let error = interpreter.interpret(&[outer], &record, &root).unwrap();
        assert_eq!(error.kind(), ErrorKind::TooLong);
        assert_eq!(error.path(), "aaa.inner");
    }

    #[test]
    fn test_discriminator_behind_reference() {
        let store = Arc::new(SchemaStore::in_memory());
        store
            .register(
                "json-schema:///branches.json",
                json!({
                    "definitions": {
                        "a1": {"properties": {"a_type": {"enum": ["a1"]}, "a_properties": {"required": ["bbb"]}}},
                        "a2": {"properties": {"a_type": {"enum": ["a2"]}}}
                    }
                }),
            )
            .unwrap();
        let root = store
            .register(
                "json-schema:///root.json",
                json!({
                    "properties": {
                        "aaa": {
                            "oneOf": [
                                {"$ref": "branches.json#/definitions/a1"},
                                {"$ref": "branches.json#/definitions/a2"}
                            ]
                        }
                    }
                }),
            )
            .unwrap();
        let interpreter = Interpreter::new(store, FormatSet::standard());
        let error = interpreter
            .interpret(&[discriminated_failure()], &json!({"aaa": {"a_type": "a1", "a_properties": {}}}), &root)
            .unwrap();
        assert_eq!(error.path(), "aaa.a_properties.bbb");
    }

    #[test]
    fn test_schema_mismatch_falls_back_to_unresolved() {
        let (interpreter, root) = interpreter_with(json!({"properties": {}}));
        let error = interpreter
            .interpret(&[discriminated_failure()], &json!({"aaa": {"a_type": "a1"}}), &root)
            .unwrap();
        assert_eq!(error.kind(), ErrorKind::OneOfNoMatches);
        assert_eq!(error.path(), "aaa");
    }

    #[test]
    fn test_cyclic_schema_falls_back_to_unresolved() {
        let (interpreter, root) = interpreter_with(json!({
            "definitions": {"loop": {"$ref": "#/definitions/loop"}},
            "properties": {"aaa": {"$ref": "#/definitions/loop"}}
        }));
        let error = interpreter
            .interpret(&[discriminated_failure()], &json!({"aaa": {"a_type": "a1"}}), &root)
            .unwrap();
        assert_eq!(error.kind(), ErrorKind::OneOfNoMatches);
    }

    #[test]
    fn test_many_matches_stays_unresolved() {
        let (interpreter, root) = interpreter_with(discriminated_schema());
        let failure = RawFailure::new(
            "/aaa",
            Keyword::OneOf,
            "{} is valid under more than one of the schemas listed in the 'oneOf' keyword",
        );
        let error = interpreter.interpret(&[failure], &json!({"aaa": {}}), &root).unwrap();
        assert_eq!(error.kind(), ErrorKind::OneOfManyMatches);
        assert_eq!(error.message(), "Multiple possible matches for property: aaa");
    }

    #[test]
    fn test_classify_additional() {
        let failure = RawFailure::new(
            "",
            Keyword::AdditionalProperties,
            "Additional properties are not allowed ('bbb', 'ccc' were unexpected)",
        );
        let error = classify(&failure, &FormatSet::standard());
        assert_eq!(error.path(), "bbb");
        assert_eq!(
            error.detail(),
            &ErrorDetail::Additional {
                extra_properties: vec!["bbb".into(), "ccc".into()]
            }
        );
    }

    #[test]
    fn test_classify_additional_from_computed_names() {
        let failure = RawFailure::new("/aaa", Keyword::AdditionalProperties, "False schema does not allow 2")
            .with_unexpected(vec!["bbb".into(), "ccc".into()]);
        let error = classify(&failure, &FormatSet::standard());
        assert_eq!(error.kind(), ErrorKind::Additional);
        assert_eq!(error.path(), "aaa.bbb");
        assert_eq!(
            error.detail(),
            &ErrorDetail::Additional {
                extra_properties: vec!["bbb".into(), "ccc".into()]
            }
        );
    }

    #[test]
    fn test_classify_type_and_enum() {
        let formats = FormatSet::standard();
        let failure = RawFailure::new("/aaa", Keyword::Type, r#"[] is not of types "number", "string""#)
            .with_schema_value(json!(["number", "string"]));
        let error = classify(&failure, &formats);
        assert_eq!(error.message(), "Property of wrong type: aaa (must be of type number, string)");

        let failure = RawFailure::new("/aaa", Keyword::Enum, r#""z" is not one of ["a","b","c"]"#);
        let error = classify(&failure, &formats);
        assert_eq!(
            error.message(),
            "Property not an allowed value: aaa (must be one of a, b, c)"
        );
    }

    #[test]
    fn test_classify_formats() {
        let formats = FormatSet::standard();
        let failure = RawFailure::new("/aaa", Keyword::Format, r#""zzz" is not a "date""#);
        let error = classify(&failure, &formats);
        assert_eq!(
            error.detail(),
            &ErrorDetail::FormatMismatch {
                expected_format: "yyyy-mm-dd".into()
            }
        );
        assert_eq!(
            error.message(),
            "Property not of expected format: aaa (must be of format yyyy-mm-dd)"
        );

        let failure = RawFailure::new("/bbb", Keyword::Format, "whatever")
            .with_schema_value(json!("non-blank"));
        assert_eq!(
            classify(&failure, &formats).message(),
            "Property not of expected format: bbb (must not be blank)"
        );
    }

    #[test]
    fn test_classify_unparseable_is_unknown() {
        let formats = FormatSet::standard();
        let failure = RawFailure::new("/aaa", Keyword::MinLength, "too short somehow");
        let error = classify(&failure, &formats);
        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert_eq!(error.message(), "Error of unknown type: aaa (too short somehow)");

        let failure = RawFailure::new("/aaa", Keyword::Other("pattern".into()), r#""x" does not match "^y""#);
        assert_eq!(
            classify(&failure, &formats).detail(),
            &ErrorDetail::Unknown {
                failed_keyword: "pattern".into(),
                raw_message: r#""x" does not match "^y""#.into()
            }
        );
    }

    #[test]
    fn test_accepts_runtime_type() {
        let store = SchemaStore::in_memory();
        let root = store
            .register(
                "json-schema:///t.json",
                json!({"oneOf": [
                    {"type": "integer"},
                    {"type": "number"},
                    {"type": ["string", "null"]},
                    {},
                    {"properties": {}}
                ]}),
            )
            .unwrap();
        let b = root.branches("oneOf");
        assert!(accepts_runtime_type(&b[0], &json!(1)));
        assert!(!accepts_runtime_type(&b[0], &json!(1.5)));
        assert!(accepts_runtime_type(&b[1], &json!(1.5)));
        assert!(accepts_runtime_type(&b[1], &json!(2)));
        assert!(accepts_runtime_type(&b[2], &json!(null)));
        assert!(accepts_runtime_type(&b[3], &json!("s")));
        assert!(!accepts_runtime_type(&b[4], &json!("s")));
        assert!(accepts_runtime_type(&b[4], &json!({})));
        assert!(!accepts_runtime_type(&b[3], &json!(true)));
    }
}
