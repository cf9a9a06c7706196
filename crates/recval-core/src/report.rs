//! # Validation Error Taxonomy
//!
//! A failed validation yields exactly one [`ValidationError`]: a closed
//! [`ErrorKind`], the dotted path of the offending property, a rendered
//! human-readable message and the parameters specific to the kind.
//!
//! Messages are rendered once, at construction, by the kind-specific
//! constructors below. A `ValidationError` is immutable afterwards.
//!
//! ## Wire Shape
//!
//! Serializes to a flat object keyed by `type`:
//!
//! ```json
//! {"type": "too_short", "path": "aaa", "message": "...", "length": 2}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The closed set of validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    Additional,
    OneOfNoMatches,
    OneOfManyMatches,
    AnyOfNoMatches,
    TooShort,
    TooLong,
    TypeMismatch,
    EnumMismatch,
    FormatMismatch,
    Unknown,
}

/// Number of [`ErrorKind`] variants.
pub const ERROR_KIND_COUNT: usize = 11;

impl ErrorKind {
    /// All kinds, in declaration order.
    pub fn all() -> &'static [ErrorKind; ERROR_KIND_COUNT] {
        &[
            Self::Missing,
            Self::Additional,
            Self::OneOfNoMatches,
            Self::OneOfManyMatches,
            Self::AnyOfNoMatches,
            Self::TooShort,
            Self::TooLong,
            Self::TypeMismatch,
            Self::EnumMismatch,
            Self::FormatMismatch,
            Self::Unknown,
        ]
    }

    /// The snake_case name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Additional => "additional",
            Self::OneOfNoMatches => "one_of_no_matches",
            Self::OneOfManyMatches => "one_of_many_matches",
            Self::AnyOfNoMatches => "any_of_no_matches",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::TypeMismatch => "type_mismatch",
            Self::EnumMismatch => "enum_mismatch",
            Self::FormatMismatch => "format_mismatch",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind together with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorDetail {
    Missing,
    Additional {
        /// Every property the schema did not allow, in record order.
        extra_properties: Vec<String>,
    },
    OneOfNoMatches,
    OneOfManyMatches,
    AnyOfNoMatches,
    TooShort {
        /// Minimum length in characters.
        length: u64,
    },
    TooLong {
        /// Maximum length in characters.
        length: u64,
    },
    TypeMismatch {
        /// Allowed JSON types, in schema order.
        allowed_types: Vec<String>,
    },
    EnumMismatch {
        /// Allowed values, in schema order.
        allowed_values: Vec<Value>,
    },
    FormatMismatch {
        /// Human-facing description of the expected format (e.g. `yyyy-mm-dd`).
        expected_format: String,
    },
    Unknown {
        /// Name of the keyword that failed.
        failed_keyword: String,
        /// The engine's message, verbatim.
        raw_message: String,
    },
}

impl ErrorDetail {
    /// The kind this detail belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Missing => ErrorKind::Missing,
            Self::Additional { .. } => ErrorKind::Additional,
            Self::OneOfNoMatches => ErrorKind::OneOfNoMatches,
            Self::OneOfManyMatches => ErrorKind::OneOfManyMatches,
            Self::AnyOfNoMatches => ErrorKind::AnyOfNoMatches,
            Self::TooShort { .. } => ErrorKind::TooShort,
            Self::TooLong { .. } => ErrorKind::TooLong,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::EnumMismatch { .. } => ErrorKind::EnumMismatch,
            Self::FormatMismatch { .. } => ErrorKind::FormatMismatch,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }
}

/// The structured result of a failed validation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    path: String,
    message: String,
    #[serde(flatten)]
    detail: ErrorDetail,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: String, detail: ErrorDetail) -> Self {
        Self {
            path: path.into(),
            message,
            detail,
        }
    }

    /// A required property is absent. `path` already includes the property.
    pub fn missing(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("Missing required property: {path}");
        Self::new(path, message, ErrorDetail::Missing)
    }

    /// Properties outside the schema were present. `path` names the first.
    pub fn additional(path: impl Into<String>, extra_properties: Vec<String>) -> Self {
        let path = path.into();
        let message = format!("Disallowed additional property: {path}");
        Self::new(path, message, ErrorDetail::Additional { extra_properties })
    }

    pub fn one_of_no_matches(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("No match for property: {path}");
        Self::new(path, message, ErrorDetail::OneOfNoMatches)
    }

    pub fn one_of_many_matches(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("Multiple possible matches for property: {path}");
        Self::new(path, message, ErrorDetail::OneOfManyMatches)
    }

    pub fn any_of_no_matches(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("No match for property: {path}");
        Self::new(path, message, ErrorDetail::AnyOfNoMatches)
    }

    pub fn too_short(path: impl Into<String>, length: u64) -> Self {
        let path = path.into();
        let message =
            format!("Property too short: {path} (must be at least {length} characters)");
        Self::new(path, message, ErrorDetail::TooShort { length })
    }

    pub fn too_long(path: impl Into<String>, length: u64) -> Self {
        let path = path.into();
        let message = format!("Property too long: {path} (must be at most {length} characters)");
        Self::new(path, message, ErrorDetail::TooLong { length })
    }

    pub fn type_mismatch(path: impl Into<String>, allowed_types: Vec<String>) -> Self {
        let path = path.into();
        let message = format!(
            "Property of wrong type: {path} (must be of type {})",
            allowed_types.join(", ")
        );
        Self::new(path, message, ErrorDetail::TypeMismatch { allowed_types })
    }

    /// The value is not in the schema's `enum`. A single-member enum reads
    /// as "must have value", several as "must be one of".
    pub fn enum_mismatch(path: impl Into<String>, allowed_values: Vec<Value>) -> Self {
        let path = path.into();
        let rendered: Vec<String> = allowed_values.iter().map(render_scalar).collect();
        let message = match rendered.as_slice() {
            [single] => format!("Property must have value {single}: {path}"),
            _ => format!(
                "Property not an allowed value: {path} (must be one of {})",
                rendered.join(", ")
            ),
        };
        Self::new(path, message, ErrorDetail::EnumMismatch { allowed_values })
    }

    /// The value failed a `format` check. `clause` is the format-specific
    /// explanation, e.g. `must be of format yyyy-mm-dd`.
    pub fn format_mismatch(
        path: impl Into<String>,
        expected_format: impl Into<String>,
        clause: &str,
    ) -> Self {
        let path = path.into();
        let message = format!("Property not of expected format: {path} ({clause})");
        Self::new(
            path,
            message,
            ErrorDetail::FormatMismatch {
                expected_format: expected_format.into(),
            },
        )
    }

    pub fn unknown(
        path: impl Into<String>,
        failed_keyword: impl Into<String>,
        raw_message: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let raw_message = raw_message.into();
        let message = format!("Error of unknown type: {path} ({raw_message})");
        Self::new(
            path,
            message,
            ErrorDetail::Unknown {
                failed_keyword: failed_keyword.into(),
                raw_message,
            },
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.detail.kind()
    }

    /// Dotted path from the record root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }
}

/// Strings render bare, everything else as JSON.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_are_unique() {
        let mut names: Vec<&str> = ErrorKind::all().iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ERROR_KIND_COUNT);
    }

    #[test]
    fn test_kind_serializes_as_wire_name() {
        for kind in ErrorKind::all() {
            let encoded = serde_json::to_value(kind).unwrap();
            assert_eq!(encoded, json!(kind.as_str()));
        }
    }

    #[test]
    fn test_missing_message() {
        let err = ValidationError::missing("aaa.bbb");
        assert_eq!(err.kind(), ErrorKind::Missing);
        assert_eq!(err.path(), "aaa.bbb");
        assert_eq!(err.message(), "Missing required property: aaa.bbb");
    }

    #[test]
    fn test_length_messages() {
        assert_eq!(
            ValidationError::too_short("aaa", 2).message(),
            "Property too short: aaa (must be at least 2 characters)"
        );
        assert_eq!(
            ValidationError::too_long("aaa", 2).message(),
            "Property too long: aaa (must be at most 2 characters)"
        );
    }

    #[test]
    fn test_type_mismatch_joins_types_in_order() {
        let err = ValidationError::type_mismatch("aaa", vec!["string".into(), "number".into()]);
        assert_eq!(
            err.message(),
            "Property of wrong type: aaa (must be of type string, number)"
        );
    }

    #[test]
    fn test_enum_single_vs_many() {
        let one = ValidationError::enum_mismatch("aaa", vec![json!("a")]);
        assert_eq!(one.message(), "Property must have value a: aaa");

        let many = ValidationError::enum_mismatch("aaa", vec![json!("a"), json!(1), json!(null)]);
        assert_eq!(
            many.message(),
            "Property not an allowed value: aaa (must be one of a, 1, null)"
        );
    }

    #[test]
    fn test_format_and_unknown_messages() {
        let fmt = ValidationError::format_mismatch("aaa", "yyyy-mm-dd", "must be of format yyyy-mm-dd");
        assert_eq!(
            fmt.message(),
            "Property not of expected format: aaa (must be of format yyyy-mm-dd)"
        );

        let unknown = ValidationError::unknown("aaa", "pattern", "\"x\" does not match \"^y$\"");
        assert_eq!(
            unknown.message(),
            "Error of unknown type: aaa (\"x\" does not match \"^y$\")"
        );
    }

    #[test]
    fn test_wire_shape_is_flat() {
        let err = ValidationError::too_short("aaa", 2);
        let encoded = serde_json::to_value(&err).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "too_short",
                "path": "aaa",
                "message": "Property too short: aaa (must be at least 2 characters)",
                "length": 2
            })
        );
        let decoded: ValidationError = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, err);
    }

    #[test]
    fn test_display_is_message() {
        let err = ValidationError::one_of_no_matches("aaa");
        assert_eq!(err.to_string(), "No match for property: aaa");
    }
}
