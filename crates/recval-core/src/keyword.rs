//! # Raw Engine Failures
//!
//! [`RawFailure`] is the engine-neutral shape of one failure reported by a
//! JSON Schema validation engine, before any interpretation. Engines fill
//! in the fragment, the failing [`Keyword`] and their own message text;
//! when they can, they also attach the failing keyword's value from the
//! schema and, for combinators, the failures collected per branch.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::path::fragment_to_path;

/// The schema keyword whose check failed.
///
/// Closed set: the interpreter matches exhaustively over it, and any
/// keyword it has no dedicated handling for travels as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    Required,
    AdditionalProperties,
    OneOf,
    AnyOf,
    MinLength,
    MaxLength,
    Type,
    Enum,
    Format,
    /// Any other keyword, carried by its schema name (e.g. `"pattern"`).
    Other(String),
}

impl Keyword {
    /// Map a JSON Schema keyword name to its tag.
    pub fn from_name(name: &str) -> Self {
        match name {
            "required" => Self::Required,
            "additionalProperties" => Self::AdditionalProperties,
            "oneOf" => Self::OneOf,
            "anyOf" => Self::AnyOf,
            "minLength" => Self::MinLength,
            "maxLength" => Self::MaxLength,
            "type" => Self::Type,
            "enum" => Self::Enum,
            "format" => Self::Format,
            other => Self::Other(other.to_string()),
        }
    }

    /// The JSON Schema keyword name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::AdditionalProperties => "additionalProperties",
            Self::OneOf => "oneOf",
            Self::AnyOf => "anyOf",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Format => "format",
            Self::Other(name) => name,
        }
    }

    /// Whether the keyword tries several candidate sub-schemas.
    pub fn is_combinator(&self) -> bool {
        matches!(self, Self::OneOf | Self::AnyOf)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failure as reported by the validation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFailure {
    /// JSON pointer to the offending record node, relative to the record root.
    pub fragment: String,
    /// The keyword that failed.
    pub keyword: Keyword,
    /// Engine message text.
    pub message: String,
    /// The failing keyword's value in the schema, when the engine located it.
    pub schema_value: Option<Value>,
    /// For combinators: branch index to the failures seen trying that branch.
    pub branches: BTreeMap<usize, Vec<RawFailure>>,
    /// For `additionalProperties`: the disallowed record keys, in record
    /// order, when the engine computed them.
    pub unexpected: Vec<String>,
}

impl RawFailure {
    /// Create a failure with no schema value and no branches.
    pub fn new(fragment: impl Into<String>, keyword: Keyword, message: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            keyword,
            message: message.into(),
            schema_value: None,
            branches: BTreeMap::new(),
            unexpected: Vec::new(),
        }
    }

    /// Attach the failing keyword's schema value.
    pub fn with_schema_value(mut self, value: Value) -> Self {
        self.schema_value = Some(value);
        self
    }

    /// Attach the failures recorded for one combinator branch.
    pub fn with_branch(mut self, index: usize, failures: Vec<RawFailure>) -> Self {
        self.branches.insert(index, failures);
        self
    }

    /// Attach the disallowed property names of an `additionalProperties`
    /// failure.
    pub fn with_unexpected(mut self, names: Vec<String>) -> Self {
        self.unexpected = names;
        self
    }

    /// First failure recorded under a branch, if any.
    pub fn first_in_branch(&self, index: usize) -> Option<&RawFailure> {
        self.branches.get(&index).and_then(|failures| failures.first())
    }

    /// Dotted path of the offending node.
    pub fn path(&self) -> String {
        fragment_to_path(&self.fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_names_round_trip() {
        for name in [
            "required",
            "additionalProperties",
            "oneOf",
            "anyOf",
            "minLength",
            "maxLength",
            "type",
            "enum",
            "format",
            "pattern",
        ] {
            assert_eq!(Keyword::from_name(name).as_str(), name);
        }
        assert_eq!(Keyword::from_name("minimum"), Keyword::Other("minimum".into()));
    }

    #[test]
    fn test_first_in_branch() {
        let nested = RawFailure::new("/aaa/bbb", Keyword::Required, "\"ccc\" is a required property");
        let failure = RawFailure::new("/aaa", Keyword::OneOf, "no match")
            .with_branch(0, vec![])
            .with_branch(1, vec![nested.clone()]);
        assert!(failure.first_in_branch(0).is_none());
        assert_eq!(failure.first_in_branch(1), Some(&nested));
        assert!(failure.first_in_branch(2).is_none());
        assert_eq!(failure.path(), "aaa");
    }

    #[test]
    fn test_unexpected_names() {
        let failure = RawFailure::new("", Keyword::AdditionalProperties, "False schema does not allow 2");
        assert!(failure.unexpected.is_empty());
        let failure = failure.with_unexpected(vec!["bbb".into(), "ccc".into()]);
        assert_eq!(failure.unexpected, vec!["bbb", "ccc"]);
    }
}
