//! # Keyword Parameter Parsers
//!
//! Extracts the parameters of a failed keyword (the missing property, the
//! length limit, the allowed types, ...) from a [`RawFailure`].
//!
//! This is the only place that knows the exact wording of the validation
//! engine's messages. Where the engine located the failing keyword in the
//! schema, the structured `schema_value` is preferred and the message is
//! only a fallback. Every parser returns `None` rather than failing when
//! its input does not match; the interpreter then reports the failure as
//! `unknown`.

use once_cell::sync::Lazy;
use recval_core::RawFailure;
use regex::Regex;
use serde_json::Value;

static REQUIRED: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(.+) is a required property$").ok());
static ADDITIONAL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^Additional properties are not allowed \((.+) (?:was|were) unexpected\)$").ok()
});
static QUOTED_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"'([^']*)'").ok());
static MIN_LENGTH: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"is shorter than (\d+) characters?$").ok());
static MAX_LENGTH: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"is longer than (\d+) characters?$").ok());
static TYPES: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"is not of types? ((?:"[a-z]+"(?:, )?)+)$"#).ok());
static QUOTED_TYPE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r#""([a-z]+)""#).ok());
static ENUM: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"is not one of (\[.*\])$").ok());
static FORMAT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r#"is not a "([^"]+)"$"#).ok());

// Older engine releases end these with "the given schemas" instead.
const ONE_OF_NONE: &str = "is not valid under any of the ";
const ONE_OF_MANY: &str = "is valid under more than one of the ";

/// How a `oneOf` check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneOfOutcome {
    /// No branch accepted the value.
    NoMatch,
    /// More than one branch accepted the value.
    ManyMatch,
}

fn captures<'m>(re: &Lazy<Option<Regex>>, message: &'m str) -> Option<regex::Captures<'m>> {
    re.as_ref()?.captures(message)
}

/// Which way a `oneOf` failed.
///
/// Read from the message; when the wording is not recognized, more than one
/// branch without failures means several branches matched.
pub fn one_of_outcome(failure: &RawFailure) -> OneOfOutcome {
    if failure.message.contains(ONE_OF_NONE) {
        return OneOfOutcome::NoMatch;
    }
    if failure.message.contains(ONE_OF_MANY) {
        return OneOfOutcome::ManyMatch;
    }
    let passing = failure.branches.values().filter(|f| f.is_empty()).count();
    if passing > 1 {
        OneOfOutcome::ManyMatch
    } else {
        OneOfOutcome::NoMatch
    }
}

/// Name of the missing property of a `required` failure.
pub fn missing_property(failure: &RawFailure) -> Option<String> {
    let caps = captures(&REQUIRED, &failure.message)?;
    let raw = caps.get(1)?.as_str();
    // The engine prints the property as a JSON string.
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(name)) => Some(name),
        _ => Some(raw.to_string()),
    }
}

/// Names of the disallowed properties of an `additionalProperties` failure,
/// in record order.
pub fn extra_properties(failure: &RawFailure) -> Option<Vec<String>> {
    if !failure.unexpected.is_empty() {
        return Some(failure.unexpected.clone());
    }
    let caps = captures(&ADDITIONAL, &failure.message)?;
    let list = caps.get(1)?.as_str();
    let names: Vec<String> = QUOTED_NAME
        .as_ref()?
        .captures_iter(list)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    (!names.is_empty()).then_some(names)
}

/// Limit of a `minLength` failure.
pub fn min_length(failure: &RawFailure) -> Option<u64> {
    length_limit(failure, &MIN_LENGTH)
}

/// Limit of a `maxLength` failure.
pub fn max_length(failure: &RawFailure) -> Option<u64> {
    length_limit(failure, &MAX_LENGTH)
}

fn length_limit(failure: &RawFailure, pattern: &Lazy<Option<Regex>>) -> Option<u64> {
    if let Some(limit) = failure.schema_value.as_ref().and_then(Value::as_u64) {
        return Some(limit);
    }
    captures(pattern, &failure.message)?.get(1)?.as_str().parse().ok()
}

/// Allowed types of a `type` failure, in schema order.
pub fn allowed_types(failure: &RawFailure) -> Option<Vec<String>> {
    match &failure.schema_value {
        Some(Value::String(t)) => return Some(vec![t.clone()]),
        Some(Value::Array(ts)) => {
            let types: Option<Vec<String>> =
                ts.iter().map(|t| t.as_str().map(String::from)).collect();
            if let Some(types) = types.filter(|t| !t.is_empty()) {
                return Some(types);
            }
        }
        _ => {}
    }
    let caps = captures(&TYPES, &failure.message)?;
    let list = caps.get(1)?.as_str();
    let types: Vec<String> = QUOTED_TYPE
        .as_ref()?
        .captures_iter(list)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    (!types.is_empty()).then_some(types)
}

/// Allowed values of an `enum` failure, in schema order.
pub fn allowed_values(failure: &RawFailure) -> Option<Vec<Value>> {
    if let Some(Value::Array(values)) = &failure.schema_value {
        return Some(values.clone());
    }
    let caps = captures(&ENUM, &failure.message)?;
    serde_json::from_str(caps.get(1)?.as_str()).ok()
}

/// Name of the format a `format` failure was checked against.
///
/// Besides the engine wording, recognizes the failure phrases of the
/// shipped custom formats (`must be of format yyyy-mm-dd`,
/// `must not be blank`).
pub fn format_name(failure: &RawFailure) -> Option<String> {
    if let Some(Value::String(name)) = &failure.schema_value {
        return Some(name.clone());
    }
    if let Some(caps) = captures(&FORMAT, &failure.message) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if failure.message.contains("must be of format yyyy-mm-dd") {
        Some("date".to_string())
    } else if failure.message.contains("must not be blank") {
        Some("non-blank".to_string())
    } else {
        None
    }
}
