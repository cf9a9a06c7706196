//! # Custom Formats
//!
//! String formats checked on top of the engine's built-in ones. A
//! [`FormatSet`] is handed to each engine instance as configuration; there
//! is no process-wide registry.
//!
//! Two formats ship with recval:
//!
//! - `date`: exactly `YYYY-MM-DD`.
//! - `non-blank`: any string with at least one non-whitespace character.
//!
//! Each format also carries the wording used when a value fails it, so the
//! interpreter can report `format_mismatch` errors without knowing the
//! formats itself.

use std::fmt;
use std::sync::Arc;

use recval_core::{CanonicalDate, ConfigError, CANONICAL_DATE_LABEL};

/// Predicate deciding whether a string satisfies a format.
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A named string format with its failure wording.
#[derive(Clone)]
pub struct CustomFormat {
    name: String,
    expected: String,
    clause: String,
    check: FormatCheck,
}

impl CustomFormat {
    /// Create a format.
    ///
    /// `expected` is the short description reported as `expected_format`;
    /// `clause` completes the sentence "Property not of expected format:
    /// {path} ({clause})".
    pub fn new(
        name: impl Into<String>,
        expected: impl Into<String>,
        clause: impl Into<String>,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            expected: expected.into(),
            clause: clause.into(),
            check: Arc::new(check),
        }
    }

    /// The `date` format: exactly `YYYY-MM-DD`.
    pub fn date() -> Self {
        Self::new(
            "date",
            CANONICAL_DATE_LABEL,
            format!("must be of format {CANONICAL_DATE_LABEL}"),
            |value| CanonicalDate::parse_exact(value).is_some(),
        )
    }

    /// The `non-blank` format: rejects empty and all-whitespace strings.
    pub fn non_blank() -> Self {
        Self::new("non-blank", "non-blank", "must not be blank", |value| {
            !value.trim().is_empty()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    /// Whether `value` satisfies the format.
    pub fn check(&self, value: &str) -> bool {
        (self.check)(value)
    }

    /// A shareable handle to the predicate.
    pub fn checker(&self) -> FormatCheck {
        Arc::clone(&self.check)
    }
}

impl fmt::Debug for CustomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFormat")
            .field("name", &self.name)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

/// The custom formats an engine validates.
#[derive(Debug, Clone)]
pub struct FormatSet {
    formats: Vec<CustomFormat>,
}

impl Default for FormatSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl FormatSet {
    /// No custom formats.
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// `date` and `non-blank`.
    pub fn standard() -> Self {
        Self::empty()
            .with(CustomFormat::date())
            .with(CustomFormat::non_blank())
    }

    /// The built-in formats named in `names`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownFormat` for a name recval does not ship.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        names.iter().try_fold(Self::empty(), |set, name| {
            let format = match name.as_ref() {
                "date" => CustomFormat::date(),
                "non-blank" => CustomFormat::non_blank(),
                other => return Err(ConfigError::UnknownFormat(other.to_string())),
            };
            Ok(set.with(format))
        })
    }

    /// Add a format, replacing any format of the same name.
    pub fn with(mut self, format: CustomFormat) -> Self {
        self.formats.retain(|f| f.name != format.name);
        self.formats.push(format);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CustomFormat> {
        self.formats.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomFormat> {
        self.formats.iter()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// `(expected_format, clause)` reported when a value fails `name`.
    ///
    /// Formats outside the set (the engine's built-ins, such as `email`)
    /// are described by their name.
    pub fn describe(&self, name: &str) -> (String, String) {
        match self.get(name) {
            Some(format) => (format.expected().to_string(), format.clause().to_string()),
            None => (name.to_string(), format!("must be of format {name}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_format() {
        let date = CustomFormat::date();
        assert!(date.check("2015-01-01"));
        assert!(!date.check("zzz"));
        assert!(!date.check(""));
        assert!(!date.check("2015-01-01 13:00"));
        assert!(!date.check("2015-02-30"));
    }

    #[test]
    fn test_non_blank_format() {
        let non_blank = CustomFormat::non_blank();
        assert!(non_blank.check("x"));
        assert!(non_blank.check("  x "));
        assert!(!non_blank.check(""));
        assert!(!non_blank.check(" \t\n"));
    }

    #[test]
    fn test_from_names() {
        let set = FormatSet::from_names(&["date"]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.get("date").is_some());
        assert!(set.get("non-blank").is_none());

        let err = FormatSet::from_names(&["date", "uuid-ish"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat(ref name) if name == "uuid-ish"));
    }

    #[test]
    fn test_with_replaces_same_name() {
        let set = FormatSet::standard().with(CustomFormat::new("date", "any", "anything", |_| true));
        assert_eq!(set.len(), 2);
        let date = set.get("date").unwrap();
        assert!(date.check("zzz"));
        assert_eq!(date.expected(), "any");
        assert_eq!(date.clause(), "anything");
        assert_eq!(set.describe("date"), ("any".to_string(), "anything".to_string()));
    }

    #[test]
    fn test_describe() {
        let set = FormatSet::standard();
        assert_eq!(
            set.describe("date"),
            ("yyyy-mm-dd".to_string(), "must be of format yyyy-mm-dd".to_string())
        );
        assert_eq!(
            set.describe("non-blank"),
            ("non-blank".to_string(), "must not be blank".to_string())
        );
        assert_eq!(
            set.describe("email"),
            ("email".to_string(), "must be of format email".to_string())
        );
    }
}
