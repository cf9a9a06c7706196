//! # Canonical Dates
//!
//! Records arrive with dates in loosely consistent shapes: `2015-01-01`,
//! `2015-1-1`, `2015-01-01 13:00`, `2015-01-01T00:00:00Z`. Storage wants
//! one shape, `YYYY-MM-DD`.
//!
//! [`CanonicalDate::parse_prefix`] accepts a `YYYY-MM-DD` date followed by
//! arbitrary trailing text and is what date normalization uses.
//! [`CanonicalDate::parse_exact`] accepts nothing but the date and backs
//! the `date` format check.

use std::fmt;

use chrono::NaiveDate;

/// `strftime`-style pattern of the canonical date format.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Human-facing name of the canonical date format, as used in reports.
pub const CANONICAL_DATE_LABEL: &str = "yyyy-mm-dd";

/// A calendar date that renders as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    /// Parse a date at the start of `s`, ignoring whatever follows it.
    pub fn parse_prefix(s: &str) -> Option<Self> {
        NaiveDate::parse_and_remainder(s, CANONICAL_DATE_FORMAT)
            .ok()
            .map(|(date, _rest)| Self(date))
    }

    /// Parse a string that is exactly a date.
    pub fn parse_exact(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, CANONICAL_DATE_FORMAT)
            .ok()
            .map(Self)
    }

    /// Render as `YYYY-MM-DD`.
    pub fn to_canonical_string(&self) -> String {
        self.0.format(CANONICAL_DATE_FORMAT).to_string()
    }
}

impl From<NaiveDate> for CanonicalDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_ignores_trailing_text() {
        let date = CanonicalDate::parse_prefix("2015-01-01 13:00").unwrap();
        assert_eq!(date.to_string(), "2015-01-01");

        let date = CanonicalDate::parse_prefix("2015-01-01 extra").unwrap();
        assert_eq!(date.to_string(), "2015-01-01");
    }

    #[test]
    fn test_prefix_pads_short_fields() {
        let date = CanonicalDate::parse_prefix("2015-1-2").unwrap();
        assert_eq!(date.to_string(), "2015-01-02");
    }

    #[test]
    fn test_prefix_rejects_non_dates() {
        assert!(CanonicalDate::parse_prefix("zzz").is_none());
        assert!(CanonicalDate::parse_prefix("").is_none());
        assert!(CanonicalDate::parse_prefix("2015-13-01").is_none());
        assert!(CanonicalDate::parse_prefix("2015-02-30").is_none());
    }

    #[test]
    fn test_exact_rejects_suffix() {
        assert!(CanonicalDate::parse_exact("2015-01-01").is_some());
        assert!(CanonicalDate::parse_exact("2015-01-01 13:00").is_none());
        assert!(CanonicalDate::parse_exact("").is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Canonical rendering parses back to the same date, with or
        /// without a trailing time of day.
        #[test]
        fn canonical_string_parses_back(
            days in 0i64..200_000,
            suffix in "( [0-9]{2}:[0-9]{2})?"
        ) {
            let base = NaiveDate::from_ymd_opt(1500, 1, 1).unwrap();
            let date = CanonicalDate::from(base + chrono::Duration::days(days));
            let text = format!("{date}{suffix}");
            prop_assert_eq!(CanonicalDate::parse_prefix(&text), Some(date));
        }
    }
}
