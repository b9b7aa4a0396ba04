//! FilterStage: reduce a record sequence to the records matching every
//! active criterion. Stable and side-effect free.

use crate::{
    error::{ConsoleError, ConsoleResult},
    types::Timestamp,
};
use chrono::NaiveDate;
use std::str::FromStr;

/// Value of one enumerated filter. `All` places no constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }

    /// An optional field never matches a concrete choice when it is absent.
    pub fn admits_opt(&self, value: Option<&T>) -> bool {
        match (self, value) {
            (Choice::All, _) => true,
            (Choice::Only(wanted), Some(v)) => wanted == v,
            (Choice::Only(_), None) => false,
        }
    }
}

impl<T> Choice<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn as_only(&self) -> Option<&T> {
        match self {
            Choice::All => None,
            Choice::Only(v) => Some(v),
        }
    }

    /// Parse a UI selection; `"all"` (or an empty string) is the sentinel.
    pub fn parse(value: &str) -> ConsoleResult<Self>
    where
        T: FromStr<Err = ConsoleError>,
    {
        if is_all_sentinel(value) {
            Ok(Choice::All)
        } else {
            value.parse().map(Choice::Only)
        }
    }
}

impl Choice<String> {
    /// Free-text choice (grade labels, module names, user ids).
    pub fn text(value: &str) -> Self {
        if is_all_sentinel(value) {
            Choice::All
        } else {
            Choice::Only(value.to_string())
        }
    }
}

fn is_all_sentinel(value: &str) -> bool {
    value.is_empty() || value == "all"
}

/// Filter criteria for one record kind: a predicate plus a key/value setter
/// so callers can drive it from UI selections.
pub trait Criteria<R> {
    fn matches(&self, record: &R) -> bool;

    /// Set one criterion from its UI key. Unknown keys are a caller error.
    fn set(&mut self, key: &str, value: &str) -> ConsoleResult<()>;
}

/// Run the filter stage over `records`. Relative order is preserved.
pub fn filter_records<R: Clone, C: Criteria<R>>(records: &[R], criteria: &C) -> Vec<R> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

/// Case-insensitive substring search over a fixed list of fields.
/// An empty term matches everything.
pub fn text_matches(term: &str, fields: &[&str]) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    fields.iter().any(|field| field.to_lowercase().contains(&needle))
}

/// Inclusive day-granularity date range: on or after the start of
/// `from`, on or before the end of `to`.
pub fn date_in_range(at: Timestamp, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let day = at.date();
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

/// Parse a `yyyy-MM-dd` date input; empty input clears the bound.
pub fn parse_date_input(value: &str) -> ConsoleResult<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ConsoleError::UnknownValue {
            kind: "date",
            value: value.to_string(),
        })
}

pub(crate) fn unknown_filter(key: &str) -> ConsoleError {
    ConsoleError::UnknownField {
        kind: "filter",
        name: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EmailStatus;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn all_sentinel_parses_to_all() {
        assert_eq!(Choice::<EmailStatus>::parse("all").unwrap(), Choice::All);
        assert_eq!(
            Choice::<EmailStatus>::parse("sent").unwrap(),
            Choice::Only(EmailStatus::Sent)
        );
        assert!(Choice::<EmailStatus>::parse("bogus").is_err());
        assert_eq!(Choice::text("Year 3"), Choice::Only("Year 3".to_string()));
    }

    #[test]
    fn optional_field_fails_concrete_choice() {
        let choice = Choice::Only(EmailStatus::Sent);
        assert!(!choice.admits_opt(None));
        assert!(Choice::<EmailStatus>::All.admits_opt(None));
    }

    #[test]
    fn search_is_case_insensitive_any_field() {
        assert!(text_matches("emma", &["INV-1", "Emma Lee"]));
        assert!(text_matches("", &[]));
        assert!(!text_matches("zoe", &["INV-1", "Emma Lee"]));
    }

    #[test]
    fn date_range_is_inclusive_by_day() {
        let from = NaiveDate::from_ymd_opt(2025, 3, 1);
        let to = NaiveDate::from_ymd_opt(2025, 3, 31);
        assert!(date_in_range(at(2025, 3, 1, 0), from, to));
        assert!(date_in_range(at(2025, 3, 31, 23), from, to));
        assert!(!date_in_range(at(2025, 4, 1, 0), from, to));
        assert!(!date_in_range(at(2025, 2, 28, 23), from, to));
        assert!(date_in_range(at(1999, 1, 1, 0), None, None));
    }

    #[test]
    fn date_input_parsing() {
        assert_eq!(parse_date_input("").unwrap(), None);
        assert_eq!(
            parse_date_input("2025-01-02").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2)
        );
        assert!(parse_date_input("02/01/2025").is_err());
    }
}
