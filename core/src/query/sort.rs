//! SortStage: order a record sequence by one field, with comparison
//! chosen by the field's kind.

use crate::{error::ConsoleResult, record::Record, types::Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Comparison key produced by `Record::sort_key`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    /// Numeric comparison.
    Number(f64),
    /// Compared by instant, never by display string.
    Timestamp(Timestamp),
    /// Case-insensitive lexicographic comparison.
    Text(&'a str),
    /// Domain ordinal, e.g. `grade_rank`.
    Ordinal(i32),
}

impl SortKey<'_> {
    pub fn compare(&self, other: &SortKey<'_>) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => compare_ignore_case(a, b),
            (SortKey::Ordinal(a), SortKey::Ordinal(b)) => a.cmp(b),
            // One field always yields one kind; this arm only keeps the order total.
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Timestamp(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::Ordinal(_) => 3,
        }
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = crate::error::ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(crate::error::ConsoleError::UnknownValue {
                kind: "SortDirection",
                value: other.to_string(),
            }),
        }
    }
}

/// `field == None` keeps natural (generation) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<F> {
    pub field: Option<F>,
    pub direction: SortDirection,
}

impl<F: Copy + Eq> Default for SortSpec<F> {
    fn default() -> Self {
        Self::unsorted()
    }
}

impl<F: Copy + Eq> SortSpec<F> {
    pub fn unsorted() -> Self {
        Self {
            field: None,
            direction: SortDirection::Asc,
        }
    }

    pub fn by(field: F, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    /// Column-header click: the same field flips direction,
    /// a new field starts ascending.
    pub fn toggle(self, field: F) -> Self {
        if self.field == Some(field) {
            Self::by(field, self.direction.toggled())
        } else {
            Self::by(field, SortDirection::Asc)
        }
    }

    /// Parse UI strings. An unknown field name is a caller error.
    pub fn parse(field: Option<&str>, direction: &str) -> ConsoleResult<Self>
    where
        F: FromStr<Err = crate::error::ConsoleError>,
    {
        let direction = direction.parse()?;
        let field = field.map(str::parse).transpose()?;
        Ok(Self { field, direction })
    }
}

/// Run the sort stage. Returns a new sequence; `records` is untouched.
///
/// Uses `slice::sort_by`, which is stable: equal keys keep their input
/// order in both directions.
pub fn sort_records<R: Record>(records: &[R], spec: &SortSpec<R::Field>) -> Vec<R> {
    let mut sorted = records.to_vec();
    if let Some(field) = spec.field {
        sorted.sort_by(|a, b| {
            let ord = a.sort_key(field).compare(&b.sort_key(field));
            match spec.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
    sorted
}
