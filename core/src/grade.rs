//! School-grade labels and the school levels they roll up into.
//!
//! Levels:
//!   - Preprep: Pre-nursery to Year 2
//!   - Prep:    Year 3 to Year 8
//!   - Senior:  Year 9 to Year 13

use crate::types::string_enum;
use std::cmp::Ordering;

/// Every grade label the console knows, in school order.
pub const GRADES: [&str; 16] = [
    "Pre-nursery", "Nursery", "Reception", "Year 1", "Year 2", "Year 3", "Year 4", "Year 5",
    "Year 6", "Year 7", "Year 8", "Year 9", "Year 10", "Year 11", "Year 12", "Year 13",
];

/// Rank given to labels that are not a recognised grade; sorts them last.
pub const UNRANKED_GRADE: i32 = 999;

string_enum! {
    pub enum SchoolLevel {
        Preprep => "preprep",
        Prep => "prep",
        Senior => "senior",
    }
}

impl SchoolLevel {
    pub fn from_grade(grade: &str) -> Self {
        if matches!(grade, "Pre-nursery" | "Nursery" | "Reception" | "Year 1" | "Year 2") {
            return Self::Preprep;
        }
        match year_number(grade) {
            Some(3..=8) => Self::Prep,
            _ => Self::Senior,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Preprep => "Preprep",
            Self::Prep => "Prep",
            Self::Senior => "Senior",
        }
    }

    pub fn range(&self) -> &'static str {
        match self {
            Self::Preprep => "Pre-nursery to Year 2",
            Self::Prep => "Year 3 to Year 8",
            Self::Senior => "Year 9 to Year 13",
        }
    }
}

/// Ordinal rank of a grade label: Pre-nursery = -2, Nursery = -1,
/// Reception = 0, "Year N" = N, anything else = UNRANKED_GRADE.
pub fn grade_rank(grade: &str) -> i32 {
    match grade {
        "Pre-nursery" => -2,
        "Nursery" => -1,
        "Reception" => 0,
        other => year_number(other).unwrap_or(UNRANKED_GRADE),
    }
}

fn year_number(grade: &str) -> Option<i32> {
    let rest = grade.strip_prefix("Year ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Distinct grade labels for a filter dropdown: known grades in school
/// order first, unknown labels after them alphabetically.
pub fn sort_grade_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<&str> = labels.into_iter().collect();
    unique.sort_unstable();
    unique.dedup();
    unique.sort_by(|a, b| {
        let pos_a = GRADES.iter().position(|g| g == a);
        let pos_b = GRADES.iter().position(|g| g == b);
        match (pos_a, pos_b) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    unique.into_iter().map(str::to_string).collect()
}

/// Grade dropdown options drawn from the records actually loaded.
pub fn unique_grades<'a, R>(records: &'a [R], grade_of: impl Fn(&'a R) -> &'a str) -> Vec<String> {
    sort_grade_labels(records.iter().map(grade_of))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_school_order() {
        assert_eq!(grade_rank("Pre-nursery"), -2);
        assert_eq!(grade_rank("Nursery"), -1);
        assert_eq!(grade_rank("Reception"), 0);
        assert_eq!(grade_rank("Year 2"), 2);
        assert_eq!(grade_rank("Year 10"), 10);
        assert_eq!(grade_rank("Kindergarten"), UNRANKED_GRADE);
        assert_eq!(grade_rank("Year"), UNRANKED_GRADE);
    }

    #[test]
    fn every_known_grade_ranks_in_list_order() {
        let ranks: Vec<i32> = GRADES.iter().map(|g| grade_rank(g)).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn levels_by_grade() {
        assert_eq!(SchoolLevel::from_grade("Pre-nursery"), SchoolLevel::Preprep);
        assert_eq!(SchoolLevel::from_grade("Year 2"), SchoolLevel::Preprep);
        assert_eq!(SchoolLevel::from_grade("Year 3"), SchoolLevel::Prep);
        assert_eq!(SchoolLevel::from_grade("Year 8"), SchoolLevel::Prep);
        assert_eq!(SchoolLevel::from_grade("Year 9"), SchoolLevel::Senior);
        assert_eq!(SchoolLevel::from_grade("Year 13"), SchoolLevel::Senior);
        assert_eq!(SchoolLevel::Prep.range(), "Year 3 to Year 8");
        assert_eq!(SchoolLevel::Senior.label(), "Senior");
    }

    #[test]
    fn dropdown_labels_are_unique_and_ordered() {
        let labels = ["Year 10", "Reception", "Zebra", "Year 2", "Year 10", "Alpha"];
        assert_eq!(
            sort_grade_labels(labels),
            vec!["Reception", "Year 2", "Year 10", "Alpha", "Zebra"]
        );
    }
}
