//! Deterministic student and payer name generation using curated name lists.
//!
//! All generation is deterministic (same RNG seed = same names).

use crate::rng::DataRng;

/// Deterministic name generator using curated name lists
pub struct NameGenerator;

impl NameGenerator {
    /// Generate a student's full name (first + last) deterministically
    pub fn student_name(rng: &mut DataRng) -> String {
        let first_name = Self::first_name(rng);
        let last_name = Self::last_name(rng);
        format!("{} {}", first_name, last_name)
    }

    /// Name drawn from the ten most common first and last names only.
    pub fn common_student_name(rng: &mut DataRng) -> String {
        let first_name = rng.pick(&Self::first_names()[..10]);
        let last_name = rng.pick(&Self::last_names()[..10]);
        format!("{} {}", first_name, last_name)
    }

    pub fn first_name(rng: &mut DataRng) -> &'static str {
        *rng.pick(Self::first_names())
    }

    pub fn last_name(rng: &mut DataRng) -> &'static str {
        *rng.pick(Self::last_names())
    }

    /// Pick a payer from the short list of billing contacts.
    pub fn payer_name(rng: &mut DataRng) -> &'static str {
        *rng.pick(Self::payer_names())
    }

    /// Parent mailbox derived from a payer name: "Mrs. Sarah Johnson" -> "sarah@example.com".
    ///
    /// Uses the second word, so honorific-prefixed names map to the given name.
    pub fn parent_email(payer_name: &str) -> String {
        let local = payer_name
            .split_whitespace()
            .nth(1)
            .unwrap_or(payer_name)
            .to_lowercase();
        format!("{local}@example.com")
    }

    /// "first.last@example.com" for a "First Last" student name.
    pub fn family_email(student_name: &str) -> String {
        let local = student_name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(".");
        format!("{local}@example.com")
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "John", "Sarah", "Mike", "Lisa", "David", "Emma", "James", "Sophia", "William",
            "Olivia", "Benjamin", "Ava", "Lucas", "Isabella", "Henry", "Mia", "Alexander",
            "Charlotte", "Mason", "Amelia", "Ethan", "Harper", "Daniel", "Evelyn", "Matthew",
            "Abigail", "Jackson", "Emily", "Sebastian", "Elizabeth", "Jack", "Sofia", "Aiden",
            "Avery", "Owen", "Ella", "Samuel", "Madison", "Gabriel", "Scarlett", "Carter",
            "Victoria", "Wyatt", "Aria", "Jayden", "Grace", "Chloe", "Luke", "Camila",
            "Anthony", "Penelope", "Isaac", "Riley",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
            "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
            "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson",
            "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker",
            "Young", "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores",
            "Green", "Adams", "Nelson", "Baker", "Hall", "Rivera", "Campbell", "Mitchell",
            "Carter", "Roberts",
        ]
    }

    fn payer_names() -> &'static [&'static str] {
        &[
            "Mr. John Smith", "Mrs. Sarah Johnson", "Mr. David Williams", "Ms. Emily Brown",
            "Mr. Michael Davis", "Mrs. Lisa Garcia", "Mr. James Wilson", "Ms. Maria Rodriguez",
        ]
    }
}
