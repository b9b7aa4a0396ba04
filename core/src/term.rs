//! Tuition term calendar: billing start, term start and term end per term.

use crate::{
    error::{ConsoleError, ConsoleResult},
    store::SettingsStore,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Settings key the term list is saved under.
pub const TERMS_KEY: &str = "tuitionTerms";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: String,
    pub name: String,
    pub billing_start_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn default_terms() -> Vec<Term> {
    let term = |id: &str, name: &str, billing, start, end| Term {
        id: id.to_string(),
        name: name.to_string(),
        billing_start_date: billing,
        start_date: start,
        end_date: end,
    };
    vec![
        term("1", "Term 1", date(2025, 7, 15), date(2025, 8, 15), date(2025, 12, 20)),
        term("2", "Term 2", date(2025, 12, 1), date(2026, 1, 8), date(2026, 3, 20)),
        term("3", "Term 3", date(2026, 3, 1), date(2026, 4, 1), date(2026, 6, 15)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSettings {
    terms: Vec<Term>,
}

impl Default for TermSettings {
    fn default() -> Self {
        Self {
            terms: default_terms(),
        }
    }
}

impl TermSettings {
    /// Saved terms, or the defaults when nothing has been saved yet.
    pub fn load(store: &SettingsStore) -> ConsoleResult<Self> {
        let terms = store.get_json::<Vec<Term>>(TERMS_KEY)?;
        Ok(terms.map_or_else(Self::default, |terms| Self { terms }))
    }

    pub fn save(&self, store: &SettingsStore) -> ConsoleResult<()> {
        store.put_json(TERMS_KEY, &self.terms)?;
        log::info!("Saved {} tuition terms", self.terms.len());
        Ok(())
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Append an undated "New Term" and return it.
    pub fn add(&mut self) -> &Term {
        self.terms.push(Term {
            id: uuid::Uuid::new_v4().to_string(),
            name: "New Term".to_string(),
            billing_start_date: None,
            start_date: None,
            end_date: None,
        });
        &self.terms[self.terms.len() - 1]
    }

    pub fn update(&mut self, term: Term) -> ConsoleResult<()> {
        let slot = self
            .terms
            .iter_mut()
            .find(|t| t.id == term.id)
            .ok_or_else(|| ConsoleError::RecordNotFound {
                id: term.id.clone(),
            })?;
        *slot = term;
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> ConsoleResult<Term> {
        let pos = self
            .terms
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ConsoleError::RecordNotFound { id: id.to_string() })?;
        Ok(self.terms.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SettingsStore {
        let store = SettingsStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
    }

    #[test]
    fn falls_back_to_defaults() {
        let settings = TermSettings::load(&store()).unwrap();
        assert_eq!(settings.terms().len(), 3);
        assert_eq!(settings.terms()[1].start_date, date(2026, 1, 8));
    }

    #[test]
    fn edits_persist_across_load() {
        let store = store();
        let mut settings = TermSettings::load(&store).unwrap();
        let new_id = settings.add().id.clone();
        let mut edited = settings.terms()[0].clone();
        edited.end_date = date(2025, 12, 19);
        settings.update(edited).unwrap();
        settings.delete("3").unwrap();
        settings.save(&store).unwrap();

        let reloaded = TermSettings::load(&store).unwrap();
        assert_eq!(reloaded, settings);
        assert_eq!(reloaded.terms()[0].end_date, date(2025, 12, 19));
        assert!(reloaded.terms().iter().any(|t| t.id == new_id && t.name == "New Term"));
        assert!(store.get_setting(TERMS_KEY).unwrap().unwrap().contains("billingStartDate"));
    }

    #[test]
    fn unknown_term_is_an_error() {
        let mut settings = TermSettings::default();
        assert!(matches!(
            settings.delete("nope"),
            Err(ConsoleError::RecordNotFound { .. })
        ));
    }
}
