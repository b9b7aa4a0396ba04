//! Record trait and the id-indexed record set that owns a view's data.
//!
//! RULE: Records are immutable values. "Updating" a record means building a
//! new value with the same id and replacing it in its RecordSet.

use crate::{
    error::{ConsoleError, ConsoleResult},
    query::sort::SortKey,
    types::RecordId,
};
use std::collections::HashMap;
use std::fmt;

/// The contract every listable record fulfils.
pub trait Record: Clone {
    /// Closed set of sortable fields for this record kind.
    type Field: Copy + Eq + fmt::Debug;

    fn id(&self) -> &str;

    /// Typed comparison key for `field`. Dispatch is an exhaustive match,
    /// so every field has exactly one key kind.
    fn sort_key(&self, field: Self::Field) -> SortKey<'_>;
}

/// Insertion-ordered records with an id index.
#[derive(Debug, Clone)]
pub struct RecordSet<R> {
    records: Vec<R>,
    index: HashMap<RecordId, usize>,
}

impl<R: Record> Default for RecordSet<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R: Record> RecordSet<R> {
    /// Build from an ordered sequence. Fails on the first duplicate id.
    pub fn from_records(records: Vec<R>) -> ConsoleResult<Self> {
        let mut set = Self::default();
        for record in records {
            set.push(record)?;
        }
        Ok(set)
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Append a record. Its id must be new.
    pub fn push(&mut self, record: R) -> ConsoleResult<()> {
        if self.index.contains_key(record.id()) {
            return Err(ConsoleError::DuplicateRecord {
                id: record.id().to_string(),
            });
        }
        self.index.insert(record.id().to_string(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Swap in a new version of an existing record, keeping its position.
    /// Returns the previous version.
    pub fn replace(&mut self, record: R) -> ConsoleResult<R> {
        let pos = *self
            .index
            .get(record.id())
            .ok_or_else(|| ConsoleError::RecordNotFound {
                id: record.id().to_string(),
            })?;
        Ok(std::mem::replace(&mut self.records[pos], record))
    }

    /// Remove a record by id. Later records keep their relative order.
    pub fn remove(&mut self, id: &str) -> ConsoleResult<R> {
        let pos = self
            .index
            .remove(id)
            .ok_or_else(|| ConsoleError::RecordNotFound { id: id.to_string() })?;
        let removed = self.records.remove(pos);
        for (offset, record) in self.records[pos..].iter().enumerate() {
            self.index.insert(record.id().to_string(), pos + offset);
        }
        Ok(removed)
    }

    pub fn as_slice(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One past the largest numeric id, for sets keyed by sequence numbers.
    pub fn next_sequence_id(&self) -> RecordId {
        let max = self
            .records
            .iter()
            .filter_map(|r| r.id().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}
