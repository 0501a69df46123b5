// src/services/candidate_store.rs
// DOCUMENTATION: Append-only accumulation of place records
// PURPOSE: Deduplicate places by id across pages, then freeze them for classification

use crate::models::PlaceRecord;
use std::collections::HashMap;

/// Mutable accumulation phase
/// DOCUMENTATION: Owned by the paginator while pages arrive. `add` is
/// insert-if-absent keyed by place id; the first occurrence wins.
#[derive(Debug, Default)]
pub struct CandidateStore {
    records: Vec<PlaceRecord>,
    index: HashMap<String, usize>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its id is already present
    ///
    /// # Returns
    /// `true` when the record was new
    pub fn add(&mut self, record: PlaceRecord) -> bool {
        if self.index.contains_key(&record.id) {
            return false;
        }

        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Records in insertion order
    pub fn all(&self) -> &[PlaceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// End the accumulation phase
    pub fn freeze(self) -> CandidateSet {
        CandidateSet {
            records: self.records,
            index: self.index,
        }
    }
}

/// Frozen, read-only candidate set
/// DOCUMENTATION: Shared (behind an `Arc`) by every classification call of a run
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    records: Vec<PlaceRecord>,
    index: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Resolve an id back to its record
    pub fn get(&self, id: &str) -> Option<&PlaceRecord> {
        self.index.get(id).map(|&idx| &self.records[idx])
    }

    pub fn all(&self) -> &[PlaceRecord] {
        &self.records
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<PlaceRecord> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = PlaceRecord>>(iter: I) -> Self {
        let mut store = CandidateStore::new();
        for record in iter {
            store.add(record);
        }
        store.freeze()
    }
}
