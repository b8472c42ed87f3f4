//! Reference Table: the static set of historical observations.
//!
//! Built once at startup and never mutated. The composite-key index is
//! built in the constructor, before any lookup can be served.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::trip::{HistoricalRecord, Trip, TripKey, to_cents};

/// Two records share a key but disagree on the amount.
///
/// The first record in table order is the one the exact matcher returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateConflict {
    pub key: TripKey,
    pub kept_index: usize,
    pub kept_amount: f64,
    pub ignored_index: usize,
    pub ignored_amount: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: Vec<HistoricalRecord>,
    index: HashMap<TripKey, usize>,
    conflicts: Vec<DuplicateConflict>,
}

impl ReferenceTable {
    pub fn new(records: Vec<HistoricalRecord>) -> Self {
        let mut index: HashMap<TripKey, usize> = HashMap::with_capacity(records.len());
        let mut conflicts = Vec::new();

        for (i, rec) in records.iter().enumerate() {
            let key = rec.trip.key();
            match index.get(&key) {
                None => {
                    index.insert(key, i);
                }
                Some(&kept) => {
                    let kept_amount = records[kept].observed_amount;
                    // Same amount twice is just a repeated observation.
                    if to_cents(kept_amount) != to_cents(rec.observed_amount) {
                        warn!(
                            "conflicting historical records for {}: #{} = {:.2}, #{} = {:.2} (keeping #{})",
                            key, kept, kept_amount, i, rec.observed_amount, kept
                        );
                        conflicts.push(DuplicateConflict {
                            key,
                            kept_index: kept,
                            kept_amount,
                            ignored_index: i,
                            ignored_amount: rec.observed_amount,
                        });
                    }
                }
            }
        }

        Self {
            records,
            index,
            conflicts,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&HistoricalRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record (in table order) whose key equals the trip's key.
    pub fn find_exact(&self, trip: &Trip) -> Option<(usize, &HistoricalRecord)> {
        let i = *self.index.get(&trip.key())?;
        Some((i, &self.records[i]))
    }

    pub fn conflicts(&self) -> &[DuplicateConflict] {
        &self.conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(d: u32, m: f64, r: f64, amount: f64) -> HistoricalRecord {
        HistoricalRecord::new(Trip::new(d, m, r).unwrap(), amount)
    }

    #[test]
    fn test_find_exact_hits_and_misses() {
        let table = ReferenceTable::new(vec![
            rec(3, 93.0, 1.42, 364.51),
            rec(5, 130.0, 306.90, 574.10),
        ]);
        let hit = Trip::new(5, 130.0, 306.9).unwrap();
        let (i, r) = table.find_exact(&hit).unwrap();
        assert_eq!(i, 1);
        assert_eq!(r.observed_amount, 574.10);

        let miss = Trip::new(5, 130.0, 306.91).unwrap();
        assert!(table.find_exact(&miss).is_none());
    }

    #[test]
    fn test_duplicate_conflict_keeps_first() {
        let table = ReferenceTable::new(vec![
            rec(2, 50.0, 10.0, 200.00),
            rec(2, 50.0, 10.0, 200.00),
            rec(2, 50.0, 10.0, 250.00),
        ]);
        let (i, r) = table.find_exact(&Trip::new(2, 50.0, 10.0).unwrap()).unwrap();
        assert_eq!(i, 0);
        assert_eq!(r.observed_amount, 200.00);

        // Identical repeats are not conflicts; the 250.00 row is.
        assert_eq!(table.conflicts().len(), 1);
        let c = &table.conflicts()[0];
        assert_eq!(c.kept_index, 0);
        assert_eq!(c.ignored_index, 2);
        assert_eq!(c.ignored_amount, 250.00);
    }

    #[test]
    fn test_empty_table() {
        let table = ReferenceTable::empty();
        assert!(table.is_empty());
        assert!(table.find_exact(&Trip::new(1, 0.0, 0.0).unwrap()).is_none());
        assert!(table.conflicts().is_empty());
    }
}
