//! Dataset integrity audit.
//!
//! Reports conflicting duplicate records and "override candidates": output
//! amounts that recur far more often than a smooth formula would produce,
//! which usually means someone typed the number in by hand. Candidates are
//! advisory only and never feed back into the override table.

use std::collections::BTreeMap;

use reimburse_core::{DuplicateConflict, ReferenceTable};
use serde::Serialize;

/// Amounts are grouped into buckets of this width (nearest $5).
pub const CANDIDATE_BUCKET: f64 = 5.0;

pub const DEFAULT_MIN_REPEATS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideCandidate {
    /// Bucket center.
    pub amount: f64,
    /// Table indices of the records in this bucket, in table order.
    pub cases: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub records: usize,
    pub conflicts: Vec<DuplicateConflict>,
    pub candidates: Vec<OverrideCandidate>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.candidates.is_empty()
    }
}

pub fn audit_table(table: &ReferenceTable, min_repeats: usize) -> AuditReport {
    let mut buckets: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, rec) in table.records().iter().enumerate() {
        let bucket = (rec.observed_amount / CANDIDATE_BUCKET).round() as i64;
        buckets.entry(bucket).or_default().push(i);
    }

    let mut candidates: Vec<OverrideCandidate> = buckets
        .into_iter()
        .filter(|(_, cases)| cases.len() >= min_repeats.max(1))
        .map(|(bucket, cases)| OverrideCandidate {
            amount: bucket as f64 * CANDIDATE_BUCKET,
            cases,
        })
        .collect();

    // Most repeated first; BTreeMap order breaks ties by amount.
    candidates.sort_by(|a, b| b.cases.len().cmp(&a.cases.len()));

    AuditReport {
        records: table.len(),
        conflicts: table.conflicts().to_vec(),
        candidates,
    }
}
