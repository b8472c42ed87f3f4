//! Fuzzy Matcher: nearest historical records within a distance threshold.
//!
//! Distance is a weighted sum of absolute differences:
//!
//! ```text
//! d = |Δdays| * days_weight + |Δmiles| / miles_scale + |Δreceipts| / receipts_scale
//! ```
//!
//! Only records with `d < max_distance` are candidates. With the default
//! settings a one-day difference alone already reaches the threshold, so
//! matches stay within the same trip duration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::matcher::{Hit, Matcher, Source};
use crate::reference::ReferenceTable;
use crate::trip::Trip;

/// How an amount is derived from the qualifying neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuzzyPolicy {
    /// Amount of the single closest record.
    #[default]
    Nearest,
    /// Inverse-distance weighted mean over the `k` closest records.
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    pub days_weight: f64,
    pub miles_scale: f64,
    pub receipts_scale: f64,
    pub max_distance: f64,
    pub k: usize,
    pub policy: FuzzyPolicy,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            days_weight: 1.0,
            miles_scale: 100.0,
            receipts_scale: 100.0,
            max_distance: 1.0,
            k: 1,
            policy: FuzzyPolicy::Nearest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Position in the reference table.
    pub index: usize,
    pub distance: f64,
    pub amount: f64,
}

#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    table: Arc<ReferenceTable>,
    config: FuzzyConfig,
}

impl FuzzyMatcher {
    pub fn new(table: Arc<ReferenceTable>, config: FuzzyConfig) -> Self {
        Self { table, config }
    }

    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    pub fn distance(&self, a: &Trip, b: &Trip) -> f64 {
        let c = &self.config;
        let days = (f64::from(a.duration_days()) - f64::from(b.duration_days())).abs();
        days * c.days_weight
            + (a.miles() - b.miles()).abs() / c.miles_scale
            + (a.receipts() - b.receipts()).abs() / c.receipts_scale
    }

    /// Up to `k` records strictly inside the threshold, closest first.
    /// Equal distances keep table order.
    pub fn nearest_neighbors(&self, trip: &Trip, k: usize) -> Vec<Neighbor> {
        let mut out: Vec<Neighbor> = self
            .table
            .records()
            .iter()
            .enumerate()
            .filter_map(|(index, rec)| {
                let distance = self.distance(trip, &rec.trip);
                (distance < self.config.max_distance).then_some(Neighbor {
                    index,
                    distance,
                    amount: rec.observed_amount,
                })
            })
            .collect();

        out.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        out.truncate(k);
        out
    }

    /// Amount for already-selected neighbors under the configured policy.
    pub fn estimate(&self, neighbors: &[Neighbor]) -> Option<f64> {
        let first = neighbors.first()?;
        match self.config.policy {
            FuzzyPolicy::Nearest => Some(first.amount),
            FuzzyPolicy::Mean => {
                if first.distance == 0.0 {
                    return Some(first.amount);
                }
                let (weighted, total) = neighbors.iter().fold((0.0, 0.0), |(s, w), n| {
                    let weight = 1.0 / n.distance;
                    (s + weight * n.amount, w + weight)
                });
                Some(weighted / total)
            }
        }
    }

    fn neighbor_count(&self) -> usize {
        match self.config.policy {
            FuzzyPolicy::Nearest => 1,
            FuzzyPolicy::Mean => self.config.k.max(1),
        }
    }
}

impl Matcher for FuzzyMatcher {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn lookup(&self, trip: &Trip) -> Option<Hit> {
        let neighbors = self.nearest_neighbors(trip, self.neighbor_count());
        let amount = self.estimate(&neighbors)?;
        let distance = neighbors.first()?.distance;
        Some(Hit {
            amount,
            source: Source::Fuzzy {
                neighbors,
                distance,
            },
        })
    }
}
