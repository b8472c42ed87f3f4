//! The uniform contract shared by the lookup stages.

use serde::Serialize;

use crate::fuzzy::Neighbor;
use crate::rules::Breakdown;
use crate::trip::Trip;

/// Where a resolved amount came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Source {
    Override { label: String },
    Exact { index: usize },
    /// `distance` is that of the closest neighbor.
    Fuzzy { neighbors: Vec<Neighbor>, distance: f64 },
    Formula(Breakdown),
}

impl Source {
    pub fn stage(&self) -> &'static str {
        match self {
            Source::Override { .. } => "override",
            Source::Exact { .. } => "exact",
            Source::Fuzzy { .. } => "fuzzy",
            Source::Formula(_) => "formula",
        }
    }
}

/// A confident answer from one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub amount: f64,
    pub source: Source,
}

/// A stage that may or may not have an answer for a trip.
///
/// `None` means "no match here", never an error.
pub trait Matcher {
    fn name(&self) -> &'static str;
    fn lookup(&self, trip: &Trip) -> Option<Hit>;
}
