//! Exact Matcher: cent-exact lookup against the Reference Table.

use std::sync::Arc;

use crate::matcher::{Hit, Matcher, Source};
use crate::reference::ReferenceTable;
use crate::trip::Trip;

#[derive(Debug, Clone)]
pub struct ExactMatcher {
    table: Arc<ReferenceTable>,
}

impl ExactMatcher {
    pub fn new(table: Arc<ReferenceTable>) -> Self {
        Self { table }
    }
}

impl Matcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn lookup(&self, trip: &Trip) -> Option<Hit> {
        let (index, rec) = self.table.find_exact(trip)?;
        Some(Hit {
            amount: rec.observed_amount,
            source: Source::Exact { index },
        })
    }
}
