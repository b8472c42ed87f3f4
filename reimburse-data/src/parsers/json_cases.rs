//! JSON datasets: an array of records, flat or in the legacy nested shape.
//!
//!   [{"duration_days": 3, "miles": 93, "receipts": 1.42, "expected_amount": 364.51}, ...]
//!   [{"input": {"trip_duration_days": 3, "miles_traveled": 93,
//!               "total_receipts_amount": 1.42}, "expected_output": 364.51}, ...]

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::types::{Case, JsonCase};

pub fn parse_json_cases(text: &str) -> Result<Vec<Case>> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(text).context("expected a JSON array of records")?;
    raw.into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value::<JsonCase>(value)
                .map(Case::from)
                .with_context(|| format!("record #{}: not a flat or legacy case", i))
        })
        .collect()
}

pub fn parse_json_cases_file(path: &Path) -> Result<Vec<Case>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_json_cases(&text).with_context(|| format!("parsing {}", path.display()))
}
