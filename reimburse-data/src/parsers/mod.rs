//! Reference dataset parsers. The format is chosen by file extension.

pub mod csv_cases;
pub mod json_cases;

use anyhow::{Context, Result, bail};
use reimburse_core::{HistoricalRecord, ReferenceTable};
use std::path::Path;
use tracing::{info, warn};

use crate::types::Case;

/// Read every case from a `.json` or `.csv` dataset, in file order.
pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<Case>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("json") => json_cases::parse_json_cases_file(path),
        Some("csv") => csv_cases::parse_csv_cases(path),
        _ => bail!(
            "unsupported dataset format: {} (expected .json or .csv)",
            path.display()
        ),
    }
}

/// Load and validate a dataset into an immutable reference table.
///
/// Any invalid record aborts the load. Duplicate conflicts are logged and
/// kept on the table for auditing.
pub fn load_reference_table(path: impl AsRef<Path>) -> Result<ReferenceTable> {
    let path = path.as_ref();
    let cases = load_cases(path)?;
    let records = to_records(&cases).with_context(|| format!("validating {}", path.display()))?;

    let table = ReferenceTable::new(records);
    info!("loaded {} reference records from {}", table.len(), path.display());
    if !table.conflicts().is_empty() {
        warn!(
            "{} conflicting duplicate record(s) in {}; first occurrence wins",
            table.conflicts().len(),
            path.display()
        );
    }
    Ok(table)
}

pub fn to_records(cases: &[Case]) -> Result<Vec<HistoricalRecord>> {
    cases
        .iter()
        .enumerate()
        .map(|(i, c)| c.to_record().with_context(|| format!("record #{}", i)))
        .collect()
}
