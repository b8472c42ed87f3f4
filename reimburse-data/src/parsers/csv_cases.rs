//! CSV datasets with a header row:
//!
//!   duration_days,miles,receipts,expected_amount
//!   3,93,1.42,364.51

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::types::Case;

pub fn parse_csv_cases(path: impl AsRef<Path>) -> Result<Vec<Case>> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    read_cases(rdr).with_context(|| format!("parsing {}", path.as_ref().display()))
}

pub fn parse_csv_cases_reader(reader: impl Read) -> Result<Vec<Case>> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    read_cases(rdr)
}

fn read_cases<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Case>> {
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<Case>().enumerate() {
        // Row numbers are 1-based after the header, like a spreadsheet.
        out.push(row.with_context(|| format!("row {}", i + 2))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_rows() {
        let data = "duration_days,miles,receipts,expected_amount\n\
                    3, 93, 1.42, 364.51\n\
                    14,481,939.99,877.17\n";
        let cases = parse_csv_cases_reader(data.as_bytes()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].miles, 93.0);
        assert_eq!(cases[1].expected_amount, 877.17);
    }

    #[test]
    fn test_bad_row_is_reported() {
        let data = "duration_days,miles,receipts,expected_amount\n\
                    3,93,1.42,364.51\n\
                    3,lots,1.42,364.51\n";
        let err = parse_csv_cases_reader(data.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("row 3"));
    }
}
