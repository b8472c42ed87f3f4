use anyhow::{Result, bail};
use reimburse_core::{HistoricalRecord, Trip};
use serde::{Deserialize, Serialize};

/// Normalized output of the dataset parsers (format-agnostic).
///
/// Values are kept as read; `to_record` does the domain validation so that
/// errors can name the offending record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub duration_days: f64,
    pub miles: f64,
    pub receipts: f64,
    pub expected_amount: f64,
}

impl Case {
    pub fn to_record(&self) -> Result<HistoricalRecord> {
        let d = self.duration_days;
        if !d.is_finite() || d.fract() != 0.0 {
            bail!("duration_days must be a whole number, got {}", d);
        }
        if d < 0.0 || d > f64::from(u32::MAX) {
            bail!("duration_days out of range: {}", d);
        }
        let trip = Trip::new(d as u32, self.miles, self.receipts)?;

        if !self.expected_amount.is_finite() || self.expected_amount < 0.0 {
            bail!(
                "expected_amount must be a non-negative number, got {}",
                self.expected_amount
            );
        }
        Ok(HistoricalRecord::new(trip, self.expected_amount))
    }
}

/// One JSON record in either accepted shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum JsonCase {
    Flat(Case),
    Legacy {
        input: LegacyInput,
        expected_output: f64,
    },
}

/// Field names used by the original `public_cases.json` export.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LegacyInput {
    trip_duration_days: f64,
    miles_traveled: f64,
    total_receipts_amount: f64,
}

impl From<JsonCase> for Case {
    fn from(c: JsonCase) -> Self {
        match c {
            JsonCase::Flat(case) => case,
            JsonCase::Legacy {
                input,
                expected_output,
            } => Case {
                duration_days: input.trip_duration_days,
                miles: input.miles_traveled,
                receipts: input.total_receipts_amount,
                expected_amount: expected_output,
            },
        }
    }
}
