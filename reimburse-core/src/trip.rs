//! Trip and historical record types.
//!
//! A `Trip` can only be built through `Trip::new` or `Trip::parse`, so every
//! value that reaches the resolver is already in-domain.

use serde::Serialize;
use std::fmt;

/// Input validation failure. Never reaches the resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TripError {
    #[error("{field} must be a number, got {value:?}")]
    NonNumeric { field: &'static str, value: String },

    #[error("duration_days must be a whole number of days, got {0:?}")]
    FractionalDuration(String),

    #[error("duration_days must be at least 1")]
    ZeroDuration,

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be at most {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        max: f64,
    },
}

/// Largest accepted miles or receipts value.
pub const MAX_TRIP_VALUE: f64 = 1e12;

/// The (duration, miles, receipts) triple to be priced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trip {
    duration_days: u32,
    miles: f64,
    receipts: f64,
}

impl Trip {
    pub fn new(duration_days: u32, miles: f64, receipts: f64) -> Result<Self, TripError> {
        if duration_days == 0 {
            return Err(TripError::ZeroDuration);
        }
        check_amount("miles", miles)?;
        check_amount("receipts", receipts)?;
        Ok(Self {
            duration_days,
            miles,
            receipts,
        })
    }

    /// Parse the three raw CLI arguments.
    pub fn parse(days: &str, miles: &str, receipts: &str) -> Result<Self, TripError> {
        let duration_days = parse_days(days)?;
        let miles = parse_number("miles", miles)?;
        let receipts = parse_number("receipts", receipts)?;
        Self::new(duration_days, miles, receipts)
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    pub fn miles(&self) -> f64 {
        self.miles
    }

    pub fn receipts(&self) -> f64 {
        self.receipts
    }

    /// Miles per day of travel.
    pub fn efficiency(&self) -> f64 {
        self.miles / f64::from(self.duration_days)
    }

    /// Cent-level identity used by the exact matcher and override patterns.
    pub fn key(&self) -> TripKey {
        TripKey {
            duration_days: self.duration_days,
            miles_cents: to_cents(self.miles),
            receipts_cents: to_cents(self.receipts),
        }
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d, {}mi, ${:.2}",
            self.duration_days, self.miles, self.receipts
        )
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), TripError> {
    if !value.is_finite() {
        return Err(TripError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(TripError::Negative { field, value });
    }
    if value > MAX_TRIP_VALUE {
        return Err(TripError::OutOfRange {
            field,
            value,
            max: MAX_TRIP_VALUE,
        });
    }
    Ok(())
}

fn parse_days(raw: &str) -> Result<u32, TripError> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i64>() {
        if n < 0 {
            return Err(TripError::Negative {
                field: "duration_days",
                value: n as f64,
            });
        }
        return u32::try_from(n).map_err(|_| TripError::NonNumeric {
            field: "duration_days",
            value: raw.to_string(),
        });
    }
    // "2.5" is a number, just not a valid duration.
    match s.parse::<f64>() {
        Ok(_) => Err(TripError::FractionalDuration(raw.to_string())),
        Err(_) => Err(TripError::NonNumeric {
            field: "duration_days",
            value: raw.to_string(),
        }),
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, TripError> {
    raw.trim().parse::<f64>().map_err(|_| TripError::NonNumeric {
        field,
        value: raw.to_string(),
    })
}

/// Composite key: days exactly, miles and receipts to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TripKey {
    pub duration_days: u32,
    pub miles_cents: i64,
    pub receipts_cents: i64,
}

impl fmt::Display for TripKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d / {:.2}mi / ${:.2}",
            self.duration_days,
            self.miles_cents as f64 / 100.0,
            self.receipts_cents as f64 / 100.0
        )
    }
}

/// A trip with the amount the legacy system actually paid for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalRecord {
    pub trip: Trip,
    pub observed_amount: f64,
}

impl HistoricalRecord {
    pub fn new(trip: Trip, observed_amount: f64) -> Self {
        Self {
            trip,
            observed_amount,
        }
    }
}

/// Convert a currency value to integer cents, half away from zero.
pub fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Round to the currency's minor unit, half away from zero.
///
/// Amounts too large to scale by 100 are already beyond cent precision and
/// come back unchanged.
pub fn round_cents(amount: f64) -> f64 {
    let scaled = amount * 100.0;
    if !scaled.is_finite() {
        return amount;
    }
    scaled.round() / 100.0
}
