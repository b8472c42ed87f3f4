//! Business Rule Evaluator: base formula plus ordered correction tiers.
//!
//! The legacy calculator is an original per-diem/mileage/receipts formula
//! with decades of patches layered on top. Each patch is a `CorrectionTier`
//! and they are applied in a fixed order:
//!
//! 1. base: `days * day_rate + miles * mile_rate + sqrt(receipts) * receipt_rate`
//! 2. duration tier (additive, by exact trip length)
//! 3. receipt tier (additive, by receipt bucket)
//! 4. efficiency tier (additive, by miles per day)
//! 5. special cases (multiplicative nudges or flags)
//! 6. minimum guarantee (`days * minimum_per_day`)
//! 7. round to cents
//!
//! Order matters: the multiplicative special cases act on the amount after
//! the additive tiers, not on the raw base.

use serde::{Deserialize, Serialize};

use crate::trip::{Trip, round_cents};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaConfig {
    pub day_rate: f64,
    pub mile_rate: f64,
    pub receipt_rate: f64,
    pub minimum_per_day: f64,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            day_rate: 75.0,
            mile_rate: 0.35,
            receipt_rate: 12.0,
            minimum_per_day: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Duration,
    Receipts,
    Efficiency,
    SpecialCase,
    Minimum,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Duration => "duration",
            Stage::Receipts => "receipts",
            Stage::Efficiency => "efficiency",
            Stage::SpecialCase => "special",
            Stage::Minimum => "minimum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Add(f64),
    Scale(f64),
    /// Raise the amount to at least this value.
    Floor(f64),
    /// Recognized pattern; recorded in the trace, amount unchanged.
    Flag,
}

impl Adjustment {
    pub fn apply(self, amount: f64) -> f64 {
        match self {
            Adjustment::Add(v) => amount + v,
            Adjustment::Scale(f) => amount * f,
            Adjustment::Floor(min) => amount.max(min),
            Adjustment::Flag => amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrectionTier {
    pub name: &'static str,
    pub stage: Stage,
    pub adjustment: Adjustment,
}

impl CorrectionTier {
    const fn new(name: &'static str, stage: Stage, adjustment: Adjustment) -> Self {
        Self {
            name,
            stage,
            adjustment,
        }
    }
}

/// A tier together with the running amount around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppliedTier {
    pub tier: CorrectionTier,
    pub before: f64,
    pub after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub base: f64,
    pub tiers: Vec<AppliedTier>,
    /// Amount before rounding.
    pub raw: f64,
    pub amount: f64,
}

impl Breakdown {
    pub fn tier(&self, stage: Stage) -> Option<&AppliedTier> {
        self.tiers.iter().find(|t| t.tier.stage == stage)
    }
}

// (days, name, adjustment)
const DURATION_TIERS: [(u32, &str, f64); 14] = [
    (1, "one-day-boost", 45.0),
    (2, "two-day-undervalued", 25.0),
    (3, "three-day-sweet-spot", 85.0),
    (4, "four-day-efficiency", 115.0),
    (5, "five-day-standard", 65.0),
    (6, "six-day-boost", 95.0),
    (7, "week-long-bonus", 105.0),
    (8, "long-trip-adjustment", 50.0),
    (9, "nine-day-penalty", -15.0),
    (10, "ten-day-penalty", -50.0),
    (11, "eleven-day-penalty", -70.0),
    (12, "twelve-day-penalty", -120.0),
    (13, "thirteen-day-penalty", -135.0),
    (14, "two-week-penalty", -200.0),
];

const EXTENDED_TRIP_DAILY_PENALTY: f64 = 15.0;

// [lo, hi) receipt buckets
const RECEIPT_TIERS: [(f64, f64, &str, f64); 8] = [
    (0.0, 250.0, "low-receipts", -180.0),
    (250.0, 500.0, "medium-low-receipts", -120.0),
    (500.0, 750.0, "medium-receipts", -60.0),
    (750.0, 1000.0, "medium-high-receipts", -20.0),
    (1000.0, 1250.0, "high-receipts", 160.0),
    (1250.0, 1500.0, "very-high-receipts", 140.0),
    (1500.0, 1750.0, "extreme-receipts", 100.0),
    (1750.0, 2000.0, "maximum-receipts", 80.0),
];

// [lo, hi) miles per day
const EFFICIENCY_TIERS: [(f64, f64, &str, f64); 3] = [
    (150.0, 200.0, "good-efficiency", 30.0),
    (200.0, 250.0, "excellent-efficiency", 45.0),
    (250.0, 300.0, "high-efficiency", 25.0),
];

/// Additive correction for trip length. Every valid duration gets one.
pub fn duration_adjustment(days: u32) -> CorrectionTier {
    if let Some(&(_, name, v)) = DURATION_TIERS.iter().find(|(d, _, _)| *d == days) {
        return CorrectionTier::new(name, Stage::Duration, Adjustment::Add(v));
    }
    // Past two weeks the penalty keeps growing linearly.
    let (_, _, last) = DURATION_TIERS[DURATION_TIERS.len() - 1];
    let extra = f64::from(days.saturating_sub(14)) * EXTENDED_TRIP_DAILY_PENALTY;
    CorrectionTier::new("extended-trip-penalty", Stage::Duration, Adjustment::Add(last - extra))
}

/// Additive correction by receipt bucket. None at or above 2000.
pub fn receipt_adjustment(receipts: f64) -> Option<CorrectionTier> {
    RECEIPT_TIERS
        .iter()
        .find(|(lo, hi, _, _)| *lo <= receipts && receipts < *hi)
        .map(|&(_, _, name, v)| CorrectionTier::new(name, Stage::Receipts, Adjustment::Add(v)))
}

/// Bonus for the miles-per-day sweet spot.
pub fn efficiency_adjustment(efficiency: f64) -> Option<CorrectionTier> {
    EFFICIENCY_TIERS
        .iter()
        .find(|(lo, hi, _, _)| *lo <= efficiency && efficiency < *hi)
        .map(|&(_, _, name, v)| CorrectionTier::new(name, Stage::Efficiency, Adjustment::Add(v)))
}

/// Edge patterns recognized by the legacy system, in application order.
///
/// Each matching pattern contributes one tier. A long day trip takes the
/// executive reduction for every pattern it matches, so a one-day trip over
/// 800 miles with more than $2000 in receipts is reduced twice.
pub fn special_cases(trip: &Trip) -> Vec<CorrectionTier> {
    let (d, m, r) = (trip.duration_days(), trip.miles(), trip.receipts());
    let long_day_trip = d == 1 && m > 800.0;
    let mut out = Vec::new();

    if long_day_trip && r > 1500.0 {
        out.push(CorrectionTier::new(
            "executive-day-trip",
            Stage::SpecialCase,
            Adjustment::Scale(0.75),
        ));
    }
    if d >= 8 && m > 600.0 && r < 500.0 {
        out.push(CorrectionTier::new(
            "long-haul-low-receipts",
            Stage::SpecialCase,
            Adjustment::Flag,
        ));
    }
    if r > 2000.0 && d <= 5 {
        out.push(if long_day_trip {
            CorrectionTier::new(
                "high-receipt-day-trip",
                Stage::SpecialCase,
                Adjustment::Scale(0.75),
            )
        } else {
            CorrectionTier::new(
                "high-receipt-short-trip",
                Stage::SpecialCase,
                Adjustment::Scale(0.85),
            )
        });
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessRules {
    config: FormulaConfig,
}

impl BusinessRules {
    pub fn new(config: FormulaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormulaConfig {
        &self.config
    }

    /// Uncorrected base estimate.
    pub fn base(&self, trip: &Trip) -> f64 {
        let c = &self.config;
        f64::from(trip.duration_days()) * c.day_rate
            + trip.miles() * c.mile_rate
            + trip.receipts().sqrt() * c.receipt_rate
    }

    pub fn minimum(&self, trip: &Trip) -> f64 {
        (f64::from(trip.duration_days()) * self.config.minimum_per_day).max(0.0)
    }

    pub fn breakdown(&self, trip: &Trip) -> Breakdown {
        let base = self.base(trip);

        let mut plan: Vec<CorrectionTier> = Vec::with_capacity(6);
        plan.push(duration_adjustment(trip.duration_days()));
        plan.extend(receipt_adjustment(trip.receipts()));
        plan.extend(efficiency_adjustment(trip.efficiency()));
        plan.extend(special_cases(trip));

        let mut amount = base;
        let mut tiers = Vec::with_capacity(plan.len() + 1);
        for tier in plan {
            let before = amount;
            amount = tier.adjustment.apply(amount);
            tiers.push(AppliedTier { tier, before, after: amount });
        }

        let floor = self.minimum(trip);
        if amount < floor {
            let tier = CorrectionTier::new("minimum-guarantee", Stage::Minimum, Adjustment::Floor(floor));
            tiers.push(AppliedTier {
                tier,
                before: amount,
                after: floor,
            });
            amount = floor;
        }

        Breakdown {
            base,
            tiers,
            raw: amount,
            amount: round_cents(amount),
        }
    }

    /// Total: every valid trip gets a finite, non-negative amount.
    pub fn evaluate(&self, trip: &Trip) -> f64 {
        self.breakdown(trip).amount
    }
}
