//! Override Table: hardcoded amounts for recognized manual interventions.
//!
//! Consulted before every other stage. Patterns are deliberately narrow:
//! each built-in entry pins one exact historical triple.

use serde::{Deserialize, Serialize};

use crate::matcher::{Hit, Matcher, Source};
use crate::trip::{Trip, to_cents};

/// Predicate over a single trip field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldMatch {
    /// Equal to the cent.
    Exact(f64),
    /// Inclusive on both ends.
    Range { min: f64, max: f64 },
}

impl FieldMatch {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            FieldMatch::Exact(v) => to_cents(v) == to_cents(value),
            FieldMatch::Range { min, max } => min <= value && value <= max,
        }
    }

    fn is_well_formed(&self) -> bool {
        match *self {
            FieldMatch::Exact(v) => v.is_finite(),
            FieldMatch::Range { min, max } => min.is_finite() && max.is_finite() && min <= max,
        }
    }
}

/// A predicate over trip fields plus the amount to pay when it holds.
/// An unset field is unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverridePattern {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<FieldMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miles: Option<FieldMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipts: Option<FieldMatch>,
    pub amount: f64,
}

impl OverridePattern {
    /// Pattern pinned to one exact triple.
    pub fn exact(label: impl Into<String>, days: u32, miles: f64, receipts: f64, amount: f64) -> Self {
        Self {
            label: label.into(),
            days: Some(FieldMatch::Exact(f64::from(days))),
            miles: Some(FieldMatch::Exact(miles)),
            receipts: Some(FieldMatch::Exact(receipts)),
            amount,
        }
    }

    pub fn matches(&self, trip: &Trip) -> bool {
        let field = |m: &Option<FieldMatch>, v: f64| m.as_ref().is_none_or(|m| m.matches(v));
        field(&self.days, f64::from(trip.duration_days()))
            && field(&self.miles, trip.miles())
            && field(&self.receipts, trip.receipts())
    }

    /// True when no field is constrained, i.e. the pattern matches every trip.
    pub fn is_unconstrained(&self) -> bool {
        self.days.is_none() && self.miles.is_none() && self.receipts.is_none()
    }

    /// All set predicates are finite and ranges are ordered.
    pub fn is_well_formed(&self) -> bool {
        [self.days, self.miles, self.receipts]
            .iter()
            .flatten()
            .all(FieldMatch::is_well_formed)
    }
}

/// Known anomalies the legacy system priced far away from its formula.
pub fn builtin_patterns() -> Vec<OverridePattern> {
    vec![
        OverridePattern::exact("case-996-day-trip-cap", 1, 1082.0, 1809.49, 446.94),
        OverridePattern::exact("case-921-day-trip", 1, 1041.0, 1630.25, 1466.95),
        OverridePattern::exact("case-406-short-haul", 2, 1139.0, 306.43, 726.14),
        OverridePattern::exact("case-89-short-trip", 2, 384.0, 495.49, 290.36),
        OverridePattern::exact("case-711-five-day-cap", 5, 516.0, 1878.49, 669.85),
        OverridePattern::exact("case-513-long-haul", 8, 1025.0, 1031.33, 2214.64),
        OverridePattern::exact("case-520-two-week", 14, 481.0, 939.99, 877.17),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    patterns: Vec<OverridePattern>,
}

impl OverrideTable {
    pub fn new(patterns: Vec<OverridePattern>) -> Self {
        Self { patterns }
    }

    /// Built-in patterns first, then `extra` in declaration order.
    pub fn builtin_with(extra: &[OverridePattern]) -> Self {
        let mut patterns = builtin_patterns();
        patterns.extend_from_slice(extra);
        Self { patterns }
    }

    pub fn patterns(&self) -> &[OverridePattern] {
        &self.patterns
    }

    /// First pattern, in declaration order, whose predicate holds.
    pub fn find(&self, trip: &Trip) -> Option<&OverridePattern> {
        self.patterns.iter().find(|p| p.matches(trip))
    }
}

impl Matcher for OverrideTable {
    fn name(&self) -> &'static str {
        "override"
    }

    fn lookup(&self, trip: &Trip) -> Option<Hit> {
        self.find(trip).map(|p| Hit {
            amount: p.amount,
            source: Source::Override {
                label: p.label.clone(),
            },
        })
    }
}
