//! Resolver: runs the stages in trust order and returns the first answer.
//!
//! Override → Exact → Fuzzy → Business rules. The business rules are total,
//! so `resolve` always produces an amount for a valid trip.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigError, EngineConfig};
use crate::exact::ExactMatcher;
use crate::fuzzy::FuzzyMatcher;
use crate::matcher::{Matcher, Source};
use crate::overrides::OverrideTable;
use crate::reference::ReferenceTable;
use crate::rules::BusinessRules;
use crate::trip::{Trip, round_cents};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub amount: f64,
    pub source: Source,
}

impl Resolution {
    pub fn stage(&self) -> &'static str {
        self.source.stage()
    }
}

/// Immutable after construction; share it freely across threads.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<ReferenceTable>,
    overrides: OverrideTable,
    exact: ExactMatcher,
    fuzzy: FuzzyMatcher,
    rules: BusinessRules,
}

impl Resolver {
    pub fn new(table: ReferenceTable, config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(table, config))
    }

    /// Default configuration; cannot fail.
    pub fn with_defaults(table: ReferenceTable) -> Self {
        Self::build(table, &EngineConfig::default())
    }

    fn build(table: ReferenceTable, config: &EngineConfig) -> Self {
        let table = Arc::new(table);
        Self {
            overrides: OverrideTable::builtin_with(&config.overrides),
            exact: ExactMatcher::new(Arc::clone(&table)),
            fuzzy: FuzzyMatcher::new(Arc::clone(&table), config.fuzzy.clone()),
            rules: BusinessRules::new(config.formula),
            table,
        }
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn fuzzy(&self) -> &FuzzyMatcher {
        &self.fuzzy
    }

    pub fn rules(&self) -> &BusinessRules {
        &self.rules
    }

    pub fn resolve(&self, trip: &Trip) -> f64 {
        self.resolve_detailed(trip).amount
    }

    pub fn resolve_detailed(&self, trip: &Trip) -> Resolution {
        let stages: [&dyn Matcher; 3] = [&self.overrides, &self.exact, &self.fuzzy];
        for stage in stages {
            if let Some(hit) = stage.lookup(trip) {
                debug!("{}: resolved by {} stage ({:.2})", trip, stage.name(), hit.amount);
                return Resolution {
                    amount: round_cents(hit.amount),
                    source: hit.source,
                };
            }
        }

        let breakdown = self.rules.breakdown(trip);
        debug!(
            "{}: no table match, formula base {:.2} with {} tier(s) -> {:.2}",
            trip,
            breakdown.base,
            breakdown.tiers.len(),
            breakdown.amount
        );
        Resolution {
            amount: breakdown.amount,
            source: Source::Formula(breakdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::HistoricalRecord;

    fn rec(d: u32, m: f64, r: f64, a: f64) -> HistoricalRecord {
        HistoricalRecord::new(Trip::new(d, m, r).unwrap(), a)
    }

    fn resolver() -> Resolver {
        Resolver::with_defaults(ReferenceTable::new(vec![
            rec(3, 93.0, 1.42, 364.51),
            rec(1, 55.0, 3.6, 126.06),
            // Same triple as a built-in override, different amount.
            rec(1, 1082.0, 1809.49, 999.99),
        ]))
    }

    #[test]
    fn test_override_beats_history() {
        let r = resolver().resolve_detailed(&Trip::new(1, 1082.0, 1809.49).unwrap());
        assert_eq!(r.amount, 446.94);
        assert_eq!(r.stage(), "override");
    }

    #[test]
    fn test_exact_match_returns_record_amount() {
        let r = resolver().resolve_detailed(&Trip::new(3, 93.0, 1.42).unwrap());
        assert_eq!(r.amount, 364.51);
        assert_eq!(r.source, Source::Exact { index: 0 });
        // The formula alone disagrees.
        let formula = resolver().rules().evaluate(&Trip::new(3, 93.0, 1.42).unwrap());
        assert_ne!(formula, 364.51);
    }

    #[test]
    fn test_fuzzy_then_formula() {
        let res = resolver();
        let near = res.resolve_detailed(&Trip::new(1, 60.0, 5.0).unwrap());
        assert_eq!(near.stage(), "fuzzy");
        assert_eq!(near.amount, 126.06);

        let far = res.resolve_detailed(&Trip::new(3, 150.0, 200.0).unwrap());
        assert_eq!(far.stage(), "formula");
        assert_eq!(far.amount, 352.21);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = EngineConfig::default();
        cfg.fuzzy.k = 0;
        assert!(Resolver::new(ReferenceTable::empty(), &cfg).is_err());
    }

    #[test]
    fn test_defaults_match_default_config() {
        let table = || ReferenceTable::new(vec![rec(1, 55.0, 3.6, 126.06)]);
        let a = Resolver::with_defaults(table());
        let b = Resolver::new(table(), &EngineConfig::default()).unwrap();
        assert_eq!(a.fuzzy().config(), b.fuzzy().config());
        assert_eq!(a.rules().config(), b.rules().config());
        assert_eq!(a.overrides().patterns(), b.overrides().patterns());
        for trip in [
            Trip::new(1, 55.0, 3.6).unwrap(),
            Trip::new(1, 60.0, 5.0).unwrap(),
            Trip::new(1, 1082.0, 1809.49).unwrap(),
            Trip::new(7, 1200.0, 900.0).unwrap(),
        ] {
            assert_eq!(a.resolve_detailed(&trip), b.resolve_detailed(&trip));
        }
    }

    #[test]
    fn test_resolver_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Resolver>();
    }
}
