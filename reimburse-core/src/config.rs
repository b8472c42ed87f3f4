//! Engine configuration: one immutable value built at startup and handed to
//! `Resolver::new`.

use serde::{Deserialize, Serialize};

use crate::fuzzy::FuzzyConfig;
use crate::overrides::OverridePattern;
use crate::rules::FormulaConfig;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be a non-negative finite number, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("fuzzy.k must be at least 1")]
    ZeroNeighbors,

    #[error("override {label:?} constrains no field and would match every trip")]
    BroadOverride { label: String },

    #[error("override {label:?} has a non-finite value or an inverted range")]
    MalformedOverride { label: String },

    #[error("override {label:?} amount must be a non-negative finite number")]
    OverrideAmount { label: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub formula: FormulaConfig,
    pub fuzzy: FuzzyConfig,
    /// Appended after the built-in override patterns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverridePattern>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.formula;
        non_negative("formula.day_rate", f.day_rate)?;
        non_negative("formula.mile_rate", f.mile_rate)?;
        non_negative("formula.receipt_rate", f.receipt_rate)?;
        non_negative("formula.minimum_per_day", f.minimum_per_day)?;

        let z = &self.fuzzy;
        non_negative("fuzzy.days_weight", z.days_weight)?;
        positive("fuzzy.miles_scale", z.miles_scale)?;
        positive("fuzzy.receipts_scale", z.receipts_scale)?;
        non_negative("fuzzy.max_distance", z.max_distance)?;
        if z.k == 0 {
            return Err(ConfigError::ZeroNeighbors);
        }

        for p in &self.overrides {
            if p.is_unconstrained() {
                return Err(ConfigError::BroadOverride { label: p.label.clone() });
            }
            if !p.is_well_formed() {
                return Err(ConfigError::MalformedOverride { label: p.label.clone() });
            }
            if !p.amount.is_finite() || p.amount < 0.0 {
                return Err(ConfigError::OverrideAmount { label: p.label.clone() });
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::FuzzyPolicy;
    use crate::overrides::FieldMatch;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: EngineConfig = toml::from_str(
            r#"
[fuzzy]
k = 3
policy = "mean"
"#,
        )
        .unwrap();
        assert_eq!(cfg.fuzzy.k, 3);
        assert_eq!(cfg.fuzzy.policy, FuzzyPolicy::Mean);
        assert_eq!(cfg.fuzzy.miles_scale, 100.0);
        assert_eq!(cfg.formula, FormulaConfig::default());
        assert!(cfg.overrides.is_empty());
    }

    #[test]
    fn test_rejects_broad_override() {
        let mut cfg = EngineConfig::default();
        cfg.overrides.push(OverridePattern {
            label: "all".to_string(),
            days: None,
            miles: None,
            receipts: None,
            amount: 100.0,
        });
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::BroadOverride { label: "all".to_string() })
        );
    }

    #[test]
    fn test_rejects_inverted_range_and_bad_amount() {
        let mut cfg = EngineConfig::default();
        cfg.overrides.push(OverridePattern {
            label: "inverted".to_string(),
            days: Some(FieldMatch::Range { min: 5.0, max: 2.0 }),
            miles: None,
            receipts: None,
            amount: 100.0,
        });
        assert!(matches!(cfg.validate(), Err(ConfigError::MalformedOverride { .. })));

        let mut cfg = EngineConfig::default();
        cfg.overrides.push(OverridePattern::exact("neg", 1, 1.0, 1.0, -5.0));
        assert!(matches!(cfg.validate(), Err(ConfigError::OverrideAmount { .. })));
    }

    #[test]
    fn test_rejects_bad_fuzzy_settings() {
        let mut cfg = EngineConfig::default();
        cfg.fuzzy.miles_scale = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NotPositive { field: "fuzzy.miles_scale", .. })
        ));

        let mut cfg = EngineConfig::default();
        cfg.fuzzy.k = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroNeighbors));
    }

    #[test]
    fn test_rejects_negative_minimum() {
        let mut cfg = EngineConfig::default();
        cfg.formula.minimum_per_day = -1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Negative { .. })));
    }
}
