//! reimburse-core: layered resolution engine for legacy travel reimbursements

pub mod config;
pub mod exact;
pub mod fuzzy;
pub mod matcher;
pub mod overrides;
pub mod reference;
pub mod resolver;
pub mod rules;
pub mod trip;

pub use config::{ConfigError, EngineConfig};
pub use exact::ExactMatcher;
pub use fuzzy::{FuzzyConfig, FuzzyMatcher, FuzzyPolicy, Neighbor};
pub use matcher::{Hit, Matcher, Source};
pub use overrides::{FieldMatch, OverridePattern, OverrideTable, builtin_patterns};
pub use reference::{DuplicateConflict, ReferenceTable};
pub use resolver::{Resolution, Resolver};
pub use rules::{
    Adjustment, AppliedTier, Breakdown, BusinessRules, CorrectionTier, FormulaConfig, Stage,
    duration_adjustment, efficiency_adjustment, receipt_adjustment, special_cases,
};
pub use trip::{
    HistoricalRecord, MAX_TRIP_VALUE, Trip, TripError, TripKey, round_cents, to_cents,
};
