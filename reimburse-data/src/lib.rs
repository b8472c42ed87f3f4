//! reimburse-data: reference dataset ingestion (JSON/CSV) and integrity audit.

pub mod audit;
pub mod parsers;
pub mod types;

pub use audit::{AuditReport, OverrideCandidate, audit_table};
pub use parsers::{load_cases, load_reference_table};
pub use types::Case;
