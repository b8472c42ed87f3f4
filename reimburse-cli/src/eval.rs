//! Evaluation harness: resolve every case of a dataset and score the errors.

use reimburse_core::{HistoricalRecord, Resolver};

/// |error| below this counts as an exact hit.
const EXACT_TOLERANCE: f64 = 0.01;
/// |error| below this counts as a close hit.
const CLOSE_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EvalRow {
    /// Position in the evaluated dataset.
    pub index: usize,
    pub record: HistoricalRecord,
    pub predicted: f64,
    pub stage: &'static str,
    pub error: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvalReport {
    pub cases: usize,
    pub exact: usize,
    pub close: usize,
    /// Sum of absolute errors.
    pub score: f64,
    pub average_error: f64,
    /// Worst first, truncated to the requested size.
    pub worst: Vec<EvalRow>,
}

impl EvalReport {
    pub fn max_error(&self) -> f64 {
        self.worst.first().map(|r| r.error).unwrap_or(0.0)
    }
}

pub fn evaluate(
    resolver: &Resolver,
    records: &[HistoricalRecord],
    formula_only: bool,
    top: usize,
) -> EvalReport {
    let mut rows: Vec<EvalRow> = records
        .iter()
        .enumerate()
        .map(|(index, rec)| {
            let (predicted, stage) = if formula_only {
                (resolver.rules().evaluate(&rec.trip), "formula")
            } else {
                let r = resolver.resolve_detailed(&rec.trip);
                (r.amount, r.stage())
            };
            EvalRow {
                index,
                record: *rec,
                predicted,
                stage,
                error: (predicted - rec.observed_amount).abs(),
            }
        })
        .collect();

    let cases = rows.len();
    let score: f64 = rows.iter().map(|r| r.error).sum();
    let exact = rows.iter().filter(|r| r.error < EXACT_TOLERANCE).count();
    let close = rows.iter().filter(|r| r.error < CLOSE_TOLERANCE).count();

    rows.sort_by(|a, b| b.error.total_cmp(&a.error).then_with(|| a.index.cmp(&b.index)));
    rows.truncate(top.max(1));

    EvalReport {
        cases,
        exact,
        close,
        score,
        average_error: if cases == 0 { 0.0 } else { score / cases as f64 },
        worst: rows,
    }
}

pub fn print_report(report: &EvalReport, formula_only: bool) {
    let pct = |n: usize| {
        if report.cases == 0 {
            0.0
        } else {
            n as f64 * 100.0 / report.cases as f64
        }
    };

    println!(
        "Evaluation{} over {} cases",
        if formula_only { " (formula only)" } else { "" },
        report.cases
    );
    println!("  Exact matches (±$0.01): {} ({:.1}%)", report.exact, pct(report.exact));
    println!("  Close matches (±$1.00): {} ({:.1}%)", report.close, pct(report.close));
    println!("  Average error: ${:.2}", report.average_error);
    match report.worst.first() {
        Some(r) if r.error > 0.0 => println!(
            "  Max error: ${:.2} (case #{}: {})",
            r.error, r.index, r.record.trip
        ),
        _ => println!("  Max error: ${:.2}", report.max_error()),
    }
    println!("  Score (total error): {:.2}", report.score);

    if report.worst.iter().any(|r| r.error > 0.0) {
        println!("\nWorst cases:");
        for r in report.worst.iter().filter(|r| r.error > 0.0) {
            println!(
                "  #{:<5} {:<28} expected {:>9.2}  got {:>9.2}  error {:>8.2}  [{}]",
                r.index,
                r.record.trip.to_string(),
                r.record.observed_amount,
                r.predicted,
                r.error,
                r.stage
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reimburse_core::{ReferenceTable, Trip};

    fn rec(d: u32, m: f64, r: f64, a: f64) -> HistoricalRecord {
        HistoricalRecord::new(Trip::new(d, m, r).unwrap(), a)
    }

    #[test]
    fn test_lookup_stages_make_known_cases_exact() {
        let records = vec![rec(3, 93.0, 1.42, 364.51), rec(1, 55.0, 3.6, 126.06)];
        let resolver = Resolver::with_defaults(ReferenceTable::new(records.clone()));
        let report = evaluate(&resolver, &records, false, 5);
        assert_eq!(report.cases, 2);
        assert_eq!(report.exact, 2);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.max_error(), 0.0);
    }

    #[test]
    fn test_formula_only_scores_formula() {
        // Formula gives exactly 352.21 for this trip.
        let records = vec![rec(3, 150.0, 200.0, 352.21), rec(3, 150.0, 200.0, 362.21)];
        let resolver = Resolver::with_defaults(ReferenceTable::empty());
        let report = evaluate(&resolver, &records, true, 1);
        assert_eq!(report.exact, 1);
        assert_eq!(report.close, 1);
        assert_eq!(report.worst.len(), 1);
        assert_eq!(report.worst[0].index, 1);
        assert!((report.max_error() - 10.0).abs() < 1e-9);
        assert!((report.average_error - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_dataset() {
        let resolver = Resolver::with_defaults(ReferenceTable::empty());
        let report = evaluate(&resolver, &[], false, 10);
        assert_eq!(report.cases, 0);
        assert_eq!(report.average_error, 0.0);
    }
}
