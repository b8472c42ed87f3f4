//! Human-readable resolution trace for `estimate --explain`.

use reimburse_core::{Adjustment, Resolution, Resolver, Source, Trip};

pub fn render(resolver: &Resolver, trip: &Trip, resolution: &Resolution) -> String {
    let mut out = Vec::new();
    out.push(format!("Input: {}", trip));

    match &resolution.source {
        Source::Override { label } => {
            out.push(format!("Stage: override ({})", label));
        }
        Source::Exact { index } => {
            out.push(format!("Stage: exact (reference record #{})", index));
        }
        Source::Fuzzy {
            neighbors,
            distance,
        } => {
            out.push(format!(
                "Stage: fuzzy ({} neighbor(s) within {:.2}, nearest at {:.3})",
                neighbors.len(),
                resolver.fuzzy().config().max_distance,
                distance
            ));
            for n in neighbors {
                let trip = resolver
                    .table()
                    .get(n.index)
                    .map(|r| r.trip.to_string())
                    .unwrap_or_default();
                out.push(format!(
                    "  #{:<5} {:<28} distance {:.3}  amount {:.2}",
                    n.index, trip, n.distance, n.amount
                ));
            }
        }
        Source::Formula(b) => {
            out.push("Stage: formula".to_string());
            out.push(format!("  {:<12} {:<26} {:>10.2}", "base", "", b.base));
            for t in &b.tiers {
                out.push(format!(
                    "  {:<12} {:<26} {:>10}  -> {:.2}",
                    t.tier.stage.label(),
                    t.tier.name,
                    describe(t.tier.adjustment),
                    t.after
                ));
            }
        }
    }

    out.push(format!("Amount: {:.2}", resolution.amount));
    out.join("\n")
}

fn describe(adj: Adjustment) -> String {
    match adj {
        Adjustment::Add(v) => format!("{:+.2}", v),
        Adjustment::Scale(f) => format!("x{:.2}", f),
        Adjustment::Floor(v) => format!(">= {:.2}", v),
        Adjustment::Flag => "flag".to_string(),
    }
}
