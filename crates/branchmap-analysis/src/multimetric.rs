use serde::Serialize;

use crate::dataset::{Bounds, Dataset};
use crate::market::{bank_counts, percentage};
use crate::proximity::IntensityReport;
use crate::regions::in_baku;

const COMPARED_BANKS: usize = 5;

pub const METRIC_LABELS: [&str; 4] = ["Branch count", "Geographic spread", "Baku focus", "Competitive intensity"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub branches: f64,
    pub spread: f64,
    pub baku_pct: f64,
    pub avg_intensity: f64,
}

impl Metrics {
    pub fn values(&self) -> [f64; 4] {
        [self.branches, self.spread, self.baku_pct, self.avg_intensity]
    }

    fn from_values([branches, spread, baku_pct, avg_intensity]: [f64; 4]) -> Self {
        Self {
            branches,
            spread,
            baku_pct,
            avg_intensity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankMetrics {
    pub bank: String,
    pub raw: Metrics,
    /// Each metric as a percentage of the largest value in its column.
    pub normalized: Metrics,
}

/// The five largest banks, with the focus bank replacing the fifth when it
/// is not among them.
pub fn compared_banks(dataset: &Dataset, focus_bank: &str) -> Vec<String> {
    let counts = bank_counts(dataset.branches());
    let mut banks = counts
        .iter()
        .take(COMPARED_BANKS)
        .map(|count| count.bank.clone())
        .collect::<Vec<_>>();
    let has_focus = counts.iter().any(|count| count.bank == focus_bank);
    if has_focus && !banks.iter().any(|bank| bank == focus_bank) {
        banks.truncate(COMPARED_BANKS - 1);
        banks.push(focus_bank.to_owned());
    }
    banks
}

pub fn multimetric(dataset: &Dataset, focus_bank: &str, intensity: &IntensityReport) -> Vec<BankMetrics> {
    let raw = compared_banks(dataset, focus_bank)
        .into_iter()
        .map(|bank| {
            let branches = dataset.of_bank(&bank).collect::<Vec<_>>();
            let spread = Bounds::of(branches.iter().map(|branch| &branch.location))
                .map_or(0.0, |bounds| bounds.spread());
            let in_city = branches.iter().filter(|branch| in_baku(&branch.location)).count();
            let metrics = Metrics {
                branches: branches.len() as f64,
                spread,
                baku_pct: percentage(in_city, branches.len()),
                avg_intensity: intensity.of_bank(&bank).map_or(0.0, |entry| entry.average),
            };
            (bank, metrics)
        })
        .collect::<Vec<_>>();

    let mut maxima = [0.0_f64; 4];
    for (_, metrics) in &raw {
        for (max, value) in maxima.iter_mut().zip(metrics.values()) {
            *max = f64::max(*max, value);
        }
    }

    raw.into_iter()
        .map(|(bank, metrics)| {
            let mut scaled = metrics.values();
            for (value, max) in scaled.iter_mut().zip(maxima) {
                if max > 0.0 {
                    *value = *value / max * 100.0;
                }
            }
            BankMetrics {
                bank,
                raw: metrics,
                normalized: Metrics::from_values(scaled),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Branch;
    use crate::proximity::competitive_intensity;

    fn bank(name: &str, n: usize, lat: f64) -> Vec<Branch> {
        (0..n).map(|i| Branch::new(name, lat, 45.0 + i as f64)).collect()
    }

    #[test]
    fn focus_replaces_the_fifth_bank() {
        let mut branches = Vec::new();
        for (name, n) in [("A", 9), ("B", 8), ("C", 7), ("D", 6), ("E", 5), ("F", 2)] {
            branches.extend(bank(name, n, 39.5));
        }
        let dataset = Dataset::new(branches);

        assert_eq!(compared_banks(&dataset, "F"), vec!["A", "B", "C", "D", "F"]);
        assert_eq!(compared_banks(&dataset, "B"), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn metrics_are_normalized_to_column_maximum() {
        let mut branches = bank("A", 4, 39.5);
        branches.push(Branch::new("F", 40.4, 49.8));
        branches.push(Branch::new("F", 40.4, 50.8));
        let dataset = Dataset::new(branches);
        let intensity = competitive_intensity(&dataset, 0.1);

        let rows = multimetric(&dataset, "F", &intensity);

        assert_eq!(rows.len(), 2);
        let a = &rows[0];
        assert_eq!(a.bank, "A");
        assert_eq!(a.raw.spread, 3.0);
        assert_eq!(a.normalized.branches, 100.0);
        assert_eq!(a.normalized.spread, 100.0);
        let f = &rows[1];
        assert_eq!(f.raw.baku_pct, 50.0);
        assert_eq!(f.normalized.baku_pct, 100.0);
        assert_eq!(f.normalized.branches, 50.0);
        // No branch has a neighbour, so the intensity column stays at zero.
        assert_eq!(f.normalized.avg_intensity, 0.0);
    }
}
