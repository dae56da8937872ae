//! Baku versus the regions, and the seven named zones of the country.

use std::collections::HashMap;

use branchmap_core::Coordinates;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::market::{bank_counts, percentage};

pub fn in_baku(point: &Coordinates) -> bool {
    (40.3..=40.5).contains(&point.lat) && (49.7..=50.0).contains(&point.lon)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSplit {
    pub bank: String,
    pub baku: usize,
    pub regions: usize,
    pub regional_pct: f64,
}

impl RegionSplit {
    pub fn total(&self) -> usize {
        self.baku + self.regions
    }

    pub fn baku_pct(&self) -> f64 {
        percentage(self.baku, self.total())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalSummary {
    /// Ordered like the market counts, largest bank first.
    pub banks: Vec<RegionSplit>,
    pub industry_regional_pct: f64,
    pub max_regional_branches: usize,
}

impl RegionalSummary {
    pub fn of(dataset: &Dataset) -> Self {
        let mut split: HashMap<&str, (usize, usize)> = HashMap::new();
        for branch in dataset.branches() {
            let entry = split.entry(branch.bank.as_str()).or_default();
            if in_baku(&branch.location) {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }

        let banks = bank_counts(dataset.branches())
            .into_iter()
            .map(|count| {
                let (baku, regions) = split.get(count.bank.as_str()).copied().unwrap_or_default();
                RegionSplit {
                    regional_pct: percentage(regions, count.branches),
                    bank: count.bank,
                    baku,
                    regions,
                }
            })
            .collect::<Vec<_>>();

        let industry_regional_pct = if banks.is_empty() {
            0.0
        } else {
            banks.iter().map(|bank| bank.regional_pct).sum::<f64>() / banks.len() as f64
        };
        let max_regional_branches = banks.iter().map(|bank| bank.regions).max().unwrap_or(0);

        Self {
            banks,
            industry_regional_pct,
            max_regional_branches,
        }
    }

    pub fn bank(&self, name: &str) -> Option<&RegionSplit> {
        self.banks.iter().find(|split| split.bank == name)
    }

    /// Regional branches the focus bank would need to match the best covered bank.
    pub fn regional_gap(&self, name: &str) -> usize {
        let own = self.bank(name).map_or(0, |split| split.regions);
        self.max_regional_branches.saturating_sub(own)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    BakuCity,
    Absheron,
    North,
    Northwest,
    Central,
    South,
    West,
    Other,
}

impl Zone {
    /// Zones reported individually, in display order.
    pub const NAMED: [Zone; 7] = [
        Zone::BakuCity,
        Zone::Absheron,
        Zone::North,
        Zone::Northwest,
        Zone::Central,
        Zone::South,
        Zone::West,
    ];

    pub fn of(point: &Coordinates) -> Self {
        let Coordinates { lat, lon } = *point;
        if in_baku(point) {
            Zone::BakuCity
        } else if (40.2..=40.6).contains(&lat) && (49.5..=50.3).contains(&lon) {
            Zone::Absheron
        } else if lat > 41.0 {
            Zone::North
        } else if lat > 40.5 && lon < 48.5 {
            Zone::Northwest
        } else if (40.0..=40.8).contains(&lat) && (47.0..49.5).contains(&lon) {
            Zone::Central
        } else if lat < 39.0 {
            Zone::South
        } else if lon < 46.0 {
            Zone::West
        } else {
            Zone::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::BakuCity => "Baku City",
            Zone::Absheron => "Absheron",
            Zone::North => "North",
            Zone::Northwest => "Northwest",
            Zone::Central => "Central",
            Zone::South => "South",
            Zone::West => "West",
            Zone::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStat {
    pub zone: Zone,
    pub total: usize,
    pub focus_branches: usize,
    pub focus_share_pct: f64,
    /// `None` when the focus bank has no branch in the zone.
    pub focus_rank: Option<usize>,
    pub leader: String,
    pub leader_branches: usize,
}

/// Per-zone figures for every named zone that has at least one branch.
pub fn zone_stats(dataset: &Dataset, focus_bank: &str) -> Vec<ZoneStat> {
    Zone::NAMED
        .iter()
        .filter_map(|&zone| {
            let counts = bank_counts(
                dataset
                    .branches()
                    .iter()
                    .filter(|branch| Zone::of(&branch.location) == zone),
            );
            let leader = counts.first()?;
            let total = counts.iter().map(|count| count.branches).sum();
            let focus_branches = counts
                .iter()
                .find(|count| count.bank == focus_bank)
                .map_or(0, |count| count.branches);
            let focus_rank = (focus_branches > 0).then(|| {
                counts
                    .iter()
                    .filter(|count| count.branches > focus_branches)
                    .count()
                    + 1
            });

            Some(ZoneStat {
                zone,
                total,
                focus_branches,
                focus_share_pct: percentage(focus_branches, total),
                focus_rank,
                leader: leader.bank.clone(),
                leader_branches: leader.branches,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Branch;

    fn at(lat: f64, lon: f64) -> Coordinates {
        Coordinates { lat, lon }
    }

    #[test]
    fn zones_use_first_match() {
        assert_eq!(Zone::of(&at(40.4, 49.85)), Zone::BakuCity);
        assert_eq!(Zone::of(&at(40.55, 49.95)), Zone::Absheron);
        assert_eq!(Zone::of(&at(41.6, 46.6)), Zone::North);
        assert_eq!(Zone::of(&at(40.7, 46.4)), Zone::Northwest);
        assert_eq!(Zone::of(&at(40.6, 47.1)), Zone::Northwest);
        assert_eq!(Zone::of(&at(40.3, 47.5)), Zone::Central);
        assert_eq!(Zone::of(&at(38.75, 48.85)), Zone::South);
        assert_eq!(Zone::of(&at(39.5, 45.5)), Zone::West);
        assert_eq!(Zone::of(&at(39.8, 48.5)), Zone::Other);
    }

    #[test]
    fn baku_box_is_inclusive() {
        assert!(in_baku(&at(40.3, 49.7)));
        assert!(in_baku(&at(40.5, 50.0)));
        assert!(!in_baku(&at(40.51, 49.8)));
    }

    #[test]
    fn regional_summary_averages_bank_percentages() {
        let dataset = Dataset::new(vec![
            Branch::new("A", 40.4, 49.8),
            Branch::new("A", 40.68, 46.36),
            Branch::new("A", 40.4, 49.9),
            Branch::new("A", 38.75, 48.85),
            Branch::new("B", 40.4, 49.8),
        ]);
        let summary = RegionalSummary::of(&dataset);

        let a = summary.bank("A").expect("A present");
        assert_eq!((a.baku, a.regions), (2, 2));
        assert_eq!(a.regional_pct, 50.0);
        assert_eq!(summary.industry_regional_pct, 25.0);
        assert_eq!(summary.regional_gap("B"), 2);
        assert_eq!(summary.regional_gap("A"), 0);
    }

    #[test]
    fn zone_stats_skip_empty_zones_and_rank_the_focus() {
        let dataset = Dataset::new(vec![
            Branch::new("A", 40.4, 49.8),
            Branch::new("A", 40.41, 49.81),
            Branch::new("F", 40.42, 49.82),
            Branch::new("A", 41.5, 48.0),
            Branch::new("F", 39.5, 48.5),
        ]);
        let stats = zone_stats(&dataset, "F");

        let zones = stats.iter().map(|stat| stat.zone).collect::<Vec<_>>();
        assert_eq!(zones, vec![Zone::BakuCity, Zone::North]);
        assert_eq!(stats[0].focus_rank, Some(2));
        assert_eq!(stats[0].leader, "A");
        assert_eq!(stats[1].focus_rank, None);
        assert_eq!(stats[1].focus_share_pct, 0.0);
    }
}
