//! Density-based clustering of every branch with DBSCAN.

use std::collections::BTreeMap;

use branchmap_core::Coordinates;
use linfa::traits::Transformer;
use linfa::ParamGuard;
use linfa_clustering::Dbscan;
use serde::Serialize;
use tracing::debug;

use crate::dataset::{lat_lon_matrix, Dataset};
use crate::error::AnalysisError;
use crate::market::percentage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub id: usize,
    pub size: usize,
    pub centroid: Coordinates,
    pub focus_branches: usize,
    pub focus_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    /// Cluster id per branch in dataset order, `None` for noise.
    #[serde(skip)]
    pub labels: Vec<Option<usize>>,
    pub clusters: Vec<Cluster>,
    pub noise: usize,
    pub noise_focus: usize,
    /// Ids of clusters where the focus bank is under the share threshold.
    pub underserved: Vec<usize>,
}

impl ClusterSummary {
    pub fn cluster(&self, id: usize) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.id == id)
    }

    pub fn underserved_clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters
            .iter()
            .filter(|cluster| self.underserved.contains(&cluster.id))
    }
}

#[derive(Default)]
struct Tally {
    size: usize,
    lat_sum: f64,
    lon_sum: f64,
    focus: usize,
}

pub fn cluster_branches(
    dataset: &Dataset,
    focus_bank: &str,
    eps: f64,
    min_points: usize,
    underserved_share_pct: f64,
) -> Result<ClusterSummary, AnalysisError> {
    let labels = if dataset.is_empty() {
        Vec::new()
    } else {
        let records = lat_lon_matrix(dataset.branches().iter().map(|branch| &branch.location));
        Dbscan::params(min_points)
            .tolerance(eps)
            .check()
            .map_err(|error| AnalysisError::Clustering(error.to_string()))?
            .transform(&records)
            .to_vec()
    };

    let mut tallies: BTreeMap<usize, Tally> = BTreeMap::new();
    let mut noise = 0;
    let mut noise_focus = 0;
    for (branch, label) in dataset.branches().iter().zip(&labels) {
        let is_focus = branch.bank == focus_bank;
        match label {
            Some(id) => {
                let tally = tallies.entry(*id).or_default();
                tally.size += 1;
                tally.lat_sum += branch.location.lat;
                tally.lon_sum += branch.location.lon;
                tally.focus += usize::from(is_focus);
            }
            None => {
                noise += 1;
                noise_focus += usize::from(is_focus);
            }
        }
    }

    let clusters = tallies
        .into_iter()
        .map(|(id, tally)| Cluster {
            id,
            size: tally.size,
            centroid: Coordinates {
                lat: tally.lat_sum / tally.size as f64,
                lon: tally.lon_sum / tally.size as f64,
            },
            focus_branches: tally.focus,
            focus_share_pct: percentage(tally.focus, tally.size),
        })
        .collect::<Vec<_>>();
    let underserved = clusters
        .iter()
        .filter(|cluster| cluster.focus_share_pct < underserved_share_pct)
        .map(|cluster| cluster.id)
        .collect();
    debug!(clusters = clusters.len(), noise, "clustered branches");

    Ok(ClusterSummary {
        labels,
        clusters,
        noise,
        noise_focus,
        underserved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Branch;

    fn blob(bank: &str, lat: f64, lon: f64, n: usize) -> Vec<Branch> {
        (0..n)
            .map(|i| Branch::new(bank, lat + i as f64 * 0.01, lon + i as f64 * 0.01))
            .collect()
    }

    #[test]
    fn two_dense_groups_and_an_outlier() {
        let mut branches = blob("A", 40.4, 49.8, 8);
        branches.extend(blob("F", 40.42, 49.82, 2));
        branches.extend(blob("A", 38.7, 48.8, 6));
        branches.push(Branch::new("F", 42.0, 45.0));
        let dataset = Dataset::new(branches);

        let summary = cluster_branches(&dataset, "F", 0.5, 5, 5.0).expect("clusters");

        assert_eq!(summary.clusters.len(), 2);
        assert_eq!(summary.noise, 1);
        assert_eq!(summary.noise_focus, 1);
        assert_eq!(summary.labels.len(), dataset.len());

        let baku = summary
            .clusters
            .iter()
            .find(|cluster| cluster.focus_branches == 2)
            .expect("baku cluster");
        assert_eq!(baku.size, 10);
        assert!((baku.focus_share_pct - 20.0).abs() < 1e-9);
        assert!((baku.centroid.lat - 40.433).abs() < 1e-6);

        let underserved = summary.underserved_clusters().collect::<Vec<_>>();
        assert_eq!(underserved.len(), 1);
        assert_eq!(underserved[0].size, 6);
    }

    #[test]
    fn sparse_points_are_all_noise() {
        let dataset = Dataset::new(vec![
            Branch::new("A", 40.0, 45.0),
            Branch::new("B", 42.0, 48.0),
        ]);

        let summary = cluster_branches(&dataset, "A", 0.5, 5, 5.0).expect("clusters");

        assert!(summary.clusters.is_empty());
        assert!(summary.underserved.is_empty());
        assert_eq!(summary.noise, 2);
    }

    #[test]
    fn empty_dataset_has_no_clusters() {
        let summary = cluster_branches(&Dataset::default(), "A", 0.5, 5, 5.0).expect("clusters");

        assert!(summary.labels.is_empty());
        assert_eq!(summary.noise, 0);
    }
}
