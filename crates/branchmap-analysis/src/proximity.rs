//! Distances between the focus bank and its competitors.

use std::collections::HashMap;

use branchmap_core::Coordinates;
use linfa_nn::distance::L2Dist;
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour, NearestNeighbourIndex};
use ndarray::arr1;
use serde::Serialize;

use crate::config::KM_PER_DEGREE;
use crate::dataset::{lat_lon_matrix, Bounds, Dataset};
use crate::error::AnalysisError;

/// For every query, the index of the closest target and its distance in degrees.
fn nearest_in(
    targets: &[Coordinates],
    queries: &[Coordinates],
) -> Result<Vec<(usize, f64)>, AnalysisError> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }
    let batch = lat_lon_matrix(targets);
    let index = CommonNearestNeighbour::KdTree
        .from_batch(&batch, L2Dist)
        .map_err(|error| AnalysisError::NearestNeighbour(error.to_string()))?;

    queries
        .iter()
        .map(|query| {
            let point = arr1(&[query.lat, query.lon]);
            let found = index
                .k_nearest(point.view(), 1)
                .map_err(|error| AnalysisError::NearestNeighbour(error.to_string()))?;
            let (_, position) = found
                .first()
                .ok_or_else(|| AnalysisError::NearestNeighbour(String::from("index returned no neighbour")))?;
            Ok((*position, query.degree_distance(targets[*position])))
        })
        .collect()
}

fn locations<'a>(branches: impl Iterator<Item = &'a crate::dataset::Branch>) -> Vec<Coordinates> {
    branches.map(|branch| branch.location).collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

// =============================================================================
// Nearest competitor
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestCompetitor {
    pub branch: Coordinates,
    pub competitor: Coordinates,
    pub bank: String,
    pub distance_deg: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankFrequency {
    pub bank: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestSummary {
    pub pairs: Vec<NearestCompetitor>,
    pub mean_deg: f64,
    pub median_deg: f64,
    /// How often each bank is the closest competitor, most frequent first.
    pub by_bank: Vec<BankFrequency>,
}

impl NearestSummary {
    pub fn distances(&self) -> Vec<f64> {
        self.pairs.iter().map(|pair| pair.distance_deg).collect()
    }

    pub fn mean_km(&self) -> f64 {
        self.mean_deg * KM_PER_DEGREE
    }

    pub fn median_km(&self) -> f64 {
        self.median_deg * KM_PER_DEGREE
    }
}

pub fn nearest_competitors(dataset: &Dataset, focus_bank: &str) -> Result<NearestSummary, AnalysisError> {
    let competitors = dataset.excluding(focus_bank).collect::<Vec<_>>();
    let focus = locations(dataset.of_bank(focus_bank));
    let nearest = nearest_in(&locations(competitors.iter().copied()), &focus)?;

    let pairs = focus
        .iter()
        .zip(nearest)
        .map(|(branch, (position, distance))| {
            let competitor = competitors[position];
            NearestCompetitor {
                branch: *branch,
                competitor: competitor.location,
                bank: competitor.bank.clone(),
                distance_deg: distance,
                distance_km: distance * KM_PER_DEGREE,
            }
        })
        .collect::<Vec<_>>();

    let mut tally: HashMap<&str, usize> = HashMap::new();
    for pair in &pairs {
        *tally.entry(pair.bank.as_str()).or_default() += 1;
    }
    let mut by_bank = tally
        .into_iter()
        .map(|(bank, count)| BankFrequency {
            bank: bank.to_owned(),
            count,
        })
        .collect::<Vec<_>>();
    by_bank.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.bank.cmp(&b.bank)));

    let distances = pairs.iter().map(|pair| pair.distance_deg).collect::<Vec<_>>();
    Ok(NearestSummary {
        mean_deg: mean(&distances),
        median_deg: median(&distances),
        pairs,
        by_bank,
    })
}

// =============================================================================
// Coverage gaps
// =============================================================================

/// A competitor branch far from every focus branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageGap {
    pub location: Coordinates,
    pub bank: String,
    pub distance_deg: f64,
}

impl CoverageGap {
    pub fn distance_km(&self) -> f64 {
        self.distance_deg * KM_PER_DEGREE
    }
}

/// Competitor branches farther than `threshold` degrees from the nearest
/// focus branch, farthest first.
pub fn coverage_gaps(
    dataset: &Dataset,
    focus_bank: &str,
    threshold: f64,
) -> Result<Vec<CoverageGap>, AnalysisError> {
    let competitors = dataset.excluding(focus_bank).collect::<Vec<_>>();
    let focus = locations(dataset.of_bank(focus_bank));
    let nearest = nearest_in(&focus, &locations(competitors.iter().copied()))?;

    let mut gaps = competitors
        .iter()
        .zip(nearest)
        .filter(|(_, (_, distance))| *distance > threshold)
        .map(|(branch, (_, distance))| CoverageGap {
            location: branch.location,
            bank: branch.bank.clone(),
            distance_deg: distance,
        })
        .collect::<Vec<_>>();
    gaps.sort_by(|a, b| b.distance_deg.total_cmp(&a.distance_deg));
    Ok(gaps)
}

// =============================================================================
// Competitive intensity
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankIntensity {
    pub bank: String,
    pub average: f64,
    pub max: usize,
    pub min: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityReport {
    /// Neighbours within the radius, per branch in dataset order.
    #[serde(skip)]
    pub per_branch: Vec<usize>,
    /// Highest average first.
    pub banks: Vec<BankIntensity>,
}

impl IntensityReport {
    pub fn of_bank(&self, bank: &str) -> Option<&BankIntensity> {
        self.banks.iter().find(|entry| entry.bank == bank)
    }

    /// Per-branch counts of one bank's branches.
    pub fn counts_for<'a>(&'a self, dataset: &'a Dataset, bank: &'a str) -> impl Iterator<Item = usize> + 'a {
        dataset
            .branches()
            .iter()
            .zip(&self.per_branch)
            .filter(move |(branch, _)| branch.bank == bank)
            .map(|(_, count)| *count)
    }
}

/// Counts, for each branch, the other branches strictly within `radius`
/// degrees. Co-located branches are not counted.
pub fn competitive_intensity(dataset: &Dataset, radius: f64) -> IntensityReport {
    let branches = dataset.branches();
    let per_branch = branches
        .iter()
        .map(|branch| {
            branches
                .iter()
                .filter(|other| {
                    let distance = branch.location.degree_distance(other.location);
                    distance > 0.0 && distance < radius
                })
                .count()
        })
        .collect::<Vec<_>>();

    let mut grouped: HashMap<&str, Vec<usize>> = HashMap::new();
    for (branch, count) in branches.iter().zip(&per_branch) {
        grouped.entry(branch.bank.as_str()).or_default().push(*count);
    }
    let mut banks = grouped
        .into_iter()
        .map(|(bank, counts)| BankIntensity {
            bank: bank.to_owned(),
            average: counts.iter().sum::<usize>() as f64 / counts.len() as f64,
            max: counts.iter().copied().max().unwrap_or(0),
            min: counts.iter().copied().min().unwrap_or(0),
        })
        .collect::<Vec<_>>();
    banks.sort_by(|a, b| b.average.total_cmp(&a.average).then_with(|| a.bank.cmp(&b.bank)));

    IntensityReport { per_branch, banks }
}

// =============================================================================
// Opportunity grid
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpportunityCell {
    pub location: Coordinates,
    pub focus_distance: f64,
    pub competitors: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityGrid {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Row-major by latitude.
    #[serde(skip)]
    pub cells: Vec<OpportunityCell>,
}

impl OpportunityGrid {
    pub fn cell(&self, lat_index: usize, lon_index: usize) -> Option<&OpportunityCell> {
        self.cells.get(lat_index * self.lons.len() + lon_index)
    }

    pub fn max_score(&self) -> f64 {
        self.cells.iter().map(|cell| cell.score).fold(0.0, f64::max)
    }

    /// The `n` best scoring cells, best first; equal scores keep grid order.
    pub fn top(&self, n: usize) -> Vec<OpportunityCell> {
        let mut ranked = self.cells.clone();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(n);
        ranked
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub resolution: usize,
    pub padding: f64,
    pub competitor_radius: f64,
}

/// Scores a regular grid over the padded data bounds:
/// `10 * distance to nearest focus branch + 0.5 * competitors within radius`.
pub fn opportunity_grid(
    dataset: &Dataset,
    focus_bank: &str,
    settings: GridSettings,
) -> Result<OpportunityGrid, AnalysisError> {
    let Some(bounds) = dataset.bounds().map(|bounds| bounds.padded(settings.padding)) else {
        return Ok(OpportunityGrid {
            lats: Vec::new(),
            lons: Vec::new(),
            cells: Vec::new(),
        });
    };
    let Bounds {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    } = bounds;
    let lats = linspace(min_lat, max_lat, settings.resolution);
    let lons = linspace(min_lon, max_lon, settings.resolution);
    let points = lats
        .iter()
        .flat_map(|&lat| lons.iter().map(move |&lon| Coordinates { lat, lon }))
        .collect::<Vec<_>>();

    let focus = locations(dataset.of_bank(focus_bank));
    let competitors = locations(dataset.excluding(focus_bank));
    let nearest = nearest_in(&focus, &points)?;
    if nearest.len() != points.len() {
        return Err(AnalysisError::FocusBankMissing {
            bank: focus_bank.to_owned(),
        });
    }

    let cells = points
        .iter()
        .zip(nearest)
        .map(|(point, (_, focus_distance))| {
            let nearby = competitors
                .iter()
                .filter(|competitor| point.degree_distance(**competitor) < settings.competitor_radius)
                .count();
            OpportunityCell {
                location: *point,
                focus_distance,
                competitors: nearby,
                score: focus_distance * 10.0 + nearby as f64 * 0.5,
            }
        })
        .collect();

    Ok(OpportunityGrid { lats, lons, cells })
}
