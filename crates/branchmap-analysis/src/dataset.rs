//! The combined `bank_name,lat,long` table as typed points.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use branchmap_core::{CombinedRow, Coordinates};
use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub bank: String,
    pub location: Coordinates,
}

impl Branch {
    pub fn new(bank: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            bank: bank.into(),
            location: Coordinates { lat, lon },
        }
    }

    /// `(lon, lat)`, the order charts plot in.
    pub fn xy(&self) -> (f64, f64) {
        (self.location.lon, self.location.lat)
    }
}

/// Axis-aligned extent of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn of<'a>(points: impl IntoIterator<Item = &'a Coordinates>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, point| {
            Some(match bounds {
                None => Self {
                    min_lat: point.lat,
                    max_lat: point.lat,
                    min_lon: point.lon,
                    max_lon: point.lon,
                },
                Some(bounds) => Self {
                    min_lat: bounds.min_lat.min(point.lat),
                    max_lat: bounds.max_lat.max(point.lat),
                    min_lon: bounds.min_lon.min(point.lon),
                    max_lon: bounds.max_lon.max(point.lon),
                },
            })
        })
    }

    pub fn padded(self, padding: f64) -> Self {
        Self {
            min_lat: self.min_lat - padding,
            max_lat: self.max_lat + padding,
            min_lon: self.min_lon - padding,
            max_lon: self.max_lon + padding,
        }
    }

    /// Latitude range plus longitude range.
    pub fn spread(&self) -> f64 {
        (self.max_lat - self.min_lat) + (self.max_lon - self.min_lon)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    branches: Vec<Branch>,
}

fn finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

impl Dataset {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self { branches }
    }

    /// Reads the combined table, dropping rows whose coordinates are not
    /// finite numbers.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let file = File::open(path).map_err(|source| AnalysisError::io(path, source))?;
        let mut reader = csv::Reader::from_reader(file);

        let mut branches = Vec::new();
        let mut dropped = 0_usize;
        for row in reader.deserialize::<CombinedRow>() {
            let row = row.map_err(|source| AnalysisError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            match (finite(&row.lat), finite(&row.long)) {
                (Some(lat), Some(lon)) => branches.push(Branch::new(row.bank_name, lat, lon)),
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(dropped, "skipped rows without numeric coordinates");
        }
        if branches.is_empty() {
            return Err(AnalysisError::EmptyDataset {
                path: path.to_path_buf(),
            });
        }

        let dataset = Self::new(branches);
        info!(
            branches = dataset.len(),
            banks = dataset.bank_names().len(),
            "loaded combined dataset"
        );
        Ok(dataset)
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Distinct bank names in alphabetical order.
    pub fn bank_names(&self) -> BTreeSet<&str> {
        self.branches.iter().map(|branch| branch.bank.as_str()).collect()
    }

    pub fn of_bank<'a>(&'a self, bank: &'a str) -> impl Iterator<Item = &'a Branch> + 'a {
        self.branches.iter().filter(move |branch| branch.bank == bank)
    }

    pub fn excluding<'a>(&'a self, bank: &'a str) -> impl Iterator<Item = &'a Branch> + 'a {
        self.branches.iter().filter(move |branch| branch.bank != bank)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(self.branches.iter().map(|branch| &branch.location))
    }

    /// Subset of branches matching `keep`.
    pub fn filtered(&self, keep: impl Fn(&Branch) -> bool) -> Self {
        Self::new(self.branches.iter().filter(|branch| keep(branch)).cloned().collect())
    }
}

/// `n x 2` matrix of `(lat, lon)` rows.
pub(crate) fn lat_lon_matrix<'a>(points: impl IntoIterator<Item = &'a Coordinates>) -> Array2<f64> {
    let flat = points
        .into_iter()
        .flat_map(|point| [point.lat, point.lon])
        .collect::<Vec<_>>();
    let rows = flat.len() / 2;
    Array2::from_shape_vec((rows, 2), flat).unwrap_or_else(|_| Array2::zeros((0, 2)))
}
