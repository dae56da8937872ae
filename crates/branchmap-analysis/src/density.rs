//! Two-dimensional Gaussian kernel density estimate.

use std::f64::consts::PI;

use branchmap_core::Coordinates;
use serde::Serialize;

use crate::dataset::Bounds;
use crate::proximity::linspace;

/// Gaussian KDE with Scott's bandwidth over the full sample covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKde {
    points: Vec<Coordinates>,
    /// Inverse of the kernel covariance, `[[lat_lat, lat_lon], [lat_lon, lon_lon]]`.
    inverse: [[f64; 2]; 2],
    norm: f64,
}

impl GaussianKde {
    /// `None` with fewer than three points or a singular covariance, e.g.
    /// when every point lies on one line.
    pub fn fit(points: &[Coordinates]) -> Option<Self> {
        let n = points.len();
        if n < 3 {
            return None;
        }
        let count = n as f64;
        let mean_lat = points.iter().map(|p| p.lat).sum::<f64>() / count;
        let mean_lon = points.iter().map(|p| p.lon).sum::<f64>() / count;

        let (mut s_aa, mut s_ab, mut s_bb) = (0.0, 0.0, 0.0);
        for point in points {
            let a = point.lat - mean_lat;
            let b = point.lon - mean_lon;
            s_aa += a * a;
            s_ab += a * b;
            s_bb += b * b;
        }
        let factor_sq = count.powf(-1.0 / 6.0).powi(2);
        let scale = factor_sq / (count - 1.0);
        let (c_aa, c_ab, c_bb) = (s_aa * scale, s_ab * scale, s_bb * scale);

        let det = c_aa * c_bb - c_ab * c_ab;
        if !det.is_finite() || det <= f64::EPSILON * (c_aa * c_bb).abs().max(f64::MIN_POSITIVE) {
            return None;
        }

        Some(Self {
            points: points.to_vec(),
            inverse: [[c_bb / det, -c_ab / det], [-c_ab / det, c_aa / det]],
            norm: 1.0 / (2.0 * PI * det.sqrt() * count),
        })
    }

    pub fn evaluate(&self, at: &Coordinates) -> f64 {
        let [[i_aa, i_ab], [_, i_bb]] = self.inverse;
        self.points
            .iter()
            .map(|point| {
                let a = at.lat - point.lat;
                let b = at.lon - point.lon;
                (-0.5 * (a * a * i_aa + 2.0 * a * b * i_ab + b * b * i_bb)).exp()
            })
            .sum::<f64>()
            * self.norm
    }

    pub fn evaluate_all(&self, at: &[Coordinates]) -> Vec<f64> {
        at.iter().map(|point| self.evaluate(point)).collect()
    }

    /// Density on a `resolution x resolution` lattice spanning `bounds`.
    pub fn grid(&self, bounds: Bounds, resolution: usize) -> DensityGrid {
        let lats = linspace(bounds.min_lat, bounds.max_lat, resolution);
        let lons = linspace(bounds.min_lon, bounds.max_lon, resolution);
        let values = lats
            .iter()
            .flat_map(|&lat| lons.iter().map(move |&lon| Coordinates { lat, lon }))
            .map(|point| self.evaluate(&point))
            .collect();
        DensityGrid { lats, lons, values }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityGrid {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Row-major by latitude.
    #[serde(skip)]
    pub values: Vec<f64>,
}

impl DensityGrid {
    pub fn value(&self, lat_index: usize, lon_index: usize) -> Option<f64> {
        self.values.get(lat_index * self.lons.len() + lon_index).copied()
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Coordinates> {
        vec![
            Coordinates { lat: 0.0, lon: 0.0 },
            Coordinates { lat: 1.0, lon: 0.0 },
            Coordinates { lat: 0.0, lon: 1.0 },
            Coordinates { lat: 1.0, lon: 1.0 },
        ]
    }

    #[test]
    fn too_few_or_collinear_points_have_no_estimate() {
        assert!(GaussianKde::fit(&square()[..2]).is_none());
        let line = (0..5)
            .map(|i| Coordinates { lat: i as f64, lon: i as f64 * 2.0 })
            .collect::<Vec<_>>();
        assert!(GaussianKde::fit(&line).is_none());
    }

    #[test]
    fn density_matches_closed_form_for_a_square() {
        // cov = diag(1/3, 1/3), factor^2 = 4^(-1/3)
        let kde = GaussianKde::fit(&square()).expect("non-singular");
        let variance = (1.0 / 3.0) * 4.0_f64.powf(-1.0 / 3.0);
        let kernel = |d2: f64| (-0.5 * d2 / variance).exp() / (2.0 * PI * variance);
        let expected = (kernel(0.0) + 2.0 * kernel(1.0) + kernel(2.0)) / 4.0;

        let at_corner = kde.evaluate(&Coordinates { lat: 0.0, lon: 0.0 });

        assert!((at_corner - expected).abs() < 1e-12);
        let center = kde.evaluate(&Coordinates { lat: 0.5, lon: 0.5 });
        let far = kde.evaluate(&Coordinates { lat: 5.0, lon: 5.0 });
        assert!(center > far);
    }

    #[test]
    fn grid_is_row_major_by_latitude() {
        let kde = GaussianKde::fit(&square()).expect("non-singular");
        let bounds = Bounds {
            min_lat: 0.0,
            max_lat: 1.0,
            min_lon: 0.0,
            max_lon: 2.0,
        };

        let grid = kde.grid(bounds, 3);

        assert_eq!(grid.values.len(), 9);
        assert_eq!(grid.lons, vec![0.0, 1.0, 2.0]);
        let expected = kde.evaluate(&Coordinates { lat: 0.5, lon: 2.0 });
        assert_eq!(grid.value(1, 2), Some(expected));
        assert!(grid.max() >= expected);
    }
}
