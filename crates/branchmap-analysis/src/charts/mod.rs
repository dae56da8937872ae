//! SVG charts of a finished analysis, one file per view.

mod dashboard;
mod geography;
mod market;
pub mod palette;
pub mod primitives;
mod proximity;

use std::fs;
use std::path::{Path, PathBuf};

use plotters::style::RGBColor;
use tracing::{debug, info};

use crate::dataset::{Bounds, Dataset};
use crate::error::ChartError;
use crate::pipeline::Analysis;
use primitives::map_extent;

/// Data shared by every chart.
pub struct Scene<'a> {
    pub dataset: &'a Dataset,
    pub analysis: &'a Analysis,
}

impl Scene<'_> {
    pub fn focus(&self) -> &str {
        &self.analysis.focus_bank
    }

    /// Data bounds plus a margin, or the country's extent for an empty set.
    pub fn extent(&self) -> Bounds {
        self.dataset.bounds().map_or(
            Bounds {
                min_lat: 38.4,
                max_lat: 41.9,
                min_lon: 44.8,
                max_lon: 50.6,
            },
            |bounds| map_extent(bounds, 0.1),
        )
    }

    /// Focus colour for the focus bank, otherwise a colour stable per
    /// market rank.
    pub fn bank_color(&self, bank: &str) -> RGBColor {
        if bank == self.focus() {
            return palette::FOCUS;
        }
        let rank = self
            .analysis
            .market
            .counts
            .iter()
            .filter(|count| count.bank != self.focus())
            .position(|count| count.bank == bank)
            .unwrap_or(0);
        palette::categorical(rank)
    }

    pub fn focus_points(&self) -> Vec<(f64, f64)> {
        self.dataset.of_bank(self.focus()).map(|branch| branch.xy()).collect()
    }
}

/// Shortens long bank names for crowded axes.
pub(crate) fn short(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_owned()
    } else {
        let mut cut = label.chars().take(max.saturating_sub(1)).collect::<String>();
        cut.push('.');
        cut
    }
}

type Draw = fn(&Path, &Scene<'_>) -> Result<(), ChartError>;

pub struct ChartSpec {
    pub file: &'static str,
    pub description: &'static str,
    draw: Draw,
}

pub const CHARTS: [ChartSpec; 15] = [
    ChartSpec {
        file: "01_branch_count_comparison.svg",
        description: "Branch network size of every bank",
        draw: market::branch_counts,
    },
    ChartSpec {
        file: "02_market_share_analysis.svg",
        description: "Market rankings, share distribution and the top five competitors",
        draw: market::market_share,
    },
    ChartSpec {
        file: "03_geographic_distribution_all.svg",
        description: "Every branch on the map",
        draw: geography::all_branches,
    },
    ChartSpec {
        file: "04_focus_vs_competitors_geographic.svg",
        description: "Coverage of the focus bank next to the three largest competitors",
        draw: geography::focus_vs_competitors,
    },
    ChartSpec {
        file: "05_regional_clustering.svg",
        description: "DBSCAN clusters and focus presence per cluster",
        draw: geography::clusters,
    },
    ChartSpec {
        file: "06_baku_city_analysis.svg",
        description: "Branches inside Baku city",
        draw: geography::baku_city,
    },
    ChartSpec {
        file: "07_baku_vs_regions.svg",
        description: "Baku versus regional branches per bank",
        draw: market::baku_vs_regions,
    },
    ChartSpec {
        file: "08_competitive_density.svg",
        description: "Branch density and focus branches over competitor density",
        draw: proximity::density,
    },
    ChartSpec {
        file: "09_gap_analysis.svg",
        description: "Competitor branches far from any focus branch",
        draw: proximity::gaps,
    },
    ChartSpec {
        file: "10_nearest_competitor_analysis.svg",
        description: "Distance to the nearest competitor and who it is",
        draw: proximity::nearest,
    },
    ChartSpec {
        file: "11_competitive_intensity.svg",
        description: "Branches within 0.1 degrees, per bank and for the focus bank",
        draw: proximity::intensity,
    },
    ChartSpec {
        file: "12_regional_market_dominance.svg",
        description: "Geographic zones and the focus bank against each zone leader",
        draw: geography::zones,
    },
    ChartSpec {
        file: "13_growth_opportunity_score.svg",
        description: "Opportunity score grid and the best locations",
        draw: proximity::opportunities,
    },
    ChartSpec {
        file: "14_multimetric_comparison.svg",
        description: "Normalized metrics of the focus bank and the market leaders",
        draw: market::multimetric,
    },
    ChartSpec {
        file: "15_executive_summary_dashboard.svg",
        description: "Executive summary dashboard",
        draw: dashboard::dashboard,
    },
];

/// Writes every chart into `charts_dir`, creating it if needed, and returns
/// the written paths in chart order.
pub fn render_all(dataset: &Dataset, analysis: &Analysis, charts_dir: &Path) -> Result<Vec<PathBuf>, ChartError> {
    fs::create_dir_all(charts_dir).map_err(|source| ChartError::Io {
        path: charts_dir.to_path_buf(),
        source,
    })?;
    let scene = Scene { dataset, analysis };

    let mut written = Vec::with_capacity(CHARTS.len());
    for chart in &CHARTS {
        let path = charts_dir.join(chart.file);
        (chart.draw)(&path, &scene)?;
        debug!(chart = %path.display(), "chart written");
        written.push(path);
    }
    info!(charts = written.len(), dir = %charts_dir.display(), "charts rendered");
    Ok(written)
}
