//! One analysis run: load, compute, chart and report.

use std::path::PathBuf;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::charts;
use crate::clustering::{cluster_branches, ClusterSummary};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::density::{DensityGrid, GaussianKde};
use crate::error::AnalysisError;
use crate::market::{market_summary, MarketSummary};
use crate::multimetric::{multimetric, BankMetrics};
use crate::proximity::{
    competitive_intensity, coverage_gaps, nearest_competitors, opportunity_grid, CoverageGap, GridSettings,
    IntensityReport, NearestSummary, OpportunityCell, OpportunityGrid,
};
use crate::regions::{zone_stats, RegionalSummary, ZoneStat};
use crate::report;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensitySummary {
    /// KDE of every branch on the configured lattice over the data bounds.
    pub all_banks: Option<DensityGrid>,
    /// KDE of the competitors evaluated at each competitor branch.
    #[serde(skip)]
    pub at_competitors: Option<Vec<f64>>,
}

/// Every computed figure of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub focus_bank: String,
    pub market: MarketSummary,
    pub regional: RegionalSummary,
    pub zones: Vec<ZoneStat>,
    pub clusters: ClusterSummary,
    pub nearest: NearestSummary,
    pub gaps: Vec<CoverageGap>,
    pub intensity: IntensityReport,
    pub opportunities: OpportunityGrid,
    pub top_opportunities: Vec<OpportunityCell>,
    pub density: DensitySummary,
    pub multimetric: Vec<BankMetrics>,
}

impl Analysis {
    pub fn compute(dataset: &Dataset, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let focus = config.focus_bank.as_str();
        let market = market_summary(dataset, focus)?;
        let intensity = competitive_intensity(dataset, config.intensity_radius);
        let opportunities = opportunity_grid(
            dataset,
            focus,
            GridSettings {
                resolution: config.opportunity_resolution,
                padding: config.opportunity_padding,
                competitor_radius: config.opportunity_radius,
            },
        )?;

        let locations = dataset
            .branches()
            .iter()
            .map(|branch| branch.location)
            .collect::<Vec<_>>();
        let competitors = dataset
            .excluding(focus)
            .map(|branch| branch.location)
            .collect::<Vec<_>>();
        let all_banks = match (GaussianKde::fit(&locations), dataset.bounds()) {
            (Some(kde), Some(bounds)) => Some(kde.grid(bounds, config.density_resolution)),
            _ => {
                warn!("branch locations are degenerate, skipping the density grid");
                None
            }
        };
        let at_competitors = GaussianKde::fit(&competitors).map(|kde| kde.evaluate_all(&competitors));

        Ok(Self {
            focus_bank: focus.to_owned(),
            regional: RegionalSummary::of(dataset),
            zones: zone_stats(dataset, focus),
            clusters: cluster_branches(
                dataset,
                focus,
                config.cluster_eps,
                config.cluster_min_points,
                config.underserved_share_pct,
            )?,
            nearest: nearest_competitors(dataset, focus)?,
            gaps: coverage_gaps(dataset, focus, config.gap_threshold)?,
            multimetric: multimetric(dataset, focus, &intensity),
            top_opportunities: opportunities.top(config.top_opportunities),
            density: DensitySummary {
                all_banks,
                at_competitors,
            },
            market,
            intensity,
            opportunities,
        })
    }
}

/// Headline figures of a finished run, as reported by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub focus_bank: String,
    pub branches: usize,
    pub banks: usize,
    pub focus_branches: usize,
    pub focus_share_pct: f64,
    pub focus_rank: usize,
    pub leader: String,
    pub clusters: usize,
    pub underserved_clusters: usize,
    pub coverage_gaps: usize,
    pub charts: Vec<PathBuf>,
    pub report: PathBuf,
}

impl AnalysisSummary {
    fn new(analysis: &Analysis, charts: Vec<PathBuf>, report: PathBuf) -> Self {
        Self {
            focus_bank: analysis.focus_bank.clone(),
            branches: analysis.market.total_branches,
            banks: analysis.market.bank_count(),
            focus_branches: analysis.market.focus.branches,
            focus_share_pct: analysis.market.focus.share_pct,
            focus_rank: analysis.market.focus_rank,
            leader: analysis.market.leader.bank.clone(),
            clusters: analysis.clusters.clusters.len(),
            underserved_clusters: analysis.clusters.underserved.len(),
            coverage_gaps: analysis.gaps.len(),
            charts,
            report,
        }
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Loads the dataset named in `config`, then writes every chart and the report.
pub fn run(config: &AnalysisConfig) -> Result<AnalysisSummary, AnalysisError> {
    let dataset = Dataset::load(&config.dataset)?;
    run_on(&dataset, config)
}

pub fn run_on(dataset: &Dataset, config: &AnalysisConfig) -> Result<AnalysisSummary, AnalysisError> {
    let analysis = Analysis::compute(dataset, config)?;
    info!(
        focus = %analysis.focus_bank,
        rank = analysis.market.focus_rank,
        gaps = analysis.gaps.len(),
        "analysis computed"
    );

    let charts = charts::render_all(dataset, &analysis, &config.charts_dir)?;
    let text = report::render(&analysis, &config.charts_dir, now());
    report::write(&config.report_path, &text)?;

    Ok(AnalysisSummary::new(&analysis, charts, config.report_path.clone()))
}
