//! Analysis side of branchmap.
//!
//! This crate contains:
//! - The combined dataset as typed points
//! - Market, regional, clustering, proximity and density figures
//! - SVG charts and the plain-text strategic report

pub mod charts;
pub mod clustering;
pub mod config;
pub mod dataset;
pub mod density;
pub mod error;
pub mod market;
pub mod multimetric;
pub mod pipeline;
pub mod proximity;
pub mod regions;
pub mod report;

pub use charts::{render_all, ChartSpec, CHARTS};
pub use clustering::{cluster_branches, Cluster, ClusterSummary};
pub use config::{AnalysisConfig, DEFAULT_FOCUS_BANK, KM_PER_DEGREE};
pub use dataset::{Bounds, Branch, Dataset};
pub use density::{DensityGrid, GaussianKde};
pub use error::{AnalysisError, ChartError};
pub use market::{bank_counts, market_summary, BankCount, GrowthPlan, MarketSummary};
pub use multimetric::{compared_banks, multimetric, BankMetrics, Metrics};
pub use pipeline::{run, run_on, Analysis, AnalysisSummary, DensitySummary};
pub use proximity::{
    competitive_intensity, coverage_gaps, nearest_competitors, opportunity_grid, BankFrequency,
    BankIntensity, CoverageGap, GridSettings, IntensityReport, NearestCompetitor, NearestSummary,
    OpportunityCell, OpportunityGrid,
};
pub use regions::{in_baku, zone_stats, RegionSplit, RegionalSummary, Zone, ZoneStat};
