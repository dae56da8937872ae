use std::path::PathBuf;

/// Kilometres per degree, the flat conversion used for every distance label.
pub const KM_PER_DEGREE: f64 = 111.0;

pub const DEFAULT_FOCUS_BANK: &str = "Bank of Baku";

/// Thresholds and output locations of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub focus_bank: String,
    pub dataset: PathBuf,
    pub charts_dir: PathBuf,
    pub report_path: PathBuf,
    /// DBSCAN neighbourhood radius in degrees.
    pub cluster_eps: f64,
    pub cluster_min_points: usize,
    /// Clusters where the focus bank holds less than this share are underserved.
    pub underserved_share_pct: f64,
    /// Competitor branches farther than this from any focus branch are gaps.
    pub gap_threshold: f64,
    pub intensity_radius: f64,
    pub opportunity_resolution: usize,
    pub opportunity_padding: f64,
    pub opportunity_radius: f64,
    pub top_opportunities: usize,
    pub density_resolution: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            focus_bank: String::from(DEFAULT_FOCUS_BANK),
            dataset: PathBuf::from("data").join("combined_atms.csv"),
            charts_dir: PathBuf::from("charts"),
            report_path: PathBuf::from("docs").join("STRATEGIC_INSIGHTS.txt"),
            cluster_eps: 0.5,
            cluster_min_points: 5,
            underserved_share_pct: 5.0,
            gap_threshold: 0.3,
            intensity_radius: 0.1,
            opportunity_resolution: 30,
            opportunity_padding: 0.1,
            opportunity_radius: 0.2,
            top_opportunities: 20,
            density_resolution: 100,
        }
    }
}

impl AnalysisConfig {
    pub fn with_focus_bank(mut self, focus_bank: impl Into<String>) -> Self {
        self.focus_bank = focus_bank.into();
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<PathBuf>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn with_charts_dir(mut self, charts_dir: impl Into<PathBuf>) -> Self {
        self.charts_dir = charts_dir.into();
        self
    }

    pub fn with_report_path(mut self, report_path: impl Into<PathBuf>) -> Self {
        self.report_path = report_path.into();
        self
    }
}
