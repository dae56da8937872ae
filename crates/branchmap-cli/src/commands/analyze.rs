use std::path::Path;

use branchmap_analysis::AnalysisConfig;
use branchmap_core::COMBINED_FILE;
use tokio::task;

use crate::cli::AnalyzeArgs;
use crate::error::CliError;

use super::CommandResult;

fn config(args: &AnalyzeArgs, data_dir: &Path) -> AnalysisConfig {
    let dataset = args
        .dataset
        .clone()
        .unwrap_or_else(|| data_dir.join(COMBINED_FILE));
    AnalysisConfig::default()
        .with_focus_bank(args.focus.as_str())
        .with_dataset(dataset)
        .with_charts_dir(&args.charts_dir)
        .with_report_path(&args.report)
}

pub async fn run(args: &AnalyzeArgs, data_dir: &Path) -> Result<CommandResult, CliError> {
    let config = config(args, data_dir);
    let summary = task::spawn_blocking(move || branchmap_analysis::run(&config))
        .await
        .map_err(|error| CliError::Command(format!("analysis task failed: {error}")))??;

    let mut result = CommandResult::ok(serde_json::to_value(&summary)?);
    if summary.coverage_gaps == 0 {
        result = result.with_warning(format!(
            "no competitor branch is farther than the gap threshold from {}",
            summary.focus_bank
        ));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn dataset_defaults_to_the_combined_file_in_the_data_dir() {
        let args = AnalyzeArgs {
            focus: String::from("Kapital Bank"),
            dataset: None,
            charts_dir: PathBuf::from("out/charts"),
            report: PathBuf::from("out/report.txt"),
        };

        let config = config(&args, Path::new("scraped"));

        assert_eq!(config.focus_bank, "Kapital Bank");
        assert_eq!(config.dataset, PathBuf::from("scraped/combined_atms.csv"));
        assert_eq!(config.charts_dir, PathBuf::from("out/charts"));
    }
}
