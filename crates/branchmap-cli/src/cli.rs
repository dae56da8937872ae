//! CLI argument definitions for branchmap.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `banks` | List extractors and the combine mapping |
//! | `scrape` | Run bank extractors and write per-bank tables |
//! | `combine` | Merge per-bank tables into the combined dataset |
//! | `analyze` | Compute figures, draw charts and write the report |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--data-dir` | `data` | Directory of per-bank tables (`BRANCHMAP_DATA_DIR`) |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `30000` | Page request timeout in ms |
//! | `-v` | off | Raise log verbosity (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! # Scrape two banks, then every extractor
//! branchmap scrape abb turanbank
//! branchmap scrape --all
//!
//! # Merge and analyze
//! branchmap combine
//! branchmap analyze --focus "Bank of Baku" --pretty
//! ```

use std::path::PathBuf;

use branchmap_analysis::DEFAULT_FOCUS_BANK;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "branchmap",
    author,
    version,
    about = "Bank branch collection and market analysis",
    long_about = "branchmap collects bank branch locations from bank websites, merges them \
into one dataset and analyses the market position of a focus bank.\n\
\n\
Use 'branchmap <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Directory holding the per-bank tables and the combined dataset.
    #[arg(long, global = true, env = "BRANCHMAP_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Page request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Log more detail to stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object.
    Json,
    /// Plain text for terminal display.
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List bank extractors and the table files merged by `combine`.
    Banks,
    /// Scrape bank websites into per-bank tables.
    Scrape(ScrapeArgs),
    /// Merge per-bank tables into the combined dataset.
    Combine(CombineArgs),
    /// Analyze the combined dataset for a focus bank.
    Analyze(AnalyzeArgs),
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Banks => "banks",
            Self::Scrape(_) => "scrape",
            Self::Combine(_) => "combine",
            Self::Analyze(_) => "analyze",
        }
    }
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Banks to scrape (abb, asb, afb, expressbank, turanbank).
    #[arg(value_name = "BANK", required_unless_present = "all", conflicts_with = "all")]
    pub banks: Vec<String>,

    /// Scrape every bank with an extractor.
    #[arg(long, default_value_t = false)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct CombineArgs {
    /// Combined dataset path. Defaults to `<data-dir>/combined_atms.csv`.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Bank whose market position is analyzed.
    #[arg(long, default_value = DEFAULT_FOCUS_BANK)]
    pub focus: String,

    /// Combined dataset path. Defaults to `<data-dir>/combined_atms.csv`.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Directory for the SVG charts.
    #[arg(long, default_value = "charts")]
    pub charts_dir: PathBuf,

    /// Path of the plain-text report.
    #[arg(long, default_value = "docs/STRATEGIC_INSIGHTS.txt")]
    pub report: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scrape_requires_banks_or_all() {
        assert!(Cli::try_parse_from(["branchmap", "scrape"]).is_err());
        assert!(Cli::try_parse_from(["branchmap", "scrape", "abb", "--all"]).is_err());

        let cli = Cli::try_parse_from(["branchmap", "-vv", "scrape", "abb", "afb"]).expect("parses");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Scrape(args) => assert_eq!(args.banks, ["abb", "afb"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn analyze_defaults_to_the_configured_focus_bank() {
        let cli = Cli::try_parse_from(["branchmap", "analyze", "--format", "table"]).expect("parses");

        assert_eq!(cli.format, OutputFormat::Table);
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.focus, DEFAULT_FOCUS_BANK);
                assert_eq!(args.report, PathBuf::from("docs/STRATEGIC_INSIGHTS.txt"));
                assert!(args.dataset.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
