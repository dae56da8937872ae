mod analyze;
mod banks;
mod combine;
mod scrape;

use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    /// Units of work that failed without aborting the command.
    pub failed: usize,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            failed: 0,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_failed(mut self, failed: usize) -> Self {
        self.failed = failed;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Banks => banks::run(),
        Command::Scrape(args) => scrape::run(args, &cli.data_dir, cli.timeout_ms).await,
        Command::Combine(args) => combine::run(args, &cli.data_dir),
        Command::Analyze(args) => analyze::run(args, &cli.data_dir).await,
    }
}
