use std::path::Path;

use branchmap_core::{BankId, ScrapeConfig, ScrapeError, ScrapeSession, ScrapeSummary};
use serde::Serialize;
use tracing::warn;

use crate::cli::ScrapeArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct BankFailure {
    bank: BankId,
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ScrapeResponseData {
    scraped: Vec<ScrapeSummary>,
    failed: Vec<BankFailure>,
}

fn selected_banks(args: &ScrapeArgs) -> Result<Vec<BankId>, CliError> {
    if args.all {
        return Ok(BankId::ALL.to_vec());
    }

    let mut banks = Vec::with_capacity(args.banks.len());
    for raw in &args.banks {
        let bank = raw.parse::<BankId>()?;
        if !banks.contains(&bank) {
            banks.push(bank);
        }
    }
    if banks.is_empty() {
        return Err(CliError::Command(String::from("no banks selected")));
    }
    Ok(banks)
}

fn failure(bank: BankId, error: &ScrapeError) -> BankFailure {
    let (code, message) = match error {
        ScrapeError::Source(source) => (source.code(), source.message().to_owned()),
        ScrapeError::Table(table) => ("table.write", table.to_string()),
    };
    BankFailure { bank, code, message }
}

pub async fn run(args: &ScrapeArgs, data_dir: &Path, timeout_ms: u64) -> Result<CommandResult, CliError> {
    let banks = selected_banks(args)?;
    let config = ScrapeConfig::from_env().with_page_timeout_ms(timeout_ms);
    let session = ScrapeSession::from_config(&config)
        .map_err(|error| CliError::Command(format!("could not build http client: {}", error.message())))?;

    let mut scraped = Vec::new();
    let mut failed = Vec::new();
    for bank in banks {
        match session.scrape(bank, data_dir).await {
            Ok(summary) => scraped.push(summary),
            Err(error) => {
                warn!(bank = %bank, %error, "scrape failed");
                failed.push(failure(bank, &error));
            }
        }
    }

    let warnings = failed
        .iter()
        .map(|failure| format!("{} failed: {}", failure.bank, failure.message))
        .chain(
            scraped
                .iter()
                .filter(|summary| summary.output.is_none())
                .map(|summary| format!("{}: no branches found, nothing written", summary.bank)),
        )
        .collect();
    let failed_count = failed.len();
    let data = serde_json::to_value(ScrapeResponseData { scraped, failed })?;

    Ok(CommandResult::ok(data)
        .with_warnings(warnings)
        .with_failed(failed_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(banks: &[&str], all: bool) -> ScrapeArgs {
        ScrapeArgs {
            banks: banks.iter().map(|bank| (*bank).to_owned()).collect(),
            all,
        }
    }

    #[test]
    fn selection_parses_and_deduplicates_bank_ids() {
        let banks = selected_banks(&args(&["TuranBank", "abb", "turanbank"], false)).expect("valid");

        assert_eq!(banks, [BankId::TuranBank, BankId::Abb]);
    }

    #[test]
    fn all_selects_every_extractor() {
        assert_eq!(selected_banks(&args(&[], true)).expect("valid"), BankId::ALL);
    }

    #[test]
    fn unknown_bank_is_a_validation_error() {
        let error = selected_banks(&args(&["nobank"], false)).expect_err("invalid bank");

        assert!(matches!(error, CliError::Validation(_)));
        assert_eq!(error.exit_code(), 2);
    }
}
