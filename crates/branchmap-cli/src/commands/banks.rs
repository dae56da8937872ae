use branchmap_core::{BankId, BANK_FILES};
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct Extractor {
    id: BankId,
    bank_name: &'static str,
    file: &'static str,
    geocoded: bool,
}

#[derive(Debug, Serialize)]
struct MappedFile {
    file: &'static str,
    bank_name: &'static str,
    extractor: Option<BankId>,
}

#[derive(Debug, Serialize)]
struct BanksResponseData {
    extractors: Vec<Extractor>,
    combine_mapping: Vec<MappedFile>,
}

pub fn run() -> Result<CommandResult, CliError> {
    let extractors = BankId::ALL
        .into_iter()
        .map(|id| Extractor {
            id,
            bank_name: id.display_name(),
            file: id.file_name(),
            geocoded: id.needs_geocoding(),
        })
        .collect();

    let combine_mapping = BANK_FILES
        .iter()
        .map(|&(file, bank_name)| MappedFile {
            file,
            bank_name,
            extractor: BankId::ALL.into_iter().find(|id| id.file_name() == file),
        })
        .collect();

    let data = serde_json::to_value(BanksResponseData {
        extractors,
        combine_mapping,
    })?;
    Ok(CommandResult::ok(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_extractor_feeds_the_combine_mapping() {
        let result = run().expect("banks listed");

        let extractors = result.data["extractors"].as_array().expect("extractors");
        let mapping = result.data["combine_mapping"].as_array().expect("mapping");
        assert_eq!(extractors.len(), BankId::ALL.len());
        assert_eq!(mapping.len(), BANK_FILES.len());
        let linked = mapping
            .iter()
            .filter(|entry| !entry["extractor"].is_null())
            .count();
        assert_eq!(linked, BankId::ALL.len());
        assert_eq!(extractors[0]["id"], "abb");
    }
}
