//! Merge of the per-bank tables into one `bank_name,lat,long` dataset.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::Coordinates;
use crate::error::CoreError;
use crate::table::{write_table, TableOutcome};

pub const COMBINED_FILE: &str = "combined_atms.csv";

/// Per-bank table file names and the bank name each contributes, in merge
/// order. Files without an extractor here come from other collectors.
pub const BANK_FILES: [(&str, &str); 20] = [
    ("ab_branches.csv", "AccessBank"),
    ("abb_branches.csv", "ABB Bank"),
    ("asb_branches.csv", "ASB Bank"),
    ("bob_branches.csv", "Bank of Baku"),
    ("br_branches.csv", "Bank Respublika"),
    ("kb_branches.csv", "Kapital Bank"),
    ("premium_branches.csv", "Premium Bank"),
    ("rabita_branches.csv", "Rabita Bank"),
    ("vtb_branches.csv", "VTB Bank"),
    ("xalq_branches.csv", "Xalq Bank"),
    ("yelo_branches.csv", "Yelo Bank"),
    ("ub_branches.csv", "Unibank"),
    ("atb_branches.csv", "AzerTurk Bank"),
    ("afb_branches.csv", "AFB"),
    ("expressbank_branches.csv", "Express Bank"),
    ("turanbank_branches.csv", "Turan Bank"),
    ("yapikredi_branches.csv", "Yapi Kredi Bank"),
    ("ziraatbank_branches.csv", "Ziraat Bank"),
    ("pashabank_branches.csv", "Pasha Bank"),
    ("btb_branches.csv", "BTB"),
];

const LATITUDE_COLUMNS: [&str; 2] = ["latitude", "lat"];
const LONGITUDE_COLUMNS: [&str; 3] = ["longitude", "long", "lon"];

/// One row of the combined dataset. Coordinates keep their source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub bank_name: String,
    pub lat: String,
    pub long: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum FileStatus {
    Read,
    Missing,
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub bank_name: String,
    pub rows: usize,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombineReport {
    pub files: Vec<FileReport>,
    pub total: usize,
    /// Row count per bank, ordered by bank name.
    pub by_bank: BTreeMap<String, usize>,
    /// `None` when no rows survived and nothing was written.
    pub output: Option<PathBuf>,
    pub examples: Vec<CombinedRow>,
}

impl CombineReport {
    pub fn warnings(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|report| match &report.status {
                FileStatus::Read => None,
                FileStatus::Missing => Some(format!("file not found: {}", report.file)),
                FileStatus::Unreadable(reason) => {
                    Some(format!("could not read {}: {reason}", report.file))
                }
            })
            .collect()
    }
}

fn first_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|name| headers.iter().position(|header| header == *name))
}

/// Rows of one per-bank table that carry usable coordinates.
pub fn read_bank_file(path: &Path, bank_name: &str) -> Result<Vec<CombinedRow>, CoreError> {
    let file = File::open(path).map_err(|error| CoreError::io(path, error))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .map_err(|error| CoreError::csv(path, error))?
        .clone();

    let (Some(lat_index), Some(lon_index)) = (
        first_column(&headers, &LATITUDE_COLUMNS),
        first_column(&headers, &LONGITUDE_COLUMNS),
    ) else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| CoreError::csv(path, error))?;
        let lat = record.get(lat_index).unwrap_or_default();
        let long = record.get(lon_index).unwrap_or_default();
        if lat.is_empty() || long.is_empty() || Coordinates::parse_pair(lat, long).is_err() {
            continue;
        }
        rows.push(CombinedRow {
            bank_name: bank_name.to_owned(),
            lat: lat.to_owned(),
            long: long.to_owned(),
        });
    }
    Ok(rows)
}

/// Reads every mapped table in `data_dir` and writes the combined dataset.
#[derive(Debug, Clone)]
pub struct Combiner {
    data_dir: PathBuf,
    output: PathBuf,
    mapping: Vec<(String, String)>,
}

impl Combiner {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            output: data_dir.join(COMBINED_FILE),
            data_dir,
            mapping: BANK_FILES
                .iter()
                .map(|(file, bank)| ((*file).to_owned(), (*bank).to_owned()))
                .collect(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_mapping(mut self, mapping: Vec<(String, String)>) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn run(&self) -> Result<CombineReport, CoreError> {
        let mut combined = Vec::new();
        let mut files = Vec::with_capacity(self.mapping.len());

        for (file, bank_name) in &self.mapping {
            let path = self.data_dir.join(file);
            let (rows, status) = match read_bank_file(&path, bank_name) {
                Ok(rows) => (rows, FileStatus::Read),
                Err(CoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    warn!(file = %path.display(), "file not found");
                    (Vec::new(), FileStatus::Missing)
                }
                Err(error) => {
                    warn!(file = %path.display(), %error, "could not read bank file");
                    (Vec::new(), FileStatus::Unreadable(error.to_string()))
                }
            };
            info!(bank = %bank_name, rows = rows.len(), "read branches with coordinates");

            files.push(FileReport {
                file: file.clone(),
                bank_name: bank_name.clone(),
                rows: rows.len(),
                status,
            });
            combined.extend(rows);
        }

        let mut by_bank = BTreeMap::new();
        for row in &combined {
            *by_bank.entry(row.bank_name.clone()).or_insert(0) += 1;
        }

        let output = match write_table(&self.output, &combined)? {
            TableOutcome::Written { rows } => {
                info!(rows, path = %self.output.display(), "saved combined branches");
                Some(self.output.clone())
            }
            TableOutcome::Skipped => {
                warn!("no branches to save");
                None
            }
        };

        Ok(CombineReport {
            total: combined.len(),
            examples: combined.iter().take(3).cloned().collect(),
            files,
            by_bank,
            output,
        })
    }
}
