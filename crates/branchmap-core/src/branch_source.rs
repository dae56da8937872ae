//! Extractor contract and run summaries.
//!
//! Every bank extractor implements [`BranchSource`]: one call fetches the
//! bank's page(s) and returns typed records, which
//! [`scrape_to_table`] writes to `<data_dir>/<bank>_branches.csv`.
//!
//! | Bank | Page format | Coordinates |
//! |------|-------------|-------------|
//! | ABB | RSC payload (POST) | native |
//! | ASB | HTML attributes | native |
//! | AFB | HTML list | geocoded |
//! | Express Bank | inline JSON | native |
//! | Turan Bank | HTML headings | geocoded |

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::domain::{BankId, BranchRecord};
use crate::error::CoreError;
use crate::http_client::{HttpError, HttpResponse};
use crate::table::{write_table, TableOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    Unavailable,
    Upstream,
    Parse,
    Internal,
}

/// Failure of a single extractor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn upstream_status(bank: BankId, status: u16) -> Self {
        Self {
            kind: SourceErrorKind::Upstream,
            message: format!("{bank} page returned status {status}"),
            retryable: status >= 500,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    /// Maps a transport error raised while fetching `bank`'s page.
    pub fn transport(bank: BankId, error: &HttpError) -> Self {
        let message = format!("{bank} transport error: {}", error.message());
        if error.retryable() {
            Self::unavailable(message)
        } else {
            Self {
                kind: SourceErrorKind::Unavailable,
                message,
                retryable: false,
            }
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Upstream => "source.upstream_status",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Returns the body of a successful page response.
pub(crate) fn page_body(
    bank: BankId,
    outcome: Result<HttpResponse, HttpError>,
) -> Result<String, SourceError> {
    let response = outcome.map_err(|error| SourceError::transport(bank, &error))?;
    if !response.is_success() {
        return Err(SourceError::upstream_status(bank, response.status));
    }
    Ok(response.body)
}

pub type ScrapeFuture<'a, R> =
    Pin<Box<dyn Future<Output = Result<Vec<R>, SourceError>> + Send + 'a>>;

/// One-shot extractor for a single bank website.
pub trait BranchSource: Send + Sync {
    type Record: BranchRecord;

    fn id(&self) -> BankId;

    fn scrape<'a>(&'a self) -> ScrapeFuture<'a, Self::Record>;

    /// Bank-specific counters reported next to the totals.
    fn extras(&self, records: &[Self::Record]) -> BTreeMap<&'static str, usize> {
        let _ = records;
        BTreeMap::new()
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Table(#[from] CoreError),
}

/// Outcome of one extractor run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeSummary {
    pub bank: BankId,
    pub bank_name: &'static str,
    pub branches: usize,
    pub with_coordinates: usize,
    /// `None` when no branches were found and no file was written.
    pub output: Option<PathBuf>,
    pub extras: BTreeMap<&'static str, usize>,
}

/// Runs `source` and writes its records into `data_dir`.
pub async fn scrape_to_table<S: BranchSource>(
    source: &S,
    data_dir: &Path,
) -> Result<ScrapeSummary, ScrapeError> {
    let bank = source.id();
    info!(bank = %bank, "scraping branches");
    let records = source.scrape().await?;

    let with_coordinates = records.iter().filter(|record| record.has_coordinates()).count();
    let path = data_dir.join(bank.file_name());
    let output = match write_table(&path, &records)? {
        TableOutcome::Written { rows } => {
            info!(bank = %bank, rows, path = %path.display(), "saved branches");
            Some(path)
        }
        TableOutcome::Skipped => {
            info!(bank = %bank, "no branches found to save");
            None
        }
    };

    Ok(ScrapeSummary {
        bank,
        bank_name: bank.display_name(),
        branches: records.len(),
        with_coordinates,
        output,
        extras: source.extras(&records),
    })
}
