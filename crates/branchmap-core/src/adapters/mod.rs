//! Per-bank extractors.

mod abb;
mod afb;
mod asb;
mod expressbank;
mod turanbank;

use std::sync::Arc;

use scraper::Selector;
use serde_json::Value;

pub use abb::{parse_rsc_payload, AbbAdapter, AbbBranch, ABB_FILTERS};
pub use afb::{parse_branch_list, AfbAdapter, AfbBranch, AfbListing};
pub use asb::{parse_map_points, AsbAdapter, AsbBranch};
pub use expressbank::{parse_filials, ExpressBankAdapter, ExpressBankBranch};
pub use turanbank::{parse_branch_headings, TuranBankAdapter, TuranBankBranch, TuranListing};

use crate::branch_source::{page_body, SourceError};
use crate::domain::BankId;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::{fetch_with_retry, RetryConfig};

/// Transport settings shared by every extractor's page fetch.
#[derive(Clone)]
pub struct SiteClient {
    http_client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl SiteClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            retry: RetryConfig::default(),
            timeout_ms: 30_000,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub(crate) async fn fetch(&self, bank: BankId, request: HttpRequest) -> Result<String, SourceError> {
        let request = request.with_timeout_ms(self.timeout_ms);
        page_body(
            bank,
            fetch_with_retry(self.http_client.as_ref(), request, &self.retry).await,
        )
    }
}

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Renders a JSON scalar the way it should appear in a CSV cell.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn field(object: &Value, key: &str) -> String {
    object.get(key).map(cell).unwrap_or_default()
}

/// Degrees given either as a JSON number or as numeric text.
pub(crate) fn degrees(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Joins the `text` members of an array of objects with ` | `.
pub(crate) fn join_texts(value: Option<&Value>, key: &str) -> String {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| field(item, key))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .unwrap_or_default()
}

/// `text` with every occurrence of `label` removed, trimmed.
pub(crate) fn strip_label(text: &str, label: &str) -> String {
    text.replace(label, "").trim().to_owned()
}
