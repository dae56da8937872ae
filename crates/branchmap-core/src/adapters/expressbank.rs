use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{degrees, field, SiteClient};
use crate::branch_source::{BranchSource, ScrapeFuture, SourceError};
use crate::domain::{coordinates_from, BankId, BranchRecord, Coordinates};
use crate::http_client::{HttpRequest, BROWSER_USER_AGENT};
use crate::text::collapse_whitespace;

pub const EXPRESSBANK_URL: &str = "https://www.expressbank.az/az/page/xidmet-sebekesi";

/// The service network page lists branches, ATMs and terminals together;
/// branches carry this category.
const BRANCH_CATEGORY: i64 = 1;

static FILIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\.filials\s*=\s*(\[.*?\]);").expect("filials pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpressBankBranch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub working_hours: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl BranchRecord for ExpressBankBranch {
    fn name(&self) -> &str {
        &self.name
    }

    fn coordinates(&self) -> Option<Coordinates> {
        coordinates_from(self.latitude, self.longitude)
    }
}

/// Only a numeric category matches; `"1"` is not a branch.
fn is_branch(entry: &Value) -> bool {
    entry
        .get("category_id")
        .and_then(Value::as_i64)
        .is_some_and(|category| category == BRANCH_CATEGORY)
}

fn branch_from(entry: &Value) -> ExpressBankBranch {
    let email = entry
        .get("languages")
        .and_then(Value::as_array)
        .and_then(|languages| languages.first())
        .map(|language| field(language, "mail"))
        .unwrap_or_default();

    // Coordinates count only when both halves are present.
    let coordinate = entry.get("coordinate").filter(|value| value.is_object());
    let (latitude, longitude) = match coordinate {
        Some(coordinate) => match (degrees(coordinate.get("lat")), degrees(coordinate.get("long"))) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            _ => (None, None),
        },
        None => (None, None),
    };

    ExpressBankBranch {
        id: field(entry, "id"),
        name: collapse_whitespace(&field(entry, "title")),
        address: collapse_whitespace(&field(entry, "addr")),
        phone: collapse_whitespace(&field(entry, "telephone_number")),
        email,
        working_hours: collapse_whitespace(&field(entry, "working_hours")),
        latitude,
        longitude,
    }
}

/// Extracts branches from the `window.filials` array embedded in the page.
pub fn parse_filials(html: &str) -> Result<Vec<ExpressBankBranch>, SourceError> {
    let blob = FILIALS
        .captures(html)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| SourceError::parse("could not find window.filials data"))?;

    let entries: Vec<Value> = serde_json::from_str(blob.as_str())
        .map_err(|error| SourceError::parse(format!("could not parse window.filials: {error}")))?;
    info!(entries = entries.len(), "found express bank service points");

    Ok(entries
        .iter()
        .filter(|entry| entry.is_object() && is_branch(entry))
        .map(branch_from)
        .collect())
}

pub struct ExpressBankAdapter {
    site: SiteClient,
    page_url: String,
}

impl ExpressBankAdapter {
    pub fn new(site: SiteClient) -> Self {
        Self {
            site,
            page_url: String::from(EXPRESSBANK_URL),
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }
}

impl BranchSource for ExpressBankAdapter {
    type Record = ExpressBankBranch;

    fn id(&self) -> BankId {
        BankId::ExpressBank
    }

    fn scrape<'a>(&'a self) -> ScrapeFuture<'a, ExpressBankBranch> {
        Box::pin(async move {
            let request =
                HttpRequest::get(&self.page_url).with_header("User-Agent", BROWSER_USER_AGENT);
            let html = self.site.fetch(BankId::ExpressBank, request).await?;
            let branches = parse_filials(&html)?;
            info!(branches = branches.len(), "filtered express bank branches");
            Ok(branches)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<script>
        window.filials = [
          {"id": 11, "category_id": 1, "title": "  Mərkəz   filialı ", "addr": "Bakı, Azadlıq pr. 1",
           "telephone_number": "(012) 000", "working_hours": "09:00 -\n 18:00",
           "languages": [{"mail": "info@expressbank.az"}],
           "coordinate": {"lat": "40.40", "long": "49.86"}},
          {"id": 12, "category_id": 2, "title": "ATM"},
          {"id": 13, "category_id": 1, "title": "Gəncə", "coordinate": {"lat": "40.68", "long": ""}},
          "noise"
        ];
        var other = [];
    </script>"#;

    #[test]
    fn keeps_branch_category_and_cleans_fields() {
        let branches = parse_filials(PAGE).expect("blob parses");

        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].id, "11");
        assert_eq!(branches[0].name, "Mərkəz filialı");
        assert_eq!(branches[0].working_hours, "09:00 - 18:00");
        assert_eq!(branches[0].email, "info@expressbank.az");
        assert_eq!(branches[0].latitude, Some(40.40));
        assert_eq!(branches[1].latitude, None);
        assert_eq!(branches[1].longitude, None);
    }

    #[test]
    fn quoted_category_is_not_a_branch() {
        let page = r#"window.filials = [
          {"id": 21, "category_id": "1", "title": "Quoted"},
          {"id": 22, "category_id": 1, "title": "Numeric"}
        ];"#;

        let branches = parse_filials(page).expect("blob parses");

        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "Numeric");
    }

    #[test]
    fn missing_blob_is_a_parse_error() {
        let error = parse_filials("<html></html>").expect_err("no data");
        assert_eq!(error.code(), "source.parse");
    }
}
