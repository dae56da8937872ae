use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{cell, degrees, field, join_texts, SiteClient};
use crate::branch_source::{BranchSource, ScrapeFuture, SourceError};
use crate::domain::{coordinates_from, BankId, BranchRecord, Coordinates};
use crate::http_client::{HttpRequest, BROWSER_USER_AGENT};
use crate::table::title_case_bool;

pub const ABB_URL: &str = "https://abb-bank.az/filiallar";

const ORIGIN: &str = "https://abb-bank.az";
const NEXT_ACTION: &str = "7fc053e9d43a5d68d83fe22333abfefe6fcd5650ef";
const ROUTER_STATE_TREE: &str = "%5B%22%22%2C%7B%22children%22%3A%5B%5B%22locale%22%2C%22az%22%2C%22d%22%5D%2C%7B%22children%22%3A%5B%5B%22slug%22%2C%22filiallar%22%2C%22oc%22%5D%2C%7B%22children%22%3A%5B%22__PAGE__%22%2C%7B%7D%2Cnull%2Cnull%5D%7D%2Cnull%2Cnull%5D%7D%2Cnull%2Cnull%2Ctrue%5D%7D%2Cnull%2Cnull%5D";

/// The branch finder only returns a subset per filter; querying each one and
/// merging gives the full list.
pub const ABB_FILTERS: [Option<&str>; 3] = [None, Some("open_on_weekends"), Some("safe_box")];

const WEEKEND_TAG: &str = "open_on_weekends";
const SAFE_BOX_TAG: &str = "safe_box";

/// ABB branch, columns in alphabetical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AbbBranch {
    pub address: String,
    pub branch_code: String,
    pub coordinates_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub director: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub emails: String,
    pub filter_tags: String,
    #[serde(serialize_with = "title_case_bool")]
    pub has_safe_box: bool,
    #[serde(serialize_with = "title_case_bool")]
    pub has_weekend_hours: bool,
    pub id: String,
    pub latitude: Option<f64>,
    pub locale: String,
    pub longitude: Option<f64>,
    pub nearby_metro: String,
    pub phone_numbers: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub services: String,
    pub title: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub work_time: String,
}

impl AbbBranch {
    fn from_item(item: &Value) -> Self {
        let coordinates = item.get("coordinates").filter(|value| value.is_object());
        let tags = item
            .get("filter_tags")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let tag_keys = tags.iter().map(|tag| field(tag, "key")).collect::<Vec<_>>();

        Self {
            address: field(item, "address"),
            branch_code: field(item, "branch_code"),
            coordinates_id: coordinates.map(|c| field(c, "id")).unwrap_or_default(),
            created_at: field(item, "createdAt"),
            director: field(item, "director"),
            document_id: field(item, "documentId"),
            emails: join_texts(item.get("emails"), "text"),
            filter_tags: tags
                .iter()
                .map(|tag| field(tag, "title"))
                .collect::<Vec<_>>()
                .join(" | "),
            has_safe_box: tag_keys.iter().any(|key| key == SAFE_BOX_TAG),
            has_weekend_hours: tag_keys.iter().any(|key| key == WEEKEND_TAG),
            id: field(item, "id"),
            latitude: coordinates.and_then(|c| degrees(c.get("lat"))),
            locale: field(item, "locale"),
            longitude: coordinates.and_then(|c| degrees(c.get("lng"))),
            nearby_metro: metro_stations(item.get("subways")),
            phone_numbers: join_texts(item.get("phone_numbers"), "text"),
            published_at: field(item, "publishedAt"),
            services: item
                .get("services")
                .and_then(Value::as_array)
                .map(|services| services.iter().map(cell).collect::<Vec<_>>().join(" | "))
                .unwrap_or_default(),
            title: field(item, "title"),
            updated_at: field(item, "updatedAt"),
            work_time: join_texts(item.get("work_time"), "text"),
        }
    }

    /// Number of populated columns, used to pick the richer duplicate.
    fn filled_fields(&self) -> usize {
        let texts = [
            &self.address,
            &self.branch_code,
            &self.coordinates_id,
            &self.created_at,
            &self.director,
            &self.document_id,
            &self.emails,
            &self.filter_tags,
            &self.id,
            &self.locale,
            &self.nearby_metro,
            &self.phone_numbers,
            &self.published_at,
            &self.services,
            &self.title,
            &self.updated_at,
            &self.work_time,
        ];
        texts.iter().filter(|text| !text.is_empty()).count()
            + usize::from(self.has_safe_box)
            + usize::from(self.has_weekend_hours)
            + usize::from(self.latitude.is_some())
            + usize::from(self.longitude.is_some())
    }
}

impl BranchRecord for AbbBranch {
    fn name(&self) -> &str {
        &self.title
    }

    fn coordinates(&self) -> Option<Coordinates> {
        coordinates_from(self.latitude, self.longitude)
    }
}

fn metro_stations(subways: Option<&Value>) -> String {
    subways
        .and_then(Value::as_array)
        .map(|stations| {
            stations
                .iter()
                .map(|station| {
                    format!(
                        "{} ({}, {} line)",
                        field(station, "name"),
                        field(station, "time"),
                        field(station, "color")
                    )
                })
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .unwrap_or_default()
}

/// Parses a server-action response. Branch data sits on the first line
/// prefixed with `1:`; a response without that line holds no branches.
pub fn parse_rsc_payload(body: &str) -> Result<Vec<AbbBranch>, SourceError> {
    let Some(payload) = body.lines().find_map(|line| line.strip_prefix("1:")) else {
        return Ok(Vec::new());
    };

    let items: Value = serde_json::from_str(payload)
        .map_err(|error| SourceError::parse(format!("abb payload is not JSON: {error}")))?;
    let items = items
        .as_array()
        .ok_or_else(|| SourceError::parse("abb payload is not an array"))?;

    Ok(items
        .iter()
        .filter(|item| item.is_object())
        .map(AbbBranch::from_item)
        .collect())
}

/// Merges filter batches by `documentId`, keeping first-seen order and the
/// duplicate with more populated fields. Records without an id are dropped.
pub(crate) fn merge_by_document_id(batches: Vec<Vec<AbbBranch>>) -> Vec<AbbBranch> {
    let mut merged: Vec<AbbBranch> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for branch in batches.into_iter().flatten() {
        if branch.document_id.is_empty() {
            continue;
        }
        match positions.get(&branch.document_id).copied() {
            Some(position) => {
                if branch.filled_fields() > merged[position].filled_fields() {
                    merged[position] = branch;
                }
            }
            None => {
                positions.insert(branch.document_id.clone(), merged.len());
                merged.push(branch);
            }
        }
    }

    merged
}

pub struct AbbAdapter {
    site: SiteClient,
    page_url: String,
}

impl AbbAdapter {
    pub fn new(site: SiteClient) -> Self {
        Self {
            site,
            page_url: String::from(ABB_URL),
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }

    fn request(&self, filter: Option<&str>) -> HttpRequest {
        let body = match filter {
            Some(key) => Value::Array(vec![Value::String(key.to_owned())]).to_string(),
            None => String::from("[]"),
        };

        HttpRequest::post(&self.page_url)
            .with_header("Accept", "text/x-component")
            .with_header("Accept-Language", "en-GB,en-US;q=0.9,en;q=0.8,ru;q=0.7,az;q=0.6")
            .with_header("Content-Type", "text/plain;charset=UTF-8")
            .with_header("Origin", ORIGIN)
            .with_header("Referer", ABB_URL)
            .with_header("User-Agent", BROWSER_USER_AGENT)
            .with_header("next-action", NEXT_ACTION)
            .with_header("next-router-state-tree", ROUTER_STATE_TREE)
            .with_body(body)
    }

    async fn fetch_filter(&self, filter: Option<&str>) -> Result<Vec<AbbBranch>, SourceError> {
        let body = self.site.fetch(BankId::Abb, self.request(filter)).await?;
        let branches = match parse_rsc_payload(&body) {
            Ok(branches) => branches,
            Err(error) => {
                warn!(filter = filter.unwrap_or("all"), %error, "could not parse abb response");
                Vec::new()
            }
        };
        info!(filter = filter.unwrap_or("all"), branches = branches.len(), "extracted abb branches");
        Ok(branches)
    }
}

impl BranchSource for AbbAdapter {
    type Record = AbbBranch;

    fn id(&self) -> BankId {
        BankId::Abb
    }

    fn scrape<'a>(&'a self) -> ScrapeFuture<'a, AbbBranch> {
        Box::pin(async move {
            let mut batches = Vec::with_capacity(ABB_FILTERS.len());
            let mut last_error = None;

            for filter in ABB_FILTERS {
                match self.fetch_filter(filter).await {
                    Ok(batch) => batches.push(batch),
                    Err(error) => {
                        warn!(filter = filter.unwrap_or("all"), %error, "abb filter request failed");
                        last_error = Some(error);
                    }
                }
            }

            match (batches.is_empty(), last_error) {
                (true, Some(error)) => Err(error),
                _ => Ok(merge_by_document_id(batches)),
            }
        })
    }

    fn extras(&self, records: &[AbbBranch]) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            (
                "weekend_hours",
                records.iter().filter(|branch| branch.has_weekend_hours).count(),
            ),
            (
                "safe_box",
                records.iter().filter(|branch| branch.has_safe_box).count(),
            ),
        ])
    }
}
