use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::info;

use super::{selector, SiteClient};
use crate::branch_source::{BranchSource, ScrapeFuture};
use crate::domain::{coordinates_from, BankId, BranchRecord, Coordinates};
use crate::http_client::{HttpRequest, BROWSER_USER_AGENT};
use crate::text::clean_text;

pub const ASB_URL: &str = "https://www.asb.az/az/filiallar";

static MAP_POINT: LazyLock<Selector> = LazyLock::new(|| selector("a.map-point"));

static OPENING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Filialın açılma tarixi\s*-\s*([\d.]+)").expect("opening date pattern is valid")
});
static LICENSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Lisenziya nömrəsi\s*[–-]\s*([\d/]+)").expect("license pattern is valid")
});
static ACTIVITIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Fəaliyyət növləri\s*[–-]\s*([^<\n]+?)\s*(?:Filialın|$)")
        .expect("activity pattern is valid")
});
static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"İş vaxtı:\s*([^<\n]+?)\s*(?:Fəaliyyət|$)").expect("hours pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AsbBranch {
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: String,
    pub working_hours: String,
    pub activity_types: String,
    pub opening_date: String,
    pub license_number: String,
}

impl BranchRecord for AsbBranch {
    fn name(&self) -> &str {
        &self.name
    }

    fn coordinates(&self) -> Option<Coordinates> {
        coordinates_from(self.latitude, self.longitude)
    }
}

fn first_group(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().trim().to_owned())
}

/// Splits `data-lat_lng` ("lat,lng"); anything but two numeric parts is ignored.
fn split_lat_lng(raw: &str) -> (Option<f64>, Option<f64>) {
    let parts = raw.split(',').map(str::trim).collect::<Vec<_>>();
    match parts.as_slice() {
        [lat, lng] => (lat.parse().ok(), lng.parse().ok()),
        _ => (None, None),
    }
}

fn is_branch(title: &str) -> bool {
    !title.starts_with("ATM") && !title.contains("Test Terminal")
}

/// Branch markers on the map page. ATMs and test terminals share the markup
/// and are skipped by title.
pub fn parse_map_points(html: &str) -> Vec<AsbBranch> {
    let document = Html::parse_document(html);

    document
        .select(&MAP_POINT)
        .filter_map(|point| {
            let attr = |name: &str| point.value().attr(name).unwrap_or_default();
            let title = attr("title").trim();
            if !is_branch(title) {
                return None;
            }

            let worktime = clean_text(attr("data-worktime"));
            let (latitude, longitude) = split_lat_lng(attr("data-lat_lng").trim());
            let working_hours = first_group(&HOURS, &worktime)
                .map(|hours| format!("İş vaxtı: {hours}"))
                .unwrap_or_else(|| worktime.clone());

            Some(AsbBranch {
                name: title.to_owned(),
                address: clean_text(attr("data-address")),
                latitude,
                longitude,
                phone: attr("data-phone").trim().to_owned(),
                activity_types: first_group(&ACTIVITIES, &worktime).unwrap_or_default(),
                opening_date: first_group(&OPENING_DATE, &worktime).unwrap_or_default(),
                license_number: first_group(&LICENSE, &worktime).unwrap_or_default(),
                working_hours,
            })
        })
        .collect()
}

pub struct AsbAdapter {
    site: SiteClient,
    page_url: String,
}

impl AsbAdapter {
    pub fn new(site: SiteClient) -> Self {
        Self {
            site,
            page_url: String::from(ASB_URL),
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }
}

impl BranchSource for AsbAdapter {
    type Record = AsbBranch;

    fn id(&self) -> BankId {
        BankId::Asb
    }

    fn scrape<'a>(&'a self) -> ScrapeFuture<'a, AsbBranch> {
        Box::pin(async move {
            let request =
                HttpRequest::get(&self.page_url).with_header("User-Agent", BROWSER_USER_AGENT);
            let html = self.site.fetch(BankId::Asb, request).await?;
            let branches = parse_map_points(&html);
            info!(branches = branches.len(), "extracted asb branches");
            Ok(branches)
        })
    }
}
