use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::info;

use super::{selector, strip_label, SiteClient};
use crate::branch_source::{BranchSource, ScrapeFuture};
use crate::domain::{coordinates_from, BankId, BranchRecord, Coordinates};
use crate::geocode::{AddressProfile, Geocoder};
use crate::http_client::{HttpRequest, BROWSER_USER_AGENT};
use crate::text::element_text;

pub const TURANBANK_URL: &str = "https://www.turanbank.az/az/pages/2/155";

static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AZ\d+,\s*").expect("postal code pattern is valid"));

const ADDRESS_LABEL: &str = "Ünvan:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuranListing {
    pub name: String,
    pub address: String,
    pub working_hours: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TuranBankBranch {
    pub name: String,
    pub address: String,
    pub working_hours: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl BranchRecord for TuranBankBranch {
    fn name(&self) -> &str {
        &self.name
    }

    fn coordinates(&self) -> Option<Coordinates> {
        coordinates_from(self.latitude, self.longitude)
    }
}

fn looks_like_hours(text: &str) -> bool {
    text.contains("Bazar ertəsi") || text.contains("9:00")
}

fn listing_from(heading: ElementRef<'_>) -> Option<TuranListing> {
    let name = element_text(heading);
    if name.is_empty() {
        return None;
    }
    let container = heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "div")?;

    let mut address = String::new();
    let mut working_hours = String::new();
    for paragraph in container.select(&PARAGRAPH) {
        let text = element_text(paragraph);
        if text.contains(ADDRESS_LABEL) && address.is_empty() {
            address = POSTAL_CODE
                .replace(&strip_label(&text, ADDRESS_LABEL), "")
                .into_owned();
        } else if looks_like_hours(&text) && working_hours.is_empty() {
            working_hours = text;
        }
    }

    if address.is_empty() {
        return None;
    }
    Some(TuranListing {
        name,
        address,
        working_hours,
    })
}

/// One branch per `h1`; details live in paragraphs of the enclosing `div`.
pub fn parse_branch_headings(html: &str) -> Vec<TuranListing> {
    let document = Html::parse_document(html);
    let headings = document.select(&HEADING).collect::<Vec<_>>();
    info!(headings = headings.len(), "found turan bank headings");

    headings.into_iter().filter_map(listing_from).collect()
}

pub struct TuranBankAdapter {
    site: SiteClient,
    geocoder: Arc<Geocoder>,
    page_url: String,
}

impl TuranBankAdapter {
    /// `site` should accept invalid certificates; the bank's chain is incomplete.
    pub fn new(site: SiteClient, geocoder: Arc<Geocoder>) -> Self {
        Self {
            site,
            geocoder,
            page_url: String::from(TURANBANK_URL),
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }
}

impl BranchSource for TuranBankAdapter {
    type Record = TuranBankBranch;

    fn id(&self) -> BankId {
        BankId::TuranBank
    }

    fn scrape<'a>(&'a self) -> ScrapeFuture<'a, TuranBankBranch> {
        Box::pin(async move {
            let request =
                HttpRequest::get(&self.page_url).with_header("User-Agent", BROWSER_USER_AGENT);
            let html = self.site.fetch(BankId::TuranBank, request).await?;
            let listings = parse_branch_headings(&html);

            let mut branches = Vec::with_capacity(listings.len());
            for listing in listings {
                info!(branch = %listing.name, "geocoding branch");
                let coordinates = self
                    .geocoder
                    .resolve(&listing.address, &AddressProfile::TURAN)
                    .await
                    .map(|hit| hit.coordinates);
                branches.push(TuranBankBranch {
                    name: listing.name,
                    address: listing.address,
                    working_hours: listing.working_hours,
                    latitude: coordinates.map(|c| c.lat),
                    longitude: coordinates.map(|c| c.lon),
                });
            }
            Ok(branches)
        })
    }

    fn extras(&self, records: &[TuranBankBranch]) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([(
            "geocoded",
            records.iter().filter(|branch| branch.has_coordinates()).count(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <h1>Filiallar</h1>
        <div class="branch">
          <h1>Zaqatala filialı</h1>
          <p>Ünvan: AZ6200, Zaqatala şəh., Heydər Əliyev pr. 3</p>
          <p>Bazar ertəsi - Cümə: 09:00 - 18:00</p>
          <p>Ünvan: second address is ignored</p>
        </div>
        <div><h1>Təmirdə</h1><p>Tezliklə</p></div>"#;

    #[test]
    fn headings_with_address_become_listings() {
        let listings = parse_branch_headings(PAGE);

        assert_eq!(
            listings,
            vec![TuranListing {
                name: String::from("Zaqatala filialı"),
                address: String::from("Zaqatala şəh., Heydər Əliyev pr. 3"),
                working_hours: String::from("Bazar ertəsi - Cümə: 09:00 - 18:00"),
            }]
        );
    }

    #[test]
    fn hours_are_recognised_by_weekday_or_opening_time() {
        assert!(looks_like_hours("Bazar ertəsi - Şənbə"));
        assert!(looks_like_hours("09:00-17:00"));
        assert!(!looks_like_hours("Tel: 012"));
    }
}
