use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::info;

use super::{selector, strip_label, SiteClient};
use crate::branch_source::{BranchSource, ScrapeFuture, SourceError};
use crate::domain::{coordinates_from, BankId, BranchRecord, Coordinates};
use crate::geocode::{AddressProfile, Geocoder};
use crate::http_client::{HttpRequest, BROWSER_USER_AGENT};
use crate::text::element_text;

pub const AFB_URL: &str = "https://afb.az/filiallar";

static BRANCH_LIST: LazyLock<Selector> = LazyLock::new(|| selector("ul.service_network_list"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h4"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));

const DETAIL_CLASS: &str = "work_hour_p";

/// A branch as listed on the page, before geocoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AfbListing {
    pub city_class: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub working_hours: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AfbBranch {
    pub city_class: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub working_hours: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl BranchRecord for AfbBranch {
    fn name(&self) -> &str {
        &self.name
    }

    fn coordinates(&self) -> Option<Coordinates> {
        coordinates_from(self.latitude, self.longitude)
    }
}

impl AfbBranch {
    fn located(listing: AfbListing, coordinates: Option<Coordinates>) -> Self {
        Self {
            city_class: listing.city_class,
            name: listing.name,
            address: listing.address,
            phone: listing.phone,
            email: listing.email,
            working_hours: listing.working_hours,
            latitude: coordinates.map(|c| c.lat),
            longitude: coordinates.map(|c| c.lon),
        }
    }
}

fn listing_from(item: ElementRef<'_>) -> Option<AfbListing> {
    let name = item
        .select(&HEADING)
        .next()
        .map(element_text)
        .unwrap_or_default();
    if name.is_empty() {
        return None;
    }

    let mut listing = AfbListing {
        city_class: item
            .value()
            .classes()
            .find(|class| class.starts_with("city_"))
            .unwrap_or_default()
            .to_owned(),
        name,
        ..AfbListing::default()
    };

    for paragraph in item.select(&PARAGRAPH) {
        let is_detail = paragraph.value().classes().any(|class| class == DETAIL_CLASS);
        let text = element_text(paragraph);

        if !is_detail && listing.address.is_empty() {
            listing.address = text;
        } else if is_detail {
            if text.starts_with("Tel:") {
                listing.phone = strip_label(&text, "Tel:");
            } else if text.starts_with("E-mail:") {
                listing.email = strip_label(&text, "E-mail:");
            } else if text.starts_with("İş rejimi:") {
                listing.working_hours = strip_label(&text, "İş rejimi:");
            }
        }
    }

    Some(listing)
}

/// Branches from the first service network list on the page.
pub fn parse_branch_list(html: &str) -> Result<Vec<AfbListing>, SourceError> {
    let document = Html::parse_document(html);
    let list = document
        .select(&BRANCH_LIST)
        .next()
        .ok_or_else(|| SourceError::parse("could not find the afb service network list"))?;

    Ok(list.select(&ITEM).filter_map(listing_from).collect())
}

pub struct AfbAdapter {
    site: SiteClient,
    geocoder: Arc<Geocoder>,
    page_url: String,
}

impl AfbAdapter {
    /// `site` should accept invalid certificates; the bank's chain is incomplete.
    pub fn new(site: SiteClient, geocoder: Arc<Geocoder>) -> Self {
        Self {
            site,
            geocoder,
            page_url: String::from(AFB_URL),
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }
}

impl BranchSource for AfbAdapter {
    type Record = AfbBranch;

    fn id(&self) -> BankId {
        BankId::Afb
    }

    fn scrape<'a>(&'a self) -> ScrapeFuture<'a, AfbBranch> {
        Box::pin(async move {
            let request =
                HttpRequest::get(&self.page_url).with_header("User-Agent", BROWSER_USER_AGENT);
            let html = self.site.fetch(BankId::Afb, request).await?;
            let listings = parse_branch_list(&html)?;
            info!(branches = listings.len(), "found afb branches");

            let mut branches = Vec::with_capacity(listings.len());
            for listing in listings {
                info!(branch = %listing.name, "geocoding branch");
                let hit = self
                    .geocoder
                    .resolve(&listing.address, &AddressProfile::AFB)
                    .await;
                branches.push(AfbBranch::located(listing, hit.map(|hit| hit.coordinates)));
            }
            Ok(branches)
        })
    }

    fn extras(&self, records: &[AfbBranch]) -> BTreeMap<&'static str, usize> {
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
        <ul class="service_network_list">
          <li class="item city_8 active">
            <h4>Baş ofis</h4>
            <p>Bakı ş., Nizami küç. 12</p>
            <p class="work_hour_p">Tel: (012) 565-00-00</p>
            <p class="work_hour_p">E-mail: office@afb.az</p>
            <p class="work_hour_p">İş rejimi: 09:00 - 18:00</p>
            <p>ignored second address</p>
          </li>
          <li class="city_127"><h4>  </h4><p>no name</p></li>
        </ul>
        <ul class="service_network_list"><li><h4>Second list</h4></li></ul>"#;

    #[test]
    fn reads_the_first_list_and_labelled_details() {
        let listings = parse_branch_list(PAGE).expect("list exists");

        assert_eq!(
            listings,
            vec![AfbListing {
                city_class: String::from("city_8"),
                name: String::from("Baş ofis"),
                address: String::from("Bakı ş., Nizami küç. 12"),
                phone: String::from("(012) 565-00-00"),
                email: String::from("office@afb.az"),
                working_hours: String::from("09:00 - 18:00"),
            }]
        );
    }

    #[test]
    fn line_break_in_the_address_adds_no_space() {
        let page = r#"<ul class="service_network_list"><li class="city_8">
            <h4>Yasamal</h4><p>Bakı ş.,<br/>Şərifzadə küç. 7</p></li></ul>"#;

        let listings = parse_branch_list(page).expect("list exists");

        assert_eq!(listings[0].address, "Bakı ş.,Şərifzadə küç. 7");
    }

    #[test]
    fn page_without_list_is_a_parse_error() {
        assert!(parse_branch_list("<p>maintenance</p>").is_err());
    }
}
