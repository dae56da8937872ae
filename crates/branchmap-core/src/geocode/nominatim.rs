use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::branch_source::SourceError;
use crate::domain::Coordinates;
use crate::http_client::{HttpClient, HttpRequest};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim asks clients to identify themselves.
pub const GEOCODER_USER_AGENT: &str =
    "BankBranchScraper/1.0 (https://github.com/yourusername/branch_locations)";

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lon: String,
}

/// Single free-text lookups against a Nominatim `/search` endpoint,
/// restricted to Azerbaijan.
#[derive(Clone)]
pub struct NominatimClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    user_agent: String,
    timeout_ms: u64,
}

impl NominatimClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_NOMINATIM_URL),
            user_agent: String::from(GEOCODER_USER_AGENT),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Best match for `query`, `Ok(None)` when the service has no result.
    pub async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, SourceError> {
        let request = HttpRequest::get(&self.base_url)
            .with_query("q", query)
            .with_query("format", "json")
            .with_query("limit", "1")
            .with_query("countrycodes", "az")
            .with_header("User-Agent", &self.user_agent)
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            SourceError::unavailable(format!("geocoder transport error: {}", error.message()))
        })?;
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "geocoder returned status {}",
                response.status
            )));
        }

        let places: Vec<Place> = serde_json::from_str(&response.body)
            .map_err(|error| SourceError::parse(format!("geocoder response: {error}")))?;
        let Some(place) = places.into_iter().next() else {
            debug!(query, "geocoder returned no places");
            return Ok(None);
        };
        if place.lat.is_empty() || place.lon.is_empty() {
            return Ok(None);
        }

        Coordinates::parse_pair(&place.lat, &place.lon)
            .map(Some)
            .map_err(|error| SourceError::parse(format!("geocoder coordinates: {error}")))
    }
}
