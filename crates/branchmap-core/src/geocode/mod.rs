//! Address to coordinate resolution for sites that publish no coordinates.
//!
//! An address is tried against the geocoder with progressively coarser
//! queries and the first hit wins:
//!
//! | Step | Strategy | Query |
//! |------|----------|-------|
//! | 1 | [`GeocodeStrategy::FullAddress`] | normalized address |
//! | 2 | [`GeocodeStrategy::WithoutBuildingNumber`] | address minus trailing house number |
//! | 3 | [`GeocodeStrategy::CityAndStreet`] | street phrase query, city |
//! | 4 | [`GeocodeStrategy::CityCenter`] | city only |
//!
//! Every lookup waits on a shared [`RequestThrottle`], so queries are at
//! least one interval apart across strategies and across addresses. When the
//! [`CircuitBreaker`] is open, the next lookup waits for its half-open window
//! instead of being dropped.

mod nominatim;
mod profile;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

pub use nominatim::{NominatimClient, DEFAULT_NOMINATIM_URL, GEOCODER_USER_AGENT};
pub use profile::{extract_street, strip_building_number, AddressProfile, CityAlias, COUNTRY};

use crate::branch_source::SourceErrorKind;
use crate::circuit_breaker::CircuitBreaker;
use crate::domain::Coordinates;
use crate::throttling::RequestThrottle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeStrategy {
    FullAddress,
    WithoutBuildingNumber,
    CityAndStreet,
    CityCenter,
}

impl GeocodeStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullAddress => "full",
            Self::WithoutBuildingNumber => "street",
            Self::CityAndStreet => "city+street",
            Self::CityCenter => "city center",
        }
    }
}

impl Display for GeocodeStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One planned lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeQuery {
    pub strategy: GeocodeStrategy,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeHit {
    pub coordinates: Coordinates,
    pub strategy: GeocodeStrategy,
}

/// Ordered queries for `address`. Empty addresses yield no queries.
pub fn plan(address: &str, profile: &AddressProfile) -> Vec<GeocodeQuery> {
    if address.is_empty() {
        return Vec::new();
    }

    let mut queries = vec![GeocodeQuery {
        strategy: GeocodeStrategy::FullAddress,
        text: profile.query(address),
    }];

    if let Some(street_only) = strip_building_number(address) {
        queries.push(GeocodeQuery {
            strategy: GeocodeStrategy::WithoutBuildingNumber,
            text: profile.query(&street_only),
        });
    }

    if let Some(city) = profile.detect_city(address) {
        if let Some(street) = extract_street(address) {
            queries.push(GeocodeQuery {
                strategy: GeocodeStrategy::CityAndStreet,
                text: format!("{}, {city}, {COUNTRY}", profile.query(&street)),
            });
        }
        queries.push(GeocodeQuery {
            strategy: GeocodeStrategy::CityCenter,
            text: format!("{city}, {COUNTRY}"),
        });
    }

    queries
}

/// Throttled fallback resolver shared by the geocoding extractors.
pub struct Geocoder {
    client: NominatimClient,
    throttle: RequestThrottle,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl Geocoder {
    pub fn new(client: NominatimClient, throttle: RequestThrottle) -> Self {
        Self {
            client,
            throttle,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    pub async fn resolve(&self, address: &str, profile: &AddressProfile) -> Option<GeocodeHit> {
        let queries = plan(address, profile);
        if queries.is_empty() {
            return None;
        }

        for query in queries {
            self.wait_for_circuit(address).await;
            self.throttle.wait().await;
            match self.client.lookup(&query.text).await {
                Ok(Some(coordinates)) => {
                    self.circuit_breaker.record_success();
                    info!(
                        address = truncate(address, 40),
                        lat = coordinates.lat,
                        lon = coordinates.lon,
                        "✓ Geocoded ({})",
                        query.strategy
                    );
                    return Some(GeocodeHit {
                        coordinates,
                        strategy: query.strategy,
                    });
                }
                Ok(None) => self.circuit_breaker.record_success(),
                Err(error) => {
                    if error.kind() == SourceErrorKind::Unavailable {
                        self.circuit_breaker.record_failure();
                    }
                    debug!(query = %query.text, %error, "geocoder lookup failed");
                }
            }
        }

        info!(address = truncate(address, 50), "✗ No coordinates found");
        None
    }

    async fn wait_for_circuit(&self, address: &str) {
        while !self.circuit_breaker.allow_request() {
            let delay = self.circuit_breaker.retry_after().unwrap_or_default();
            warn!(
                address = truncate(address, 40),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "geocoder circuit is open; waiting to retry"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
