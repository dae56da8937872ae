//! Behavior-driven tests for geocoding and the extractors that depend on it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use branchmap_core::http_client::HttpFuture;
use branchmap_core::{
    AddressProfile, AfbAdapter, BankId, BranchSource, CircuitBreaker, CircuitBreakerConfig,
    CircuitState, GeocodeStrategy, Geocoder, HttpClient, HttpError, HttpRequest, HttpResponse,
    NominatimClient, RequestThrottle, RetryConfig, ScrapeConfig, ScrapeSession, SiteClient,
    StubHttpClient, StubRoute, TuranBankAdapter,
};

const AFB_PAGE: &str = include_str!("fixtures/afb_filiallar.html");
const TURAN_PAGE: &str = include_str!("fixtures/turanbank_filiallar.html");

const GEOCODER_URL: &str = "https://geo.test/search";
const NO_PLACES: &str = "[]";

fn place(lat: &str, lon: &str) -> HttpResponse {
    HttpResponse::ok(format!(
        "[{{\"place_id\":1,\"lat\":\"{lat}\",\"lon\":\"{lon}\",\"display_name\":\"x\"}}]"
    ))
}

fn geocoder(client: Arc<StubHttpClient>, interval: Duration) -> Geocoder {
    Geocoder::new(
        NominatimClient::new(client).with_base_url(GEOCODER_URL),
        RequestThrottle::new(interval),
    )
}

/// Transport that is down for the first `outage` requests and then answers
/// every query with one place.
struct RecoveringClient {
    outage: usize,
    calls: AtomicUsize,
}

impl RecoveringClient {
    fn new(outage: usize) -> Self {
        Self {
            outage,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for RecoveringClient {
    fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.outage {
                return Err(HttpError::new("connection refused"));
            }
            Ok(HttpResponse::ok("[{\"lat\":\"40.4\",\"lon\":\"49.8\"}]"))
        })
    }
}

fn queries(client: &StubHttpClient) -> Vec<String> {
    client
        .requests()
        .iter()
        .filter_map(|request| request.query_value("q").map(str::to_owned))
        .collect()
}

// =============================================================================
// Geocoder: fallback strategies
// =============================================================================

#[tokio::test]
async fn when_full_address_is_unknown_geocoder_falls_back_to_street() {
    // Given: Nominatim only knows the street without the building number
    let client = Arc::new(
        StubHttpClient::new()
            .on(
                StubRoute::url("geo.test").query("q", "Baku, Nizami küçəsi, Azerbaijan"),
                place("40.3725", "49.8433"),
            )
            .on(StubRoute::url("geo.test"), HttpResponse::ok(NO_PLACES)),
    );
    let geocoder = geocoder(client.clone(), Duration::from_millis(1));

    // When: An AFB style address is resolved
    let hit = geocoder
        .resolve("Bakı ş., Nizami küç. 12", &AddressProfile::AFB)
        .await
        .expect("street fallback resolves");

    // Then: The second strategy wins and later ones are never tried
    assert_eq!(hit.strategy, GeocodeStrategy::WithoutBuildingNumber);
    assert_eq!(hit.coordinates.lat, 40.3725);
    assert_eq!(hit.coordinates.lon, 49.8433);
    assert_eq!(
        queries(&client),
        vec![
            "Baku, Nizami küçəsi 12, Azerbaijan",
            "Baku, Nizami küçəsi, Azerbaijan",
        ]
    );
}

#[tokio::test]
async fn when_a_result_has_unreadable_coordinates_the_next_strategy_is_tried() {
    // Given: The full address returns a place whose latitude is not a number
    let client = Arc::new(
        StubHttpClient::new()
            .on(
                StubRoute::url("geo.test").query("q", "Baku, Nizami küçəsi 12, Azerbaijan"),
                place("n/a", "49.8433"),
            )
            .on(
                StubRoute::url("geo.test").query("q", "Baku, Nizami küçəsi, Azerbaijan"),
                place("40.3725", "49.8433"),
            ),
    );
    let geocoder = geocoder(client.clone(), Duration::from_millis(1));

    // When: The address is resolved
    let hit = geocoder
        .resolve("Bakı ş., Nizami küç. 12", &AddressProfile::AFB)
        .await
        .expect("street fallback resolves");

    // Then: The malformed result is ignored and does not count as an outage
    assert_eq!(hit.strategy, GeocodeStrategy::WithoutBuildingNumber);
    assert_eq!(hit.coordinates.lat, 40.3725);
    assert_eq!(geocoder.circuit_breaker().consecutive_failures(), 0);
}

#[tokio::test]
async fn when_only_the_city_is_known_geocoder_returns_city_center() {
    // Given: Nominatim knows nothing but the city
    let client = Arc::new(
        StubHttpClient::new()
            .on(
                StubRoute::url("geo.test").query("q", "Khachmaz, Azerbaijan"),
                place("41.4635", "48.8060"),
            )
            .on(StubRoute::url("geo.test"), HttpResponse::ok(NO_PLACES)),
    );
    let geocoder = geocoder(client.clone(), Duration::from_millis(1));

    // When: A Turan Bank address is resolved
    let hit = geocoder
        .resolve("Xaçmaz şəh., Heydər Əliyev pr. 21", &AddressProfile::TURAN)
        .await
        .expect("city center resolves");

    // Then: Every strategy was tried in order, ending at the city center
    assert_eq!(hit.strategy, GeocodeStrategy::CityCenter);
    let sent = queries(&client);
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0], "Khachmaz, Heydər Əliyev prospekti 21, Azerbaijan");
    assert_eq!(sent[1], "Khachmaz, Heydər Əliyev prospekti, Azerbaijan");
    assert!(sent[2].ends_with(", Khachmaz, Azerbaijan"));
    assert_eq!(sent[3], "Khachmaz, Azerbaijan");
}

#[tokio::test]
async fn when_lookups_run_back_to_back_they_are_spaced_by_the_interval() {
    // Given: A geocoder limited to one request per 50ms that finds nothing
    let client =
        Arc::new(StubHttpClient::new().on(StubRoute::url("geo.test"), HttpResponse::ok(NO_PLACES)));
    let geocoder = geocoder(client.clone(), Duration::from_millis(50));

    // When: An address with four strategies is resolved
    let started = Instant::now();
    let hit = geocoder
        .resolve("Bakı ş., Nizami küç. 12", &AddressProfile::AFB)
        .await;

    // Then: Four lookups needed at least three intervals
    assert!(hit.is_none());
    assert_eq!(client.requests().len(), 4);
    assert!(
        started.elapsed() >= Duration::from_millis(140),
        "lookups were not throttled: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn when_geocoder_is_unreachable_open_circuit_spaces_lookups_by_its_timeout() {
    // Given: A transport with no routes and a breaker that trips after two failures
    let client = Arc::new(StubHttpClient::new());
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 2,
        open_timeout: Duration::from_millis(150),
    }));
    let geocoder =
        geocoder(client.clone(), Duration::from_millis(1)).with_circuit_breaker(breaker.clone());

    // When: An address with four strategies is resolved
    let started = Instant::now();
    let hit = geocoder
        .resolve("Bakı ş., Nizami küç. 12", &AddressProfile::AFB)
        .await;

    // Then: Every strategy was still tried, the last two after the breaker cooled down
    assert!(hit.is_none());
    assert_eq!(client.requests().len(), 4);
    assert!(
        started.elapsed() >= Duration::from_millis(280),
        "open circuit did not delay lookups: {:?}",
        started.elapsed()
    );
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn when_geocoder_recovers_after_an_outage_later_addresses_still_resolve() {
    // Given: A geocoder that is down for five requests, then healthy
    let client = Arc::new(RecoveringClient::new(5));
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 5,
        open_timeout: Duration::from_millis(100),
    }));
    let geocoder = Geocoder::new(
        NominatimClient::new(client.clone()).with_base_url(GEOCODER_URL),
        RequestThrottle::new(Duration::from_millis(1)),
    )
    .with_circuit_breaker(breaker.clone());

    // When: Four addresses are resolved one after another
    let mut hits = Vec::new();
    for address in [
        "Bakı ş., Nizami küç. 12",
        "Gəncə ş., Atatürk pr. 5",
        "Bakı ş., Füzuli küç. 40",
        "Sumqayit ş., Sülh küç. 3",
    ] {
        hits.push(geocoder.resolve(address, &AddressProfile::AFB).await);
    }

    // Then: The first address used up its strategies during the outage, and every
    // later address resolves once the half-open request succeeds
    assert!(hits[0].is_none());
    assert!(hits[1..].iter().all(Option::is_some), "unresolved addresses: {hits:?}");
    let coordinates = hits[3].as_ref().expect("last address resolves").coordinates;
    assert_eq!(coordinates.lat, 40.4);
    assert_eq!(coordinates.lon, 49.8);
    assert_eq!(client.calls(), 8);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn when_empty_results_arrive_circuit_stays_closed() {
    // Given: A reachable geocoder that finds nothing
    let client =
        Arc::new(StubHttpClient::new().on(StubRoute::url("geo.test"), HttpResponse::ok(NO_PLACES)));
    let geocoder = geocoder(client, Duration::from_millis(1));

    // When: An address exhausts all strategies
    let hit = geocoder
        .resolve("Bakı ş., Nizami küç. 12", &AddressProfile::AFB)
        .await;

    // Then: No coordinates, but the service is considered healthy
    assert!(hit.is_none());
    assert_eq!(geocoder.circuit_breaker().state(), CircuitState::Closed);
    assert_eq!(geocoder.circuit_breaker().consecutive_failures(), 0);
}

// =============================================================================
// Geocoding extractors
// =============================================================================

#[tokio::test]
async fn when_afb_branches_are_scraped_each_address_is_geocoded() {
    // Given: The AFB page with two branches; only the head office resolves
    let page_client =
        StubHttpClient::new().on(StubRoute::url("afb.test"), HttpResponse::ok(AFB_PAGE));
    let geo_client = Arc::new(
        StubHttpClient::new()
            .on(
                StubRoute::url("geo.test").query("q", "Baku, Nizami küçəsi 12, Azerbaijan"),
                place("40.3719", "49.8475"),
            )
            .on(StubRoute::url("geo.test"), HttpResponse::ok(NO_PLACES)),
    );
    let adapter = AfbAdapter::new(
        SiteClient::new(Arc::new(page_client)).with_retry(RetryConfig::no_retry()),
        Arc::new(geocoder(geo_client, Duration::from_millis(1))),
    )
    .with_page_url("https://afb.test/filiallar");

    // When: The extractor runs
    let branches = adapter.scrape().await.expect("page parses");

    // Then: Listing details are kept and coordinates filled where found
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].city_class, "city_8");
    assert_eq!(branches[0].phone, "(012) 565-00-00");
    assert_eq!(branches[0].latitude, Some(40.3719));
    assert_eq!(branches[0].longitude, Some(49.8475));
    assert_eq!(branches[1].name, "Şəki filialı");
    assert_eq!(branches[1].latitude, None);
    assert_eq!(adapter.extras(&branches).get("geocoded"), Some(&1));
}

#[tokio::test]
async fn when_turan_heading_has_no_address_it_is_skipped() {
    // Given: The Turan Bank page with one real branch and one placeholder
    let page_client = StubHttpClient::new().on(
        StubRoute::url("turanbank.test"),
        HttpResponse::ok(TURAN_PAGE),
    );
    let geo_client = Arc::new(
        StubHttpClient::new()
            .on(
                StubRoute::url("geo.test")
                    .query("q", "Khachmaz, Heydər Əliyev prospekti 21, Azerbaijan"),
                place("41.4591", "48.8021"),
            )
            .on(StubRoute::url("geo.test"), HttpResponse::ok(NO_PLACES)),
    );
    let adapter = TuranBankAdapter::new(
        SiteClient::new(Arc::new(page_client)).with_retry(RetryConfig::no_retry()),
        Arc::new(geocoder(geo_client, Duration::from_millis(1))),
    )
    .with_page_url("https://turanbank.test/filiallar");

    // When: The extractor runs
    let branches = adapter.scrape().await.expect("page parses");

    // Then: Only the branch with an address is kept, postal code stripped
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].name, "Xaçmaz filialı");
    assert_eq!(branches[0].address, "Xaçmaz şəh., Heydər Əliyev pr. 21");
    assert_eq!(branches[0].working_hours, "Bazar ertəsi - Cümə: 09:00 - 18:00");
    assert_eq!(branches[0].latitude, Some(41.4591));
}

// =============================================================================
// Session wiring
// =============================================================================

#[tokio::test]
async fn when_session_scrapes_afb_the_lenient_client_fetches_the_page() {
    // Given: A session whose strict client only serves the geocoder
    let dir = tempfile::tempdir().expect("tempdir");
    let strict = Arc::new(
        StubHttpClient::new()
            .on(
                StubRoute::url("geo.test").query("q", "Baku, Nizami küçəsi 12, Azerbaijan"),
                place("40.3719", "49.8475"),
            )
            .on(StubRoute::url("geo.test"), HttpResponse::ok(NO_PLACES)),
    );
    let lenient =
        Arc::new(StubHttpClient::new().on(StubRoute::url("afb.az"), HttpResponse::ok(AFB_PAGE)));
    let config = ScrapeConfig {
        nominatim_url: String::from(GEOCODER_URL),
        geocode_interval: Duration::from_millis(1),
        retry: RetryConfig::no_retry(),
        ..ScrapeConfig::default()
    };
    let session = ScrapeSession::with_clients(&config, strict.clone(), lenient.clone());

    // When: AFB is scraped into the data directory
    let summary = session
        .scrape(BankId::Afb, dir.path())
        .await
        .expect("scrape succeeds");

    // Then: The table is written and the geocoded count reported
    assert_eq!(summary.branches, 2);
    assert_eq!(summary.with_coordinates, 1);
    assert_eq!(summary.extras.get("geocoded"), Some(&1));
    assert!(dir.path().join("afb_branches.csv").exists());
    assert_eq!(lenient.requests().len(), 1);
    assert!(strict
        .requests()
        .iter()
        .all(|request| request.url.starts_with(GEOCODER_URL)));
}
