//! Behavior-driven tests for the bank extractors.
//!
//! Each extractor runs against recorded page markup served by a stub
//! transport, so no test touches the network.

use std::sync::Arc;

use branchmap_core::{
    scrape_to_table, AbbAdapter, AsbAdapter, BankId, BranchSource, ExpressBankAdapter, HttpError,
    HttpResponse, RetryConfig, ScrapeError, SiteClient, SourceErrorKind, StubHttpClient,
    StubRoute,
};

const ASB_PAGE: &str = include_str!("fixtures/asb_filiallar.html");
const EXPRESSBANK_PAGE: &str = include_str!("fixtures/expressbank_xidmet.html");

const ABB_ALL: &str = concat!(
    "0:{\"a\":\"$@1\",\"f\":\"\",\"b\":\"build\"}\n",
    "1:[{\"id\":1,\"documentId\":\"d-1\",\"title\":\"Mərkəz filialı\",",
    "\"coordinates\":{\"id\":10,\"lat\":40.3777,\"lng\":49.8920}},",
    "{\"id\":2,\"documentId\":\"d-2\",\"title\":\"Gəncə filialı\",\"coordinates\":null}]\n"
);

const ABB_WEEKEND: &str = concat!(
    "1:[{\"id\":1,\"documentId\":\"d-1\",\"title\":\"Mərkəz filialı\",",
    "\"address\":\"Bakı, Nizami küç. 67\",",
    "\"coordinates\":{\"id\":10,\"lat\":40.3777,\"lng\":49.8920},",
    "\"filter_tags\":[{\"key\":\"open_on_weekends\",\"title\":\"Həftə sonu açıq\"}]}]\n"
);

fn site(client: StubHttpClient) -> SiteClient {
    SiteClient::new(Arc::new(client)).with_retry(RetryConfig::no_retry())
}

fn read_rows(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("table is readable");
    let headers = reader
        .headers()
        .expect("table has headers")
        .iter()
        .map(str::to_owned)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("row parses")
                .iter()
                .map(str::to_owned)
                .collect()
        })
        .collect();
    (headers, rows)
}

// =============================================================================
// Extractors: map markers and embedded data
// =============================================================================

#[tokio::test]
async fn when_asb_page_lists_markers_only_branches_are_kept() {
    // Given: The ASB map page with two branches, an ATM and a test terminal
    let client = StubHttpClient::new().on(StubRoute::url("asb.test"), HttpResponse::ok(ASB_PAGE));
    let adapter = AsbAdapter::new(site(client)).with_page_url("https://asb.test/filiallar");

    // When: The extractor runs
    let branches = adapter.scrape().await.expect("page parses");

    // Then: Only the branches survive with their details split out
    assert_eq!(branches.len(), 2);
    let nasimi = &branches[0];
    assert_eq!(nasimi.name, "Nəsimi filialı");
    assert_eq!(nasimi.address, "Bakı ş., Nəsimi r-nu, S.Vurğun küç. 12");
    assert_eq!(nasimi.latitude, Some(40.3791));
    assert_eq!(nasimi.longitude, Some(49.8468));
    assert_eq!(nasimi.phone, "(012) 404-40-40");
    assert_eq!(nasimi.working_hours, "İş vaxtı: 09:00-18:00");
    assert_eq!(nasimi.activity_types, "Bank xidmətləri");
    assert_eq!(nasimi.opening_date, "12.03.2015");
    assert_eq!(nasimi.license_number, "245/1");

    let ganja = &branches[1];
    assert_eq!(ganja.latitude, None, "a lone latitude is not a coordinate");
    assert_eq!(ganja.working_hours, "Bazar ertəsi - Cümə");
}

#[tokio::test]
async fn when_express_bank_embeds_filials_branch_category_is_selected() {
    // Given: A service network page mixing branches and ATMs
    let client = StubHttpClient::new().on(
        StubRoute::url("expressbank.test"),
        HttpResponse::ok(EXPRESSBANK_PAGE),
    );
    let adapter =
        ExpressBankAdapter::new(site(client)).with_page_url("https://expressbank.test/xidmet");

    // When: The extractor runs
    let branches = adapter.scrape().await.expect("blob parses");

    // Then: Both category 1 spellings are branches, the ATM is not
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].id, "11");
    assert_eq!(branches[0].name, "Mərkəz filialı");
    assert_eq!(branches[0].address, "Bakı ş., Nizami küç. 92");
    assert_eq!(branches[0].email, "merkez@expressbank.az");
    assert_eq!(branches[0].latitude, Some(40.3777));
    assert_eq!(branches[0].longitude, Some(49.8455));

    // And: Half a coordinate pair is dropped entirely
    assert_eq!(branches[1].latitude, None);
    assert_eq!(branches[1].longitude, None);
}

#[tokio::test]
async fn when_express_bank_page_has_no_blob_scrape_fails_with_parse_error() {
    // Given: A maintenance page without the embedded array
    let client = StubHttpClient::new().on(
        StubRoute::url("expressbank.test"),
        HttpResponse::ok("<html><body>Texniki işlər</body></html>"),
    );
    let adapter =
        ExpressBankAdapter::new(site(client)).with_page_url("https://expressbank.test/xidmet");

    // When: The extractor runs
    let error = adapter.scrape().await.expect_err("no data to parse");

    // Then: The failure is classified as a parse error
    assert_eq!(error.kind(), SourceErrorKind::Parse);
    assert_eq!(error.code(), "source.parse");
}

// =============================================================================
// Extractors: ABB filter merge
// =============================================================================

#[tokio::test]
async fn when_abb_filters_overlap_branches_are_merged_by_document_id() {
    // Given: The unfiltered and weekend lists share a branch; safe box fails
    let client = StubHttpClient::new()
        .on(StubRoute::url("abb.test").body("[]"), HttpResponse::ok(ABB_ALL))
        .on(
            StubRoute::url("abb.test").body("[\"open_on_weekends\"]"),
            HttpResponse::ok(ABB_WEEKEND),
        )
        .fail(
            StubRoute::url("abb.test").body("[\"safe_box\"]"),
            HttpError::non_retryable("connection reset"),
        );
    let adapter = AbbAdapter::new(site(client)).with_page_url("https://abb.test/filiallar");

    // When: The extractor runs
    let branches = adapter.scrape().await.expect("two of three filters succeed");

    // Then: The richer weekend record replaces the sparse one in place
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].document_id, "d-1");
    assert_eq!(branches[0].address, "Bakı, Nizami küç. 67");
    assert!(branches[0].has_weekend_hours);
    assert_eq!(branches[1].document_id, "d-2");
    assert_eq!(branches[1].latitude, None);

    // And: The extras count the tags
    let extras = adapter.extras(&branches);
    assert_eq!(extras.get("weekend_hours"), Some(&1));
    assert_eq!(extras.get("safe_box"), Some(&0));
}

#[tokio::test]
async fn when_every_abb_filter_fails_the_last_error_is_returned() {
    // Given: A transport that knows no routes
    let client = Arc::new(StubHttpClient::new());
    let adapter = AbbAdapter::new(
        SiteClient::new(client.clone()).with_retry(RetryConfig::no_retry()),
    )
    .with_page_url("https://abb.test/filiallar");

    // When: The extractor runs
    let error = adapter.scrape().await.expect_err("nothing answers");

    // Then: All three filters were attempted before giving up
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    let bodies = client
        .requests()
        .into_iter()
        .filter_map(|request| request.body)
        .collect::<Vec<_>>();
    assert_eq!(bodies, vec!["[]", "[\"open_on_weekends\"]", "[\"safe_box\"]"]);
}

// =============================================================================
// Tables
// =============================================================================

#[tokio::test]
async fn when_scrape_succeeds_table_is_written_with_empty_missing_coordinates() {
    // Given: A data directory that does not exist yet
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let client = StubHttpClient::new().on(StubRoute::url("asb.test"), HttpResponse::ok(ASB_PAGE));
    let adapter = AsbAdapter::new(site(client)).with_page_url("https://asb.test/filiallar");

    // When: The extractor output is saved
    let summary = scrape_to_table(&adapter, &data_dir)
        .await
        .expect("scrape and save succeed");

    // Then: The summary and the file agree
    assert_eq!(summary.bank, BankId::Asb);
    assert_eq!(summary.branches, 2);
    assert_eq!(summary.with_coordinates, 1);
    let path = summary.output.expect("file written");
    assert_eq!(path, data_dir.join("asb_branches.csv"));

    let (headers, rows) = read_rows(&path);
    assert_eq!(
        headers,
        vec![
            "name",
            "address",
            "latitude",
            "longitude",
            "phone",
            "working_hours",
            "activity_types",
            "opening_date",
            "license_number",
        ]
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][2], "40.3791");
    assert_eq!(rows[1][2], "", "missing latitude is an empty cell");
}

#[tokio::test]
async fn when_page_has_no_branches_no_table_is_written() {
    // Given: A page without map markers
    let dir = tempfile::tempdir().expect("tempdir");
    let client = StubHttpClient::new().on(
        StubRoute::url("asb.test"),
        HttpResponse::ok("<html><body></body></html>"),
    );
    let adapter = AsbAdapter::new(site(client)).with_page_url("https://asb.test/filiallar");

    // When: The extractor output is saved
    let summary = scrape_to_table(&adapter, dir.path())
        .await
        .expect("empty result is not an error");

    // Then: Nothing lands on disk
    assert_eq!(summary.branches, 0);
    assert_eq!(summary.output, None);
    assert!(!dir.path().join("asb_branches.csv").exists());
}

#[tokio::test]
async fn when_site_returns_server_error_scrape_reports_upstream_status() {
    // Given: A page that answers 503
    let dir = tempfile::tempdir().expect("tempdir");
    let client = StubHttpClient::new().on(
        StubRoute::url("asb.test"),
        HttpResponse::with_status(503, "Service Unavailable"),
    );
    let adapter = AsbAdapter::new(site(client)).with_page_url("https://asb.test/filiallar");

    // When: The extractor output is saved
    let error = scrape_to_table(&adapter, dir.path())
        .await
        .expect_err("503 is a failure");

    // Then: The source error carries the status and is retryable
    match error {
        ScrapeError::Source(source) => {
            assert_eq!(source.code(), "source.upstream_status");
            assert!(source.retryable());
            assert!(source.message().contains("503"));
        }
        other => panic!("expected source error, got {other:?}"),
    }
}
