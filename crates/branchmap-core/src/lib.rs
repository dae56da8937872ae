//! Collection side of branchmap.
//!
//! This crate contains:
//! - Bank identifiers, coordinates and the branch record contract
//! - Per-bank extractors over an injectable HTTP transport
//! - Throttled Nominatim geocoding with fallback queries
//! - CSV table output and the combined dataset merge

pub mod adapters;
pub mod branch_source;
pub mod circuit_breaker;
pub mod combine;
pub mod config;
pub mod domain;
pub mod error;
pub mod geocode;
pub mod http_client;
pub mod retry;
pub mod session;
pub mod table;
pub mod text;
pub mod throttling;

pub use adapters::{
    AbbAdapter, AbbBranch, AfbAdapter, AfbBranch, AsbAdapter, AsbBranch, ExpressBankAdapter,
    ExpressBankBranch, SiteClient, TuranBankAdapter, TuranBankBranch,
};
pub use branch_source::{
    scrape_to_table, BranchSource, ScrapeError, ScrapeSummary, SourceError, SourceErrorKind,
};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use combine::{
    CombineReport, CombinedRow, Combiner, FileReport, FileStatus, BANK_FILES, COMBINED_FILE,
};
pub use config::ScrapeConfig;
pub use domain::{BankId, BranchRecord, Coordinates};
pub use error::{CoreError, ValidationError};
pub use geocode::{AddressProfile, GeocodeHit, GeocodeQuery, GeocodeStrategy, Geocoder, NominatimClient};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    StubHttpClient, StubRoute,
};
pub use retry::{Backoff, RetryConfig};
pub use session::ScrapeSession;
pub use table::{write_table, TableOutcome};
pub use throttling::RequestThrottle;
