use std::path::Path;
use std::sync::Arc;

use crate::adapters::{
    AbbAdapter, AfbAdapter, AsbAdapter, ExpressBankAdapter, SiteClient, TuranBankAdapter,
};
use crate::branch_source::{scrape_to_table, ScrapeError, ScrapeSummary};
use crate::config::ScrapeConfig;
use crate::domain::BankId;
use crate::geocode::{Geocoder, NominatimClient};
use crate::http_client::{HttpClient, HttpError, ReqwestHttpClient};
use crate::throttling::RequestThrottle;

/// Wires extractors to their transports and a shared geocoder.
pub struct ScrapeSession {
    strict_site: SiteClient,
    lenient_site: SiteClient,
    geocoder: Arc<Geocoder>,
}

impl ScrapeSession {
    /// Production session over reqwest.
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, HttpError> {
        let strict: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(&config.user_agent)?);
        let lenient: Arc<dyn HttpClient> =
            Arc::new(ReqwestHttpClient::accepting_invalid_certs(&config.user_agent)?);
        Ok(Self::with_clients(config, strict, lenient))
    }

    /// `strict` verifies certificates and also serves the geocoder;
    /// `lenient` is used for the banks with broken chains.
    pub fn with_clients(
        config: &ScrapeConfig,
        strict: Arc<dyn HttpClient>,
        lenient: Arc<dyn HttpClient>,
    ) -> Self {
        let site = |client: Arc<dyn HttpClient>| {
            SiteClient::new(client)
                .with_retry(config.retry.clone())
                .with_timeout_ms(config.page_timeout_ms)
        };
        let nominatim = NominatimClient::new(Arc::clone(&strict))
            .with_base_url(&config.nominatim_url)
            .with_user_agent(&config.geocoder_user_agent)
            .with_timeout_ms(config.geocoder_timeout_ms);

        Self {
            strict_site: site(strict),
            lenient_site: site(lenient),
            geocoder: Arc::new(Geocoder::new(
                nominatim,
                RequestThrottle::new(config.geocode_interval),
            )),
        }
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    /// Scrapes `bank` and writes its table into `data_dir`.
    pub async fn scrape(&self, bank: BankId, data_dir: &Path) -> Result<ScrapeSummary, ScrapeError> {
        match bank {
            BankId::Abb => scrape_to_table(&AbbAdapter::new(self.strict_site.clone()), data_dir).await,
            BankId::Asb => scrape_to_table(&AsbAdapter::new(self.strict_site.clone()), data_dir).await,
            BankId::Afb => {
                let adapter = AfbAdapter::new(self.lenient_site.clone(), Arc::clone(&self.geocoder));
                scrape_to_table(&adapter, data_dir).await
            }
            BankId::ExpressBank => {
                let adapter = ExpressBankAdapter::new(self.strict_site.clone());
                scrape_to_table(&adapter, data_dir).await
            }
            BankId::TuranBank => {
                let adapter =
                    TuranBankAdapter::new(self.lenient_site.clone(), Arc::clone(&self.geocoder));
                scrape_to_table(&adapter, data_dir).await
            }
        }
    }
}
