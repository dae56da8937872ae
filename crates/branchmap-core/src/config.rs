use std::time::Duration;

use crate::geocode::{DEFAULT_NOMINATIM_URL, GEOCODER_USER_AGENT};
use crate::http_client::BROWSER_USER_AGENT;
use crate::retry::RetryConfig;

/// Runtime settings for a scrape run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeConfig {
    pub user_agent: String,
    pub page_timeout_ms: u64,
    pub retry: RetryConfig,
    pub nominatim_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_ms: u64,
    /// Minimum spacing between geocoder requests.
    pub geocode_interval: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: String::from(BROWSER_USER_AGENT),
            page_timeout_ms: 30_000,
            retry: RetryConfig::default(),
            nominatim_url: String::from(DEFAULT_NOMINATIM_URL),
            geocoder_user_agent: String::from(GEOCODER_USER_AGENT),
            geocoder_timeout_ms: 10_000,
            geocode_interval: Duration::from_secs(1),
        }
    }
}

impl ScrapeConfig {
    /// Defaults overridden by `BRANCHMAP_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = value("BRANCHMAP_NOMINATIM_URL") {
            config.nominatim_url = url;
        }
        if let Some(user_agent) = value("BRANCHMAP_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(user_agent) = value("BRANCHMAP_GEOCODER_USER_AGENT") {
            config.geocoder_user_agent = user_agent;
        }
        if let Some(millis) =
            value("BRANCHMAP_GEOCODE_INTERVAL_MS").and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            config.geocode_interval = Duration::from_millis(millis);
        }
        config
    }

    pub fn with_page_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.page_timeout_ms = timeout_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_defaults() {
        let config = ScrapeConfig::from_lookup(|name| match name {
            "BRANCHMAP_NOMINATIM_URL" => Some(String::from("http://localhost:8080/search")),
            "BRANCHMAP_GEOCODE_INTERVAL_MS" => Some(String::from("250")),
            "BRANCHMAP_USER_AGENT" => Some(String::from("  ")),
            _ => None,
        });

        assert_eq!(config.nominatim_url, "http://localhost:8080/search");
        assert_eq!(config.geocode_interval, Duration::from_millis(250));
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);
    }

    #[test]
    fn unparsable_interval_keeps_the_default() {
        let config = ScrapeConfig::from_lookup(|name| {
            (name == "BRANCHMAP_GEOCODE_INTERVAL_MS").then(|| String::from("soon"))
        });

        assert_eq!(config.geocode_interval, Duration::from_secs(1));
    }
}
