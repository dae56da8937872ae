use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Browser user agent sent to bank websites, which reject unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP methods used by the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Outgoing request description, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: 30_000,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// URL with the query pairs percent-encoded and appended.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let encoded = self
            .query
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{encoded}", self.url)
    }
}

/// Status and decoded body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Transport contract shared by the extractors and the geocoder.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        Self::build(user_agent, false)
    }

    /// Client that skips TLS certificate verification. AFB and Turan Bank
    /// serve incomplete certificate chains.
    pub fn accepting_invalid_certs(user_agent: &str) -> Result<Self, HttpError> {
        Self::build(user_agent, true)
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    fn build(user_agent: &str, accept_invalid_certs: bool) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|error| {
                HttpError::non_retryable(format!("failed to build http client: {error}"))
            })?;
        Ok(Self::with_client(client))
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
            };

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            builder = builder.timeout(Duration::from_millis(request.timeout_ms));
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::non_retryable(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            // Bank pages are UTF-8 even when the header says otherwise.
            let bytes = response
                .bytes()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            })
        })
    }
}

/// Request matcher for [`StubHttpClient`].
#[derive(Debug, Clone, Default)]
pub struct StubRoute {
    url_contains: String,
    body: Option<String>,
    query: Vec<(String, String)>,
}

impl StubRoute {
    pub fn url(fragment: impl Into<String>) -> Self {
        Self {
            url_contains: fragment.into(),
            ..Self::default()
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    fn matches(&self, request: &HttpRequest) -> bool {
        request.url.contains(&self.url_contains)
            && self
                .body
                .as_ref()
                .map_or(true, |body| request.body.as_deref() == Some(body.as_str()))
            && self
                .query
                .iter()
                .all(|(name, value)| request.query_value(name) == Some(value.as_str()))
    }
}

/// Deterministic offline transport. The first matching route answers;
/// unmatched requests fail with a non-retryable error.
#[derive(Debug, Default)]
pub struct StubHttpClient {
    routes: Vec<(StubRoute, Result<HttpResponse, HttpError>)>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, route: StubRoute, response: HttpResponse) -> Self {
        self.routes.push((route, Ok(response)));
        self
    }

    pub fn fail(mut self, route: StubRoute, error: HttpError) -> Self {
        self.routes.push((route, Err(error)));
        self
    }

    /// Requests executed so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen
            .lock()
            .expect("stub request log is not poisoned")
            .clone()
    }
}

impl HttpClient for StubHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let reply = self
                .routes
                .iter()
                .find(|(route, _)| route.matches(&request))
                .map(|(_, reply)| reply.clone());
            let url = request.full_url();
            self.seen
                .lock()
                .expect("stub request log is not poisoned")
                .push(request);

            reply.unwrap_or_else(|| Err(HttpError::non_retryable(format!("no stub route for {url}"))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_url_encodes_query_pairs() {
        let request = HttpRequest::get("https://nominatim.example/search")
            .with_query("q", "Nizami küçəsi, Baku")
            .with_query("limit", "1");

        assert_eq!(
            request.full_url(),
            "https://nominatim.example/search?q=Nizami%20k%C3%BC%C3%A7%C9%99si%2C%20Baku&limit=1"
        );
    }

    #[test]
    fn header_names_are_lowercased() {
        let request = HttpRequest::post("https://abb-bank.az/filiallar")
            .with_header("Next-Action", "abc");

        assert_eq!(request.headers.get("next-action").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn stub_matches_first_route_and_records_requests() {
        let client = StubHttpClient::new()
            .on(StubRoute::url("/filiallar").body("[]"), HttpResponse::ok("all"))
            .on(StubRoute::url("/filiallar"), HttpResponse::ok("filtered"));

        let all = client
            .execute(HttpRequest::post("https://bank.test/filiallar").with_body("[]"))
            .await
            .expect("route exists");
        let filtered = client
            .execute(HttpRequest::post("https://bank.test/filiallar").with_body("[\"x\"]"))
            .await
            .expect("route exists");
        let missing = client.execute(HttpRequest::get("https://other.test")).await;

        assert_eq!(all.body, "all");
        assert_eq!(filtered.body, "filtered");
        assert!(missing.is_err());
        assert_eq!(client.requests().len(), 3);
    }
}
