use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::{ClientConfig, load_config};
use crate::error::{Error, Result, TransportError, format_api_error};
use crate::pager::{PageRequest, PagedFetcher, Transport};
use crate::request::{GraphQlRequest, JSON, RestRequest};
use crate::util::{join_url, with_query_key};

/// Query-string parameter carrying the key on REST endpoints.
pub(crate) const KEY_PARAM: &str = "subscription-key";
/// Header carrying the key on the GraphQL endpoint.
pub(crate) const KEY_HEADER: &str = "ocp-apim-subscription-key";

pub(crate) const DEFAULT_PAGE_SIZE: usize = 100;

/// Blocking HTTP transport for the REST and GraphQL APIs.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    key: String,
    graphql: Url,

    timeout: Duration,
    page_size: usize,
    progress: bool,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.agrimetricsrc`.
    ///
    /// This is equivalent to `Client::new(None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`key` arguments
    /// - environment variables `AGRIMETRICS_URL` / `AGRIMETRICS_API_KEY` / `API_KEY`
    /// - config file from `AGRIMETRICS_RC` or `.agrimetricsrc`
    pub fn new(url: Option<String>, key: Option<String>, verify: Option<bool>) -> Result<Self> {
        Self::with_config(load_config(url, key, verify)?)
    }

    pub fn with_config(cfg: ClientConfig) -> Result<Self> {
        if cfg.key.trim().is_empty() {
            return Err(Error::Configuration("API key is empty".to_string()));
        }
        let graphql = join_url(&cfg.url, "graphql")?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("agrimetrics-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("agrimetrics-rs")),
        );

        let mut builder = HttpClient::builder().default_headers(default_headers);
        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key.trim().to_string(),
            graphql,
            timeout: Duration::from_secs(60),
            page_size: DEFAULT_PAGE_SIZE,
            progress: false,
            http,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Page size requested from page-numbered REST endpoints.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Show a spinner while draining paged endpoints.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// A REST request for `path` relative to the base URL.
    pub fn rest(&self, path: &str) -> Result<RestRequest> {
        Ok(RestRequest::new(join_url(&self.url, path)?))
    }

    pub fn graphql_url(&self) -> &Url {
        &self.graphql
    }

    /// Sends a GET and decodes the JSON (or GeoJSON) body.
    pub fn get_json(&self, request: &RestRequest) -> Result<Value, TransportError> {
        debug!(url = %request.url(), accept = request.accept().as_str(), "GET");
        let url = with_query_key(request.url(), KEY_PARAM, &self.key);
        let req = self
            .http
            .get(url)
            .header(ACCEPT, request.accept().as_str());
        self.send_json(req, request.url())
    }

    /// Posts a GraphQL body and decodes the JSON reply.
    pub fn post_graphql(&self, request: &GraphQlRequest) -> Result<Value, TransportError> {
        let url = &self.graphql;
        debug!(
            url = %url,
            operation = request.operation_name().unwrap_or("(anonymous)"),
            "POST"
        );
        let req = self
            .http
            .post(url.clone())
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .header(KEY_HEADER, &self.key)
            .json(request);
        self.send_json(req, url)
    }

    fn send_json(&self, req: RequestBuilder, url: &Url) -> Result<Value, TransportError> {
        let network = |source: reqwest::Error| TransportError::Network {
            url: url.to_string(),
            source,
        };

        let resp = req.timeout(self.timeout).send().map_err(network)?;
        let status = resp.status();
        let text = resp.text().map_err(network)?;

        if !status.is_success() {
            return Err(format_api_error(status, url.as_str(), &text));
        }

        serde_json::from_str(&text).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// GET decoded into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, request: &RestRequest) -> Result<T> {
        let value = self.get_json(request)?;
        serde_json::from_value(value).map_err(|e| {
            Error::UnexpectedResponse(format!("{} (url={})", e, request.url()))
        })
    }

    /// Concatenates every page of `fetcher`, ticking a spinner per page when
    /// progress is enabled.
    pub fn drain<R, Tr, T>(&self, fetcher: PagedFetcher<'_, R, Tr, T>) -> Result<Vec<T>>
    where
        R: PageRequest,
        Tr: Transport<R>,
    {
        let pb = self.progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} page {pos} {msg} ({elapsed})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        });

        let mut all = Vec::new();
        for page in fetcher {
            let page = match page {
                Ok(p) => p,
                Err(e) => {
                    if let Some(pb) = &pb {
                        pb.abandon();
                    }
                    return Err(e);
                }
            };
            all.extend(page);
            if let Some(pb) = &pb {
                pb.inc(1);
                pb.set_message(format!("{} item(s)", all.len()));
            }
        }

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        Ok(all)
    }
}

impl Transport<RestRequest> for Client {
    type Response = Value;

    fn fetch(&self, request: &RestRequest) -> Result<Value, TransportError> {
        self.get_json(request)
    }
}

impl Transport<GraphQlRequest> for Client {
    type Response = Value;

    fn fetch(&self, request: &GraphQlRequest) -> Result<Value, TransportError> {
        self.post_graphql(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::with_config(ClientConfig::new("secret").with_url("https://api.example.test"))
            .unwrap()
    }

    #[test]
    fn rejects_empty_key_and_bad_url() {
        let err = Client::with_config(ClientConfig::new("  ")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = Client::with_config(ClientConfig::new("k").with_url("not a url")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().starts_with("configuration error: invalid url"));
    }

    #[test]
    fn builds_endpoint_urls() {
        let c = client();
        assert_eq!(
            c.rest("field-boundaries").unwrap().url().as_str(),
            "https://api.example.test/field-boundaries"
        );
        assert_eq!(
            c.graphql_url().as_str(),
            "https://api.example.test/graphql"
        );
        assert_eq!(c.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(c.with_page_size(10).page_size(), 10);
    }

    #[test]
    fn requests_never_carry_the_key() {
        let c = client();
        let req = c.rest("field-finder").unwrap().with_query("lat", "51.8");
        assert!(!req.url().as_str().contains("secret"));
    }
}
