//! Paginated record source (the open-data API).
//!
//! `fetch_all` walks pages 1, 2, ... until one comes back empty. A failed
//! page does not throw away what was already fetched, but it is never
//! mistaken for the end of the data either: the outcome says how it ended.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://dadosabertos.camara.leg.br/api/v2";
pub const DEFAULT_LEGISLATURE: u32 = 57;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("page {page}: request failed: {source}")]
    Http {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("page {page}: http status {status}")]
    Status { page: u32, status: u16 },

    #[error("page {page}: unexpected response body: {message}")]
    Decode { page: u32, message: String },
}

impl SourceError {
    /// Timeouts, connection failures, 429 and 5xx are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Where the API lives and which legislature to list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub legislature: u32,
    pub order: String,
    pub order_by: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Safety cap on the number of pages requested.
    pub max_pages: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            legislature: DEFAULT_LEGISLATURE,
            order: "ASC".to_string(),
            order_by: "nome".to_string(),
            timeout_secs: 30,
            user_agent: concat!("deputados/", env!("CARGO_PKG_VERSION")).to_string(),
            max_pages: 100,
        }
    }
}

impl ApiConfig {
    pub fn page_url(&self, page: u32) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!(
            "{}/deputados",
            self.base_url.trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("idLegislatura", &self.legislature.to_string())
            .append_pair("ordem", &self.order)
            .append_pair("ordenarPor", &self.order_by)
            .append_pair("pagina", &page.to_string());
        Ok(url)
    }
}

/// One page of raw rows. An empty page means the listing is exhausted.
pub trait RecordSource {
    fn fetch_page(&self, page: u32) -> Result<Vec<Value>, SourceError>;
}

/// Envelope of a listing response; only `dados` matters here.
#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    dados: Vec<Value>,
}

pub struct CamaraApiSource {
    client: Client,
    config: ApiConfig,
}

impl CamaraApiSource {
    pub fn new(config: ApiConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("deputados")),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

impl RecordSource for CamaraApiSource {
    fn fetch_page(&self, page: u32) -> Result<Vec<Value>, SourceError> {
        let url = self.config.page_url(page)?;
        debug!(%url, "fetching page");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| SourceError::Http { page, source })?;
        if !resp.status().is_success() {
            return Err(SourceError::Status {
                page,
                status: resp.status().as_u16(),
            });
        }
        let body: ListingPage = resp.json().map_err(|e| SourceError::Decode {
            page,
            message: e.to_string(),
        })?;
        Ok(body.dados)
    }
}

/// How a paginated fetch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchCompletion {
    /// An empty page was reached.
    Complete,
    /// A page failed; rows before it were kept.
    Incomplete { failed_page: u32, error: String },
    /// The page cap was hit before an empty page.
    Truncated { max_pages: u32 },
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub rows: Vec<Value>,
    /// Pages that returned rows.
    pub pages: u32,
    pub completion: FetchCompletion,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.completion == FetchCompletion::Complete
    }
}

/// Fetch pages 1..=`max_pages` in order, concatenating rows.
pub fn fetch_all<S: RecordSource + ?Sized>(source: &S, max_pages: u32) -> FetchOutcome {
    let mut rows = Vec::new();
    let mut pages = 0;
    for page in 1..=max_pages {
        match source.fetch_page(page) {
            Ok(batch) if batch.is_empty() => {
                info!(pages, rows = rows.len(), "fetch complete");
                return FetchOutcome {
                    rows,
                    pages,
                    completion: FetchCompletion::Complete,
                };
            }
            Ok(batch) => {
                debug!(page, rows = batch.len(), "page fetched");
                pages = page;
                rows.extend(batch);
            }
            Err(err) => {
                warn!(page, retryable = err.is_retryable(), error = %err, "fetch stopped early");
                return FetchOutcome {
                    rows,
                    pages,
                    completion: FetchCompletion::Incomplete {
                        failed_page: page,
                        error: err.to_string(),
                    },
                };
            }
        }
    }
    warn!(max_pages, rows = rows.len(), "page cap reached before end of listing");
    FetchOutcome {
        rows,
        pages,
        completion: FetchCompletion::Truncated { max_pages },
    }
}
