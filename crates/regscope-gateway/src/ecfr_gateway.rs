use crate::source::SourceGateway;
use async_trait::async_trait;
use chrono::NaiveDate;
use regscope_cache::{CacheConfig, CacheStats, TtlCache};
use regscope_core::{Agency, DocumentNode, GatewayConfig, RegScopeError, Result, Title};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const AGENCIES_PATH: &str = "/api/admin/v1/agencies.json";
const TITLES_PATH: &str = "/api/versioner/v1/titles.json";
const JSON: &str = "application/json";
const XML: &str = "application/xml";

/// Cache key: endpoint plus its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GatewayKey {
    Agencies,
    Titles,
    Structure { date: NaiveDate, title: u32 },
    RawText { date: NaiveDate, title: u32 },
}

impl GatewayKey {
    fn path(&self) -> String {
        match self {
            GatewayKey::Agencies => AGENCIES_PATH.to_string(),
            GatewayKey::Titles => TITLES_PATH.to_string(),
            GatewayKey::Structure { date, title } => {
                format!("/api/versioner/v1/structure/{}/title-{}.json", date, title)
            }
            GatewayKey::RawText { date, title } => {
                format!("/api/versioner/v1/full/{}/title-{}.xml", date, title)
            }
        }
    }

    fn accept(&self) -> &'static str {
        match self {
            GatewayKey::RawText { .. } => XML,
            _ => JSON,
        }
    }

    /// Parse a response body into the payload stored under this key.
    fn parse(&self, body: String) -> Result<CachedResponse> {
        match self {
            GatewayKey::Agencies => {
                let list: AgencyList = serde_json::from_str(&body)?;
                Ok(CachedResponse::Agencies(Arc::new(list.agencies)))
            }
            GatewayKey::Titles => {
                let list: TitleList = serde_json::from_str(&body)?;
                Ok(CachedResponse::Titles(Arc::new(list.titles)))
            }
            GatewayKey::Structure { .. } => {
                let node: DocumentNode = serde_json::from_str(&body)?;
                Ok(CachedResponse::Structure(Arc::new(node)))
            }
            GatewayKey::RawText { .. } => Ok(CachedResponse::RawText(Arc::from(body))),
        }
    }
}

/// Parsed payloads; only successfully parsed responses are cached, so a hit cannot fail.
#[derive(Debug, Clone)]
enum CachedResponse {
    Agencies(Arc<Vec<Agency>>),
    Titles(Arc<Vec<Title>>),
    Structure(Arc<DocumentNode>),
    RawText(Arc<str>),
}

#[derive(Debug, Deserialize)]
struct AgencyList {
    #[serde(default)]
    agencies: Vec<Agency>,
}

#[derive(Debug, Deserialize)]
struct TitleList {
    #[serde(default)]
    titles: Vec<Title>,
}

/// HTTP gateway to the eCFR corpus service with a time-bounded response cache
pub struct EcfrGateway {
    config: GatewayConfig,
    client: Client,
    cache: TtlCache<GatewayKey, CachedResponse>,
}

impl EcfrGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                RegScopeError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let cache = TtlCache::new(CacheConfig {
            max_entries: config.cache_max_entries,
            default_ttl: Duration::from_secs(config.cache_ttl_secs),
        });

        Ok(Self {
            config,
            client,
            cache,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached response.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    fn url_for(&self, key: &GatewayKey) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), key.path())
    }

    async fn get(&self, key: GatewayKey) -> Result<CachedResponse> {
        if let Some(hit) = self.cache.get(&key) {
            debug!(?key, "Cache hit");
            return Ok(hit);
        }

        debug!(?key, "Cache miss");
        let body = self.send_request(&key).await?;
        let parsed = key.parse(body)?;
        self.cache.insert(key, parsed.clone());
        Ok(parsed)
    }

    /// Send a request with retry logic for transient failures
    async fn send_request(&self, key: &GatewayKey) -> Result<String> {
        let url = self.url_for(key);
        let mut attempt = 0;

        loop {
            match self.try_request(&url, key.accept()).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}; retrying in {:?}",
                        url,
                        attempt,
                        self.config.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_request(&self, url: &str, accept: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| RegScopeError::upstream(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegScopeError::from_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| RegScopeError::upstream(format!("{}: {}", url, e)))
    }
}

/// Exponential with jitter: ~200ms, 400ms, 800ms, capped exponent
fn backoff(attempt: u32) -> Duration {
    let base = 2u64.saturating_pow(attempt.saturating_sub(1).min(6));
    let jitter = fastrand::u64(0..(base * 50 + 1));
    Duration::from_millis(200 * base + jitter)
}

fn unexpected(key: &GatewayKey) -> RegScopeError {
    RegScopeError::MalformedResponse(format!("unexpected payload cached for {:?}", key))
}

#[async_trait]
impl SourceGateway for EcfrGateway {
    async fn list_agencies(&self) -> Result<Vec<Agency>> {
        match self.get(GatewayKey::Agencies).await? {
            CachedResponse::Agencies(list) => Ok(list.as_ref().clone()),
            _ => Err(unexpected(&GatewayKey::Agencies)),
        }
    }

    async fn list_titles(&self) -> Result<Vec<Title>> {
        match self.get(GatewayKey::Titles).await? {
            CachedResponse::Titles(list) => Ok(list.as_ref().clone()),
            _ => Err(unexpected(&GatewayKey::Titles)),
        }
    }

    async fn fetch_structure(&self, date: NaiveDate, title: u32) -> Result<Arc<DocumentNode>> {
        let key = GatewayKey::Structure { date, title };
        match self.get(key.clone()).await? {
            CachedResponse::Structure(node) => Ok(node),
            _ => Err(unexpected(&key)),
        }
    }

    async fn fetch_raw_text(&self, date: NaiveDate, title: u32) -> Result<Arc<str>> {
        let key = GatewayKey::RawText { date, title };
        match self.get(key.clone()).await? {
            CachedResponse::RawText(text) => Ok(text),
            _ => Err(unexpected(&key)),
        }
    }

    fn gateway_name(&self) -> &str {
        "ecfr"
    }
}
