// Reputation signals from third-party providers: domain age, search-engine
// indexing, page rank and DNS nameservers.

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use phishlens_scanner::ScanError;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Age request failed or the provider answered with an error status.
pub const AGE_REQUEST_FAILED: i64 = -1;
/// Provider answered but does not know the domain.
pub const AGE_UNKNOWN: i64 = -2;

pub const INDEX_BLOCKED: i64 = -1;
pub const INDEXED: i64 = 0;
pub const NOT_INDEXED: i64 = 1;

pub const RANK_FAILED: i64 = -1;
pub const RANK_ABSENT: i64 = 0;

const UNUSUAL_TRAFFIC: &str = "Our systems have detected unusual traffic from your computer network.";

const SEARCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/48.0.2564.116 Safari/537.36";

/// Provider-backed signals. An `Err` means the lookup itself failed; explicit
/// provider answers such as "unknown" or "blocked" come back as their
/// sentinel values.
#[async_trait]
pub trait ReputationLookup: Send + Sync {
    /// Age of the registrable domain in days.
    async fn domain_age(&self, domain: &str) -> Result<i64>;

    /// 0 when the URL is indexed, 1 when not, -1 when the engine blocked us.
    async fn google_index(&self, url: &str) -> Result<i64>;

    /// Integer page rank, 0 when the provider has none.
    async fn page_rank(&self, domain: &str) -> Result<i64>;

    async fn nameservers(&self, hostname: &str) -> Result<Vec<String>>;
}

/// Nameservers of a host, or the error that prevented resolving them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NameserverLookup {
    Found(Vec<String>),
    Error(String),
}

impl NameserverLookup {
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        NameserverLookup::Error(format!("Error: {}", reason))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReputationSignals {
    pub domain_age: i64,
    pub google_index: i64,
    pub page_rank: i64,
    pub nameservers: NameserverLookup,
}

impl ReputationSignals {
    /// Every signal at its failure sentinel.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            domain_age: AGE_REQUEST_FAILED,
            google_index: INDEX_BLOCKED,
            page_rank: RANK_FAILED,
            nameservers: NameserverLookup::failed(reason),
        }
    }
}

/// Run every lookup concurrently, substituting sentinels for failures. The
/// returned warnings name each substitution.
pub async fn gather(
    lookup: &dyn ReputationLookup,
    domain: &str,
    url: &str,
    hostname: &str,
) -> (ReputationSignals, Vec<String>) {
    let (age, index, rank, nameservers) = tokio::join!(
        lookup.domain_age(domain),
        lookup.google_index(url),
        lookup.page_rank(domain),
        lookup.nameservers(hostname),
    );

    let mut warnings = Vec::new();
    let mut settle = |signal: &str, result: Result<i64>, sentinel: i64| match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} lookup for {} failed, using {}: {}", signal, domain, sentinel, e);
            warnings.push(format!("{}: {}", signal, e));
            sentinel
        }
    };

    let domain_age = settle("domain_age", age, AGE_REQUEST_FAILED);
    let google_index = settle("google_index", index, INDEX_BLOCKED);
    let page_rank = settle("page_rank", rank, RANK_FAILED);

    let nameservers = match nameservers {
        Ok(names) => NameserverLookup::Found(names),
        Err(e) => {
            warnings.push(format!("nameservers: {}", e));
            NameserverLookup::failed(e)
        }
    };

    (
        ReputationSignals {
            domain_age,
            google_index,
            page_rank,
            nameservers,
        },
        warnings,
    )
}

/// Base URLs of the reputation providers.
#[derive(Debug, Clone)]
pub struct ReputationEndpoints {
    pub domain_age: String,
    pub search: String,
    pub page_rank: String,
}

impl Default for ReputationEndpoints {
    fn default() -> Self {
        Self {
            domain_age: "https://input.payapi.io/v1/api/fraud/domain/age/".to_string(),
            search: "https://www.google.com/search".to_string(),
            page_rank: "https://openpagerank.com/api/v1.0/getPageRank".to_string(),
        }
    }
}

/// Lookups against the public providers over HTTP and the system resolver.
pub struct HttpReputation {
    client: Client,
    resolver: Option<TokioAsyncResolver>,
    page_rank_key: Option<String>,
    endpoints: ReputationEndpoints,
    timeout: Duration,
}

impl HttpReputation {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.reputation_timeout)
            .build()
            .map_err(ScanError::from)?;

        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => Some(resolver),
            Err(e) => {
                warn!("System DNS configuration unavailable: {}", e);
                None
            }
        };

        Ok(Self {
            client,
            resolver,
            page_rank_key: config.page_rank_key.clone(),
            endpoints: ReputationEndpoints::default(),
            timeout: config.reputation_timeout,
        })
    }

    pub fn with_endpoints(mut self, endpoints: ReputationEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn get_text(&self, request: reqwest::RequestBuilder) -> Result<(u16, String)> {
        let response = request.send().await.map_err(lookup_failure)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(lookup_failure)?;
        Ok((status, body))
    }
}

fn lookup_failure(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::ReputationLookupFailure(e.to_string())
}

/// Host part of a domain-or-URL string.
fn bare_host(domain: &str) -> &str {
    let rest = domain.rsplit("//").next().unwrap_or(domain);
    let rest = rest.split('/').next().unwrap_or(rest);
    rest.split('?').next().unwrap_or(rest)
}

#[async_trait]
impl ReputationLookup for HttpReputation {
    async fn domain_age(&self, domain: &str) -> Result<i64> {
        let url = format!("{}{}", self.endpoints.domain_age, bare_host(domain));
        debug!("Domain age lookup: {}", url);

        let (status, body) = self.get_text(self.client.get(&url)).await?;
        if status != 200 {
            return Err(lookup_failure(format!("age provider returned {}", status)));
        }

        let json: serde_json::Value = serde_json::from_str(&body).map_err(lookup_failure)?;
        match json.get("result") {
            Some(serde_json::Value::Null) => Ok(AGE_UNKNOWN),
            Some(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|v| v as i64))
                .ok_or_else(|| lookup_failure(format!("unexpected age value {}", value))),
            None => Err(lookup_failure("age response has no result field")),
        }
    }

    async fn google_index(&self, url: &str) -> Result<i64> {
        let query = format!("site:{}", url);
        let request = self
            .client
            .get(&self.endpoints.search)
            .header(reqwest::header::USER_AGENT, SEARCH_USER_AGENT)
            .query(&[("q", query.as_str())]);

        let (_, body) = self.get_text(request).await?;
        if body.contains(UNUSUAL_TRAFFIC) {
            return Ok(INDEX_BLOCKED);
        }
        Ok(first_result_link(&body))
    }

    async fn page_rank(&self, domain: &str) -> Result<i64> {
        let Some(key) = &self.page_rank_key else {
            return Err(lookup_failure("no page rank API key configured"));
        };

        let url = format!("{}?domains%5B0%5D={}", self.endpoints.page_rank, domain);
        let (_, body) = self
            .get_text(self.client.get(&url).header("API-OPR", key))
            .await?;

        let json: serde_json::Value = serde_json::from_str(&body).map_err(lookup_failure)?;
        let rank = json
            .get("response")
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("page_rank_integer"))
            .ok_or_else(|| lookup_failure("page rank response has no page_rank_integer"))?;

        Ok(rank.as_i64().filter(|&r| r != 0).unwrap_or(RANK_ABSENT))
    }

    async fn nameservers(&self, hostname: &str) -> Result<Vec<String>> {
        let Some(resolver) = &self.resolver else {
            return Err(lookup_failure("no DNS resolver available"));
        };

        let name = hostname.strip_prefix("www.").unwrap_or(hostname);
        let lookup = tokio::time::timeout(self.timeout, resolver.ns_lookup(name))
            .await
            .map_err(|_| lookup_failure(format!("NS lookup for {} timed out", name)))?
            .map_err(lookup_failure)?;

        Ok(lookup.iter().map(|ns| ns.to_string()).collect())
    }
}

/// `INDEXED` when the first organic result block holds a link with a target.
fn first_result_link(body: &str) -> i64 {
    let (Ok(results), Ok(div), Ok(anchor)) = (
        Selector::parse("#rso"),
        Selector::parse("div"),
        Selector::parse("a"),
    ) else {
        return NOT_INDEXED;
    };

    let document = Html::parse_document(body);
    let link = document
        .select(&results)
        .next()
        .and_then(|rso| rso.select(&div).next())
        .and_then(|outer| outer.select(&div).next())
        .and_then(|inner| inner.select(&anchor).next())
        .and_then(|a| a.value().attr("href"));

    match link {
        Some(href) if !href.is_empty() => INDEXED,
        _ => NOT_INDEXED,
    }
}

/// Lookups switched off; every signal falls back to its sentinel.
pub struct DisabledReputation;

#[async_trait]
impl ReputationLookup for DisabledReputation {
    async fn domain_age(&self, _domain: &str) -> Result<i64> {
        Err(lookup_failure("lookups disabled"))
    }

    async fn google_index(&self, _url: &str) -> Result<i64> {
        Err(lookup_failure("lookups disabled"))
    }

    async fn page_rank(&self, _domain: &str) -> Result<i64> {
        Err(lookup_failure("lookups disabled"))
    }

    async fn nameservers(&self, _hostname: &str) -> Result<Vec<String>> {
        Err(lookup_failure("lookups disabled"))
    }
}
