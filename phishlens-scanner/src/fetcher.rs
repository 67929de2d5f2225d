use crate::error::Result;
use crate::result::{FetchResult, Page};
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, LOCATION, USER_AGENT,
};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Response};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Status codes that count as a successful fetch (together with a non-empty body).
pub const ACCESSIBLE_STATUSES: [u16; 5] = [200, 201, 202, 203, 206];

/// Redirect statuses the fetcher follows by hand when the client did not.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_ENCODING: &str = "gzip, deflate";

/// Browser-like header sets sent with each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    Standard,
    /// Same as `Standard` but asks for Indonesian content first.
    Indonesian,
}

impl HeaderProfile {
    pub fn accept_language(self) -> &'static str {
        match self {
            HeaderProfile::Standard => "en-US,en;q=0.5",
            HeaderProfile::Indonesian => "id-ID,id;q=0.9,en;q=0.8",
        }
    }

    pub fn headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(self.accept_language()),
        );
        headers.insert(
            ACCEPT_ENCODING,
            HeaderValue::from_static(BROWSER_ACCEPT_ENCODING),
        );
        headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
        headers
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            follow_redirects: true,
            max_redirects: 10,
        }
    }
}

/// Retrieves a page body through a fixed cascade of URL variants and header
/// profiles, stopping at the first accessible response. TLS certificate
/// validation is disabled for every attempt.
pub struct Fetcher {
    client: Client,
    session: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = Self::client_builder(&config).build()?;
        let session = Self::client_builder(&config)
            .cookie_store(true)
            .default_headers(HeaderProfile::Standard.headers())
            .build()?;

        Ok(Self {
            client,
            session,
            config,
        })
    }

    fn client_builder(config: &FetchConfig) -> ClientBuilder {
        let redirect = if config.follow_redirects {
            Policy::limited(config.max_redirects)
        } else {
            Policy::none()
        };

        Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.timeout / 2)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(redirect)
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url`, trying every variant in order. Never fails: exhausting all
    /// attempts yields `FetchResult::Inaccessible`.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let variants = url_variants(url);
        debug!("Fetching {} via {} variants", url, variants.len());
        self.cascade(url, &variants, is_indonesian_host(url)).await
    }

    /// Standard headers over every variant, then Indonesian locale headers
    /// when `indonesian` is set, then one cookie-session attempt on `url`.
    async fn cascade(&self, url: &str, variants: &[String], indonesian: bool) -> FetchResult {
        for variant in variants {
            if let Some(page) = self
                .attempt(&self.client, variant, HeaderProfile::Standard)
                .await
            {
                return FetchResult::Accessible(page);
            }
        }

        if indonesian {
            debug!("Retrying {} with Indonesian locale headers", url);
            for variant in variants {
                if let Some(page) = self
                    .attempt(&self.client, variant, HeaderProfile::Indonesian)
                    .await
                {
                    return FetchResult::Accessible(page);
                }
            }
        }

        debug!("Retrying {} with a cookie session", url);
        if let Some(page) = self
            .attempt(&self.session, url, HeaderProfile::Standard)
            .await
        {
            return FetchResult::Accessible(page);
        }

        warn!("All fetch attempts for {} failed", url);
        FetchResult::Inaccessible
    }

    /// Single HEAD request, used to explain why a page was inaccessible.
    pub async fn probe(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .head(url)
            .headers(HeaderProfile::Standard.headers())
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn attempt(&self, client: &Client, url: &str, profile: HeaderProfile) -> Option<Page> {
        let start = Instant::now();
        let response = match client.get(url).headers(profile.headers()).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Attempt {} failed: {}", url, e);
                return None;
            }
        };

        let status = response.status().as_u16();
        if REDIRECT_STATUSES.contains(&status) {
            let target = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| resolve_location(url, location))?;

            debug!("{} answered {} -> following {}", url, status, target);
            let start = Instant::now();
            return match client.get(&target).headers(profile.headers()).send().await {
                Ok(redirected) => Self::accept(redirected, start).await,
                Err(e) => {
                    debug!("Redirect target {} failed: {}", target, e);
                    None
                }
            };
        }

        Self::accept(response, start).await
    }

    async fn accept(response: Response, start: Instant) -> Option<Page> {
        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();

        if !ACCESSIBLE_STATUSES.contains(&status_code) {
            debug!("{} answered {}", final_url, status_code);
            return None;
        }

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => {
                debug!("Reading body of {} failed: {}", final_url, e);
                return None;
            }
        };

        if body.is_empty() {
            debug!("{} answered {} with an empty body", final_url, status_code);
            return None;
        }

        info!("Fetched {} ({} bytes, status {})", final_url, body.len(), status_code);
        Some(Page {
            final_url,
            status_code,
            body,
            headers,
            response_time: start.elapsed(),
        })
    }
}

/// Ordered fetch variants: the URL itself, its `www.` counterpart (added or
/// stripped), then the scheme-flipped URL. Duplicates are dropped.
pub fn url_variants(url: &str) -> Vec<String> {
    let mut variants = vec![url.to_string()];

    if let Ok(parsed) = Url::parse(url)
        && let Some(host) = parsed.domain()
    {
        let counterpart = match host.strip_prefix("www.") {
            Some(bare) => bare.to_string(),
            None => format!("www.{}", host),
        };
        let mut www = parsed.clone();
        if www.set_host(Some(&counterpart)).is_ok() {
            push_unique(&mut variants, www.to_string());
        }
    }

    if let Some(rest) = url.strip_prefix("http://") {
        push_unique(&mut variants, format!("https://{}", rest));
    } else if let Some(rest) = url.strip_prefix("https://") {
        push_unique(&mut variants, format!("http://{}", rest));
    }

    variants
}

fn push_unique(variants: &mut Vec<String>, candidate: String) {
    if !variants.contains(&candidate) {
        variants.push(candidate);
    }
}

fn is_indonesian_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .map(|host| host.ends_with(".id"))
        .unwrap_or(false)
}

fn resolve_location(base: &str, location: &str) -> Option<String> {
    let base_url = Url::parse(base).ok()?;
    base_url.join(location).ok().map(|u| u.to_string())
}
