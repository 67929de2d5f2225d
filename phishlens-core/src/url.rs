// URL normalization: scheme defaulting, public-suffix-aware domain split and
// word tokenization.

use crate::error::{AnalysisError, Result};
use publicsuffix::{IcannList, Psl};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;
use ::url::{Host, Url};

const BUNDLED_SUFFIX_LIST: &str = include_str!("../data/public_suffix_list.dat");

/// Characters that separate words in hostnames and paths.
const WORD_SEPARATORS: &[char] = &['-', '.', '/', '?', '=', '@', '&', '%', ':', '_'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultScheme {
    Http,
    Https,
}

impl fmt::Display for DefaultScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultScheme::Http => write!(f, "http"),
            DefaultScheme::Https => write!(f, "https"),
        }
    }
}

/// A parsed input URL.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateUrl {
    /// Input as given, trimmed.
    pub raw: String,
    /// Input with the default scheme applied; not re-serialized.
    pub url: String,
    pub scheme: String,
    pub hostname: String,
    pub path: String,
    /// Registrable domain, second-level label plus public suffix.
    pub domain: String,
    /// Second-level label alone.
    pub domain_label: String,
    pub subdomain: String,
    pub suffix: String,
}

/// Word lists derived from a URL's label, subdomain and path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlTokens {
    /// Label, path and subdomain words, in that order.
    pub raw: Vec<String>,
    pub host: Vec<String>,
    pub path: Vec<String>,
}

impl CandidateUrl {
    pub fn tokens(&self) -> UrlTokens {
        let label = split_words(&self.domain_label);
        let subdomain = split_words(&self.subdomain);
        let path = split_words(&self.path);

        let raw = label
            .iter()
            .chain(path.iter())
            .chain(subdomain.iter())
            .cloned()
            .collect();
        let host = label.into_iter().chain(subdomain).collect();

        UrlTokens { raw, host, path }
    }

    pub fn is_ip(&self) -> bool {
        self.suffix.is_empty() && self.domain == self.hostname && self.subdomain.is_empty()
    }
}

/// Split on the URL word separators, lowercased, empty words dropped.
pub fn split_words(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(WORD_SEPARATORS)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenize a hostname and a path independently.
pub fn tokenize(host: &str, path: &str) -> UrlTokens {
    let host_words = split_words(host);
    let path_words = split_words(path);
    let raw = host_words.iter().chain(path_words.iter()).cloned().collect();

    UrlTokens {
        raw,
        host: host_words,
        path: path_words,
    }
}

pub struct UrlNormalizer {
    /// ICANN rules only; private registrations such as `github.io` are not suffixes.
    suffixes: IcannList,
}

impl UrlNormalizer {
    /// Normalizer backed by the suffix list compiled into the crate.
    pub fn new() -> Result<Self> {
        Self::from_list_str(BUNDLED_SUFFIX_LIST)
    }

    pub fn from_list_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::InvalidUrl(format!(
                "cannot read suffix list {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_list_str(&contents)
    }

    fn from_list_str(contents: &str) -> Result<Self> {
        let suffixes = contents
            .parse::<IcannList>()
            .map_err(|e| AnalysisError::InvalidUrl(format!("invalid suffix list: {}", e)))?;
        Ok(Self { suffixes })
    }

    /// Parse `raw`, prefixing `scheme` when it carries no http(s) scheme.
    pub fn normalize(&self, raw: &str, scheme: DefaultScheme) -> Result<CandidateUrl> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AnalysisError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let url = with_scheme(raw, scheme);
        let parsed =
            Url::parse(&url).map_err(|e| AnalysisError::InvalidUrl(format!("{}: {}", raw, e)))?;

        let hostname = match parsed.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            _ => {
                return Err(AnalysisError::InvalidUrl(format!(
                    "{}: no hostname found",
                    raw
                )));
            }
        };

        let (domain, domain_label, subdomain, suffix) =
            if matches!(parsed.host(), Some(Host::Domain(_))) {
                self.split_host(&hostname)
            } else {
                (hostname.clone(), hostname.clone(), String::new(), String::new())
            };

        debug!(
            "Normalized {} -> host={} domain={} subdomain={} suffix={}",
            raw, hostname, domain, subdomain, suffix
        );

        Ok(CandidateUrl {
            raw: raw.to_string(),
            scheme: parsed.scheme().to_string(),
            path: decoded_path(parsed.path()),
            url,
            hostname,
            domain,
            domain_label,
            subdomain,
            suffix,
        })
    }

    /// Split a hostname into (domain, label, subdomain, suffix).
    pub fn split_host(&self, hostname: &str) -> (String, String, String, String) {
        let host = hostname.trim_end_matches('.').to_lowercase();

        let suffix = self
            .suffixes
            .suffix(host.as_bytes())
            .and_then(|s| std::str::from_utf8(s.as_bytes()).ok())
            .unwrap_or_default()
            .to_string();

        let domain = self
            .suffixes
            .domain(host.as_bytes())
            .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
            .map(str::to_string);

        match domain {
            Some(domain) => {
                let label = domain
                    .strip_suffix(&suffix)
                    .map(|l| l.trim_end_matches('.'))
                    .unwrap_or(&domain)
                    .to_string();
                let subdomain = host
                    .strip_suffix(&domain)
                    .map(|s| s.trim_end_matches('.'))
                    .unwrap_or_default()
                    .to_string();
                (domain, label, subdomain, suffix)
            }
            // Host is itself a public suffix
            None => (host.clone(), host, String::new(), suffix),
        }
    }

    /// Registrable domain of a bare hostname, or the hostname itself when it
    /// has none.
    pub fn registrable_domain(&self, hostname: &str) -> String {
        self.split_host(hostname).0
    }
}

/// `Url::path` is percent-encoded; words are taken from the decoded form.
fn decoded_path(path: &str) -> String {
    match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
        }
    }
}

fn with_scheme(raw: &str, scheme: DefaultScheme) -> String {
    let lowered = raw.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        raw.to_string()
    } else {
        format!("{}://{}", scheme, raw)
    }
}
