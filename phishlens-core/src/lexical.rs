// Lexical features: pure string computations over the URL and its hostname.

use crate::features::{self, FeatureMap};
use crate::url::CandidateUrl;
use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords counted by [`phish_hints`].
pub const HINTS: [&str; 16] = [
    "wp", "login", "includes", "admin", "content", "site", "images", "js", "alibaba", "css",
    "myaccount", "dropbox", "themes", "plugins", "signin", "view",
];

static IP_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(([01]?\d\d?|2[0-4]\d|25[0-5])\.([01]?\d\d?|2[0-4]\d|25[0-5])\.",
        r"([01]?\d\d?|2[0-4]\d|25[0-5])\.([01]?\d\d?|2[0-4]\d|25[0-5])/)|",
        r"((0x[0-9a-fA-F]{1,2})\.(0x[0-9a-fA-F]{1,2})\.(0x[0-9a-fA-F]{1,2})\.(0x[0-9a-fA-F]{1,2})/)|",
        r"(?:[a-fA-F0-9]{1,4}:){7}[a-fA-F0-9]{1,4}|",
        r"[0-9a-fA-F]{7}",
    ))
    .expect("valid IP literal pattern")
});

static PREFIX_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^-]+-[^-]+/").expect("valid prefix/suffix pattern"));

/// Whether the URL embeds an IPv4 (dotted or hex), IPv6 or long hex literal.
pub fn having_ip(url: &str) -> bool {
    IP_LITERAL.is_match(url)
}

pub fn count_char(s: &str, c: char) -> usize {
    s.matches(c).count()
}

/// Share of characters that are ASCII digits; 0 for an empty string.
pub fn ratio_digits(s: &str) -> f64 {
    let total = s.chars().count();
    if total == 0 {
        return 0.0;
    }
    let digits = s.chars().filter(char::is_ascii_digit).count();
    digits as f64 / total as f64
}

/// Words containing `www`.
pub fn count_www(words: &[String]) -> usize {
    words.iter().filter(|w| w.contains("www")).count()
}

pub fn tld_in_subdomain(suffix: &str, subdomain: &str) -> bool {
    subdomain.contains(suffix)
}

/// Matches `http(s)://xxx-yyy/` shapes. Applied to the bare hostname, which
/// carries no scheme, so it only fires on unusual inputs.
pub fn prefix_suffix(hostname: &str) -> bool {
    PREFIX_SUFFIX.is_match(hostname)
}

pub fn shortest_word_length(words: &[String]) -> usize {
    words.iter().map(|w| w.chars().count()).min().unwrap_or(0)
}

pub fn longest_word_length(words: &[String]) -> usize {
    words.iter().map(|w| w.chars().count()).max().unwrap_or(0)
}

/// Total occurrences of every hint keyword, case-insensitive. Each keyword is
/// counted independently, so overlapping keywords add up.
pub fn phish_hints(url: &str) -> usize {
    let lowered = url.to_lowercase();
    HINTS.iter().map(|hint| lowered.matches(hint).count()).sum()
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Every lexical feature of `candidate`, keyed by feature name.
pub fn lexical_features(candidate: &CandidateUrl) -> FeatureMap {
    let url = candidate.url.as_str();
    let hostname = candidate.hostname.as_str();
    let tokens = candidate.tokens();

    let mut map = FeatureMap::new();
    map.insert(features::LENGTH_URL.into(), url.chars().count() as f64);
    map.insert(features::LENGTH_HOSTNAME.into(), hostname.chars().count() as f64);
    map.insert(features::IP.into(), flag(having_ip(url)));
    map.insert(features::NB_DOTS.into(), count_char(hostname, '.') as f64);
    map.insert(features::NB_QM.into(), count_char(url, '?') as f64);
    map.insert(features::NB_EQ.into(), count_char(url, '=') as f64);
    map.insert(features::NB_SLASH.into(), count_char(url, '/') as f64);
    map.insert(features::NB_WWW.into(), count_www(&tokens.raw) as f64);
    map.insert(features::RATIO_DIGITS_URL.into(), ratio_digits(url));
    map.insert(features::RATIO_DIGITS_HOST.into(), ratio_digits(hostname));
    map.insert(
        features::TLD_IN_SUBDOMAIN.into(),
        flag(tld_in_subdomain(&candidate.suffix, &candidate.subdomain)),
    );
    map.insert(features::PREFIX_SUFFIX.into(), flag(prefix_suffix(hostname)));
    map.insert(
        features::SHORTEST_WORD_HOST.into(),
        shortest_word_length(&tokens.host) as f64,
    );
    map.insert(
        features::LONGEST_WORDS_RAW.into(),
        longest_word_length(&tokens.raw) as f64,
    );
    map.insert(
        features::LONGEST_WORD_PATH.into(),
        longest_word_length(&tokens.path) as f64,
    );
    map.insert(features::PHISH_HINTS.into(), phish_hints(url) as f64);
    map
}
