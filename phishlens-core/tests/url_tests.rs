// Tests for URL normalization and tokenization

use phishlens_core::error::AnalysisError;
use phishlens_core::url::{DefaultScheme, UrlNormalizer, split_words, tokenize};
use std::io::Write;

fn normalizer() -> UrlNormalizer {
    UrlNormalizer::new().expect("bundled suffix list parses")
}

// ============================================================================
// Normalization Tests
// ============================================================================

#[test]
fn test_normalize_adds_default_scheme() {
    let n = normalizer();

    let https = n.normalize("example.com", DefaultScheme::Https).unwrap();
    assert_eq!(https.url, "https://example.com");
    assert_eq!(https.scheme, "https");

    let http = n.normalize("example.com/login", DefaultScheme::Http).unwrap();
    assert_eq!(http.url, "http://example.com/login");
    assert_eq!(http.path, "/login");
}

#[test]
fn test_normalize_keeps_existing_scheme() {
    let candidate = normalizer()
        .normalize("  HTTP://Example.com/Path  ", DefaultScheme::Https)
        .unwrap();

    assert_eq!(candidate.raw, "HTTP://Example.com/Path");
    assert_eq!(candidate.url, "HTTP://Example.com/Path");
    assert_eq!(candidate.scheme, "http");
    assert_eq!(candidate.hostname, "example.com");
}

#[test]
fn test_normalize_splits_multi_label_suffix() {
    let candidate = normalizer()
        .normalize("http://login.secure.example.co.uk/path", DefaultScheme::Https)
        .unwrap();

    assert_eq!(candidate.hostname, "login.secure.example.co.uk");
    assert_eq!(candidate.domain, "example.co.uk");
    assert_eq!(candidate.domain_label, "example");
    assert_eq!(candidate.subdomain, "login.secure");
    assert_eq!(candidate.suffix, "co.uk");
}

#[test]
fn test_normalize_indonesian_suffix() {
    let candidate = normalizer()
        .normalize("https://www.bank.co.id/", DefaultScheme::Https)
        .unwrap();

    assert_eq!(candidate.domain, "bank.co.id");
    assert_eq!(candidate.subdomain, "www");
    assert_eq!(candidate.suffix, "co.id");
}

#[test]
fn test_normalize_ip_host() {
    let candidate = normalizer()
        .normalize("http://192.168.1.1/admin", DefaultScheme::Https)
        .unwrap();

    assert_eq!(candidate.hostname, "192.168.1.1");
    assert_eq!(candidate.domain, "192.168.1.1");
    assert_eq!(candidate.subdomain, "");
    assert_eq!(candidate.suffix, "");
    assert!(candidate.is_ip());
}

#[test]
fn test_normalize_rejects_empty_input() {
    let result = normalizer().normalize("   ", DefaultScheme::Https);
    assert!(matches!(result, Err(AnalysisError::InvalidUrl(_))));
}

#[test]
fn test_normalize_rejects_missing_host() {
    let result = normalizer().normalize("http://", DefaultScheme::Https);
    assert!(matches!(result, Err(AnalysisError::InvalidUrl(_))));
}

#[test]
fn test_custom_suffix_list() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "// ===BEGIN ICANN DOMAINS===\nzz\nco.zz\n// ===END ICANN DOMAINS==="
    )
    .unwrap();

    let n = UrlNormalizer::from_list_file(file.path()).unwrap();
    let candidate = n.normalize("http://a.b.co.zz/", DefaultScheme::Http).unwrap();

    assert_eq!(candidate.domain, "b.co.zz");
    assert_eq!(candidate.subdomain, "a");
    assert_eq!(candidate.suffix, "co.zz");
}

#[test]
fn test_missing_suffix_list_file() {
    let result = UrlNormalizer::from_list_file(std::path::Path::new("/nonexistent/psl.dat"));
    assert!(result.is_err());
}

// ============================================================================
// Tokenization Tests
// ============================================================================

#[test]
fn test_tokenize_host_and_path() {
    let tokens = tokenize("sub.do-main.com", "/a?x=1");

    assert_eq!(tokens.host, vec!["sub", "do", "main", "com"]);
    assert_eq!(tokens.path, vec!["a", "x", "1"]);
    assert!(tokens.raw.iter().all(|t| !t.is_empty()));
}

#[test]
fn test_split_words_covers_every_separator() {
    let words = split_words("A-b.c/d?e=f@g&h%i:j_k");
    assert_eq!(
        words,
        vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"]
    );
}

#[test]
fn test_split_words_drops_empty_tokens() {
    assert!(split_words("").is_empty());
    assert!(split_words("//--..").is_empty());
}

#[test]
fn test_candidate_tokens_use_label_path_and_subdomain() {
    let candidate = normalizer()
        .normalize("https://www.do-main.com/a/b_c", DefaultScheme::Https)
        .unwrap();
    let tokens = candidate.tokens();

    assert_eq!(tokens.raw, vec!["do", "main", "a", "b", "c", "www"]);
    assert_eq!(tokens.host, vec!["do", "main", "www"]);
    assert_eq!(tokens.path, vec!["a", "b", "c"]);
}

// ============================================================================
// Suffix List Coverage
// ============================================================================

#[test]
fn test_normalize_country_second_level_suffixes() {
    let n = normalizer();

    let nigeria = n
        .normalize("https://secure-login.com.ng/", DefaultScheme::Https)
        .unwrap();
    assert_eq!(nigeria.domain, "secure-login.com.ng");
    assert_eq!(nigeria.domain_label, "secure-login");
    assert_eq!(nigeria.subdomain, "");
    assert_eq!(nigeria.suffix, "com.ng");

    let india = n.normalize("portal.gov.in", DefaultScheme::Https).unwrap();
    assert_eq!(india.domain, "portal.gov.in");
    assert_eq!(india.suffix, "gov.in");

    let israel = n.normalize("http://bank.co.il/", DefaultScheme::Http).unwrap();
    assert_eq!(israel.domain, "bank.co.il");
}

#[test]
fn test_private_registrations_are_not_suffixes() {
    let candidate = normalizer()
        .normalize("https://evil.github.io/login", DefaultScheme::Https)
        .unwrap();

    assert_eq!(candidate.domain, "github.io");
    assert_eq!(candidate.domain_label, "github");
    assert_eq!(candidate.subdomain, "evil");
    assert_eq!(candidate.suffix, "io");
}

#[test]
fn test_path_words_are_percent_decoded() {
    let candidate = normalizer()
        .normalize("https://example.com/connexion/sécurité", DefaultScheme::Https)
        .unwrap();

    assert_eq!(candidate.path, "/connexion/sécurité");
    assert_eq!(candidate.tokens().path, vec!["connexion", "sécurité"]);
}
