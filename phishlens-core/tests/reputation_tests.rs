// Tests for reputation lookups against mocked providers

use phishlens_core::config::AnalyzerConfig;
use phishlens_core::reputation::*;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn reputation_for(server: &MockServer, key: Option<&str>) -> HttpReputation {
    let config = AnalyzerConfig {
        page_rank_key: key.map(str::to_string),
        reputation_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    HttpReputation::new(&config)
        .unwrap()
        .with_endpoints(ReputationEndpoints {
            domain_age: format!("{}/age/", server.uri()),
            search: format!("{}/search", server.uri()),
            page_rank: format!("{}/rank", server.uri()),
        })
}

// ============================================================================
// Domain Age
// ============================================================================

#[tokio::test]
async fn test_domain_age_known() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/age/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": 4021})))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, None).await;
    assert_eq!(reputation.domain_age("example.com").await.unwrap(), 4021);
}

#[tokio::test]
async fn test_domain_age_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/age/fresh.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": null})))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, None).await;
    assert_eq!(
        reputation.domain_age("fresh.example").await.unwrap(),
        AGE_UNKNOWN
    );
}

#[tokio::test]
async fn test_domain_age_error_status_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, None).await;
    assert!(reputation.domain_age("example.com").await.is_err());
}

// ============================================================================
// Search Index
// ============================================================================

#[tokio::test]
async fn test_google_index_indexed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "site:https://example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div id="rso"><div><div><a href="https://example.com/">Example</a></div></div></div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, None).await;
    assert_eq!(
        reputation.google_index("https://example.com").await.unwrap(),
        INDEXED
    );
}

#[tokio::test]
async fn test_google_index_not_indexed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>No results</p></body></html>"),
        )
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, None).await;
    assert_eq!(
        reputation.google_index("https://nowhere.example").await.unwrap(),
        NOT_INDEXED
    );
}

#[tokio::test]
async fn test_google_index_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            "<html>Our systems have detected unusual traffic from your computer network.</html>",
        ))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, None).await;
    assert_eq!(
        reputation.google_index("https://example.com").await.unwrap(),
        INDEX_BLOCKED
    );
}

// ============================================================================
// Page Rank
// ============================================================================

#[tokio::test]
async fn test_page_rank_with_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rank"))
        .and(query_param("domains[0]", "example.com"))
        .and(header("API-OPR", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status_code": 200,
            "response": [{"page_rank_integer": 6, "domain": "example.com"}]
        })))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, Some("secret")).await;
    assert_eq!(reputation.page_rank("example.com").await.unwrap(), 6);
}

#[tokio::test]
async fn test_page_rank_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": [{"page_rank_integer": 0}]
        })))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, Some("secret")).await;
    assert_eq!(
        reputation.page_rank("example.com").await.unwrap(),
        RANK_ABSENT
    );
}

#[tokio::test]
async fn test_page_rank_without_key_fails() {
    let server = MockServer::start().await;
    let reputation = reputation_for(&server, None).await;
    assert!(reputation.page_rank("example.com").await.is_err());
}

// ============================================================================
// Sentinel Substitution
// ============================================================================

#[tokio::test]
async fn test_gather_substitutes_sentinels() {
    let (signals, warnings) = gather(
        &DisabledReputation,
        "example.com",
        "https://example.com",
        "www.example.com",
    )
    .await;

    assert_eq!(signals.domain_age, AGE_REQUEST_FAILED);
    assert_eq!(signals.google_index, INDEX_BLOCKED);
    assert_eq!(signals.page_rank, RANK_FAILED);
    assert!(matches!(signals.nameservers, NameserverLookup::Error(ref e) if e.starts_with("Error: ")));
    assert_eq!(warnings.len(), 4);
}

#[tokio::test]
async fn test_gather_keeps_provider_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/age/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": null})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let reputation = reputation_for(&server, None).await;
    let (signals, warnings) = gather(
        &reputation,
        "example.com",
        "https://example.com",
        "invalid.",
    )
    .await;

    assert_eq!(signals.domain_age, AGE_UNKNOWN);
    assert_eq!(signals.google_index, NOT_INDEXED);
    assert_eq!(signals.page_rank, RANK_FAILED);
    assert!(warnings.iter().any(|w| w.starts_with("page_rank")));
}

#[test]
fn test_nameserver_lookup_serializes_untagged() {
    let found = NameserverLookup::Found(vec!["ns1.example.com.".to_string()]);
    let failed = NameserverLookup::failed("NXDOMAIN");

    assert_eq!(
        serde_json::to_value(&found).unwrap(),
        serde_json::json!(["ns1.example.com."])
    );
    assert_eq!(
        serde_json::to_value(&failed).unwrap(),
        serde_json::json!("Error: NXDOMAIN")
    );
}
