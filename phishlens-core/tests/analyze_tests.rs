// End-to-end tests for the analysis pipeline against a mocked site

use phishlens_core::analyze::{Analyzer, BatchEntry, BatchProgressCallback};
use phishlens_core::config::AnalyzerConfig;
use phishlens_core::error::AnalysisError;
use phishlens_core::features::{self, URL_FEATURES};
use phishlens_core::model::{Label, ModelBundle};
use phishlens_core::reputation::{AGE_REQUEST_FAILED, INDEX_BLOCKED, RANK_FAILED};
use phishlens_core::url::DefaultScheme;
use phishlens_scanner::ElementKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r##"<html><head><title>Secure Login</title></head><body>
    <a href="/a">A</a>
    <a href="/b">B</a>
    <a href="c.html">C</a>
    <a href="https://www.other.org/page">Other</a>
    <a href="https://login.phish.net/x">Phish</a>
    <a href="#">Top</a>
    <script src="https://cdn.evil.net/app.js"></script>
</body></html>"##;

fn neutral_model(extra: &[&str]) -> ModelBundle {
    let features: Vec<&str> = URL_FEATURES.iter().copied().chain(extra.iter().copied()).collect();
    let json = serde_json::json!({
        "model_type": "LogisticRegression",
        "features": features,
        "coefficients": vec![0.0; features.len()],
        "intercept": 0.0,
    });
    ModelBundle::from_json(&json.to_string()).unwrap()
}

fn analyzer_with(model: ModelBundle) -> Analyzer {
    let config = AnalyzerConfig::default()
        .offline()
        .with_timeout(Duration::from_secs(5));
    Analyzer::new(config, Arc::new(model)).unwrap()
}

fn analyzer() -> Analyzer {
    analyzer_with(neutral_model(&[]))
}

async fn site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(LOGIN_PAGE),
        )
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Single URL
// ============================================================================

#[tokio::test]
async fn test_analyze_accessible_page() {
    let server = site().await;
    let url = format!("{}/login", server.uri());

    let analysis = analyzer().analyze(&url, DefaultScheme::Https).await.unwrap();

    assert!(analysis.accessible);
    assert_eq!(analysis.url, url);
    assert_eq!(analysis.features[features::NB_HYPERLINKS], 6.0);
    assert_eq!(analysis.features[features::RATIO_INT_HYPERLINKS], 0.5);
    assert_eq!(analysis.features[features::EMPTY_TITLE], 0.0);
    assert_eq!(analysis.extracted_content.titles, vec!["Secure Login"]);
    assert!(analysis.extracted_content.error.is_none());
}

#[tokio::test]
async fn test_null_anchor_stays_out_of_link_sets() {
    let server = site().await;
    let url = format!("{}/login", server.uri());

    let analysis = analyzer().analyze(&url, DefaultScheme::Https).await.unwrap();
    let anchors = analysis
        .structure
        .as_ref()
        .unwrap()
        .links
        .get(ElementKind::Anchor)
        .clone();

    assert_eq!(anchors.internals.len(), 3);
    assert_eq!(anchors.externals.len(), 2);
    assert_eq!(anchors.nulls, vec!["#"]);
    assert!(!anchors.internals.iter().any(|l| l.ends_with('#')));
    assert!(!anchors.externals.iter().any(|l| l == "#"));
}

#[tokio::test]
async fn test_analyze_vector_follows_model_schema() {
    let server = site().await;
    let url = format!("{}/login", server.uri());

    let analysis = analyzer().analyze(&url, DefaultScheme::Https).await.unwrap();

    assert_eq!(analysis.vector.len(), URL_FEATURES.len());
    assert_eq!(analysis.vector.names()[0], "length_url");
    assert_eq!(analysis.prediction.probability, 0.5);
    assert_eq!(analysis.prediction.label, Label::Legitimate);
}

#[tokio::test]
async fn test_offline_lookups_use_sentinels() {
    let server = site().await;
    let url = format!("{}/login", server.uri());

    let analysis = analyzer().analyze(&url, DefaultScheme::Https).await.unwrap();

    assert_eq!(analysis.reputation.domain_age, AGE_REQUEST_FAILED);
    assert_eq!(analysis.features[features::DOMAIN_AGE], -1.0);
    assert_eq!(analysis.features[features::GOOGLE_INDEX], INDEX_BLOCKED as f64);
    assert_eq!(analysis.features[features::PAGE_RANK], RANK_FAILED as f64);
    assert_eq!(analysis.warnings.len(), 4);
}

#[tokio::test]
async fn test_inaccessible_page_uses_neutral_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let url = format!("{}/gone", server.uri());

    let analysis = analyzer().analyze(&url, DefaultScheme::Https).await.unwrap();

    assert!(!analysis.accessible);
    assert!(analysis.final_url.is_none());
    assert_eq!(analysis.features[features::NB_HYPERLINKS], 1.0);
    assert_eq!(analysis.features[features::RATIO_INT_HYPERLINKS], 0.5);
    assert_eq!(analysis.features[features::EMPTY_TITLE], 0.0);
    assert_eq!(analysis.features[features::DOMAIN_IN_TITLE], 0.0);
    assert_eq!(
        analysis.extracted_content.error.as_deref(),
        Some("URL not accessible")
    );
    assert!(analysis.warnings.iter().any(|w| w.starts_with("Page inaccessible")));
}

#[tokio::test]
async fn test_single_mode_defaults_to_https_then_falls_back() {
    let server = site().await;
    let raw = format!("{}/login", server.address());

    let analysis = analyzer().analyze(&raw, DefaultScheme::Https).await.unwrap();

    assert!(analysis.url.starts_with("https://"));
    assert!(analysis.accessible);
    assert!(analysis.final_url.unwrap().starts_with("http://"));
}

#[tokio::test]
async fn test_schema_mismatch_is_fatal() {
    let server = site().await;
    let url = format!("{}/login", server.uri());
    let analyzer = analyzer_with(neutral_model(&["favicon_external_ratio"]));

    let result = analyzer.analyze(&url, DefaultScheme::Https).await;

    assert!(matches!(
        result,
        Err(AnalysisError::SchemaMismatch(name)) if name == "favicon_external_ratio"
    ));
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let result = analyzer().analyze("   ", DefaultScheme::Https).await;
    assert!(matches!(result, Err(AnalysisError::InvalidUrl(_))));
}

// ============================================================================
// Batch
// ============================================================================

#[tokio::test]
async fn test_batch_preserves_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><title>slow</title></html>")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><title>fast</title></html>"))
        .mount(&server)
        .await;

    let urls = vec![
        format!("{}/slow", server.uri()),
        // No scheme: batch mode prefixes http://
        format!("{}/fast", server.address()),
        "".to_string(),
        "http://".to_string(),
    ];

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = seen.clone();
    let progress: BatchProgressCallback = Arc::new(move |_done, total, _url| {
        assert_eq!(total, 4);
        seen_clone.fetch_add(1, Ordering::Relaxed);
    });

    let entries = analyzer()
        .analyze_batch(&urls, Some(progress))
        .await
        .unwrap();

    assert_eq!(entries.len(), 4);
    assert!(entries[0].url().ends_with("/slow"));
    assert!(entries[1].url().starts_with("http://"));
    assert!(entries[1].url().ends_with("/fast"));
    assert!(entries[0].is_success());
    assert!(entries[1].is_success());
    assert!(matches!(&entries[2], BatchEntry::Failure { url, .. } if url.is_empty()));
    assert!(matches!(&entries[3], BatchEntry::Failure { error, .. } if error.contains("Invalid URL")));
    assert_eq!(seen.load(Ordering::Relaxed), 4);
}

#[tokio::test]
async fn test_batch_over_cap_rejected_before_fetch() {
    let urls: Vec<String> = (0..101).map(|i| format!("http://host{}.example", i)).collect();

    let result = analyzer().analyze_batch(&urls, None).await;

    assert!(matches!(result, Err(AnalysisError::BatchTooLarge(101, 100))));
}

#[tokio::test]
async fn test_batch_at_cap_is_accepted() {
    let urls: Vec<String> = vec![String::new(); 100];

    let entries = analyzer().analyze_batch(&urls, None).await.unwrap();

    assert_eq!(entries.len(), 100);
    assert!(entries.iter().all(|e| !e.is_success()));
}
