// Tests for content features derived from page structure

use phishlens_core::content::{ContentFeatures, domain_in_title};
use phishlens_core::features::{self, FeatureMap};
use phishlens_scanner::{ElementKind, classify};

const HOST: &str = "shop.example.com";
const DOMAIN: &str = "example.com";

fn features_for(html: &str) -> ContentFeatures {
    let report = classify(html.as_bytes(), Some("text/html"), HOST, DOMAIN);
    ContentFeatures::from_report(&report, DOMAIN)
}

#[test]
fn test_unreachable_defaults() {
    let defaults = ContentFeatures::UNREACHABLE;
    assert_eq!(defaults.nb_hyperlinks, 1.0);
    assert_eq!(defaults.ratio_int_hyperlinks, 0.5);
    assert_eq!(defaults.empty_title, 0.0);
    assert_eq!(defaults.domain_in_title, 0.0);
}

#[test]
fn test_hyperlink_totals_span_every_kind() {
    let content = features_for(
        r##"<html><head><title>Example Shop</title>
            <link rel="stylesheet" href="/style.css">
            <link rel="icon" href="https://static.cdn.net/favicon.ico">
        </head><body>
            <a href="/home">Home</a>
            <a href="#">Top</a>
            <img src="/logo.png">
            <script src="https://tracker.evil.net/t.js"></script>
            <form action="/search"></form>
        </body></html>"##,
    );

    // 4 internal (anchor, css, image, form), 2 external (favicon, script)
    assert_eq!(content.nb_hyperlinks, 6.0);
    assert!((content.ratio_int_hyperlinks - 4.0 / 6.0).abs() < 1e-9);
}

#[test]
fn test_null_links_are_not_hyperlinks() {
    let report = classify(
        br##"<a href="#">x</a><a href="javascript:void(0)">y</a>"##,
        None,
        HOST,
        DOMAIN,
    );
    let content = ContentFeatures::from_report(&report, DOMAIN);

    assert_eq!(report.links.get(ElementKind::Anchor).nulls.len(), 2);
    assert_eq!(content.nb_hyperlinks, 0.0);
    assert_eq!(content.ratio_int_hyperlinks, 0.0);
}

#[test]
fn test_empty_title_flag() {
    assert_eq!(features_for("<html><body></body></html>").empty_title, 1.0);
    assert_eq!(
        features_for("<html><head><title>Hi</title></head></html>").empty_title,
        0.0
    );
}

#[test]
fn test_domain_in_title_polarity() {
    // Present in the title scores 0, absent scores 1
    assert_eq!(domain_in_title("example.com", "Welcome to Example.COM"), 0.0);
    assert_eq!(domain_in_title("example.com", "Sign in to your account"), 1.0);
    assert_eq!(domain_in_title("example.com", ""), 1.0);
}

#[test]
fn test_insert_into_feature_map() {
    let mut map = FeatureMap::new();
    ContentFeatures::UNREACHABLE.insert_into(&mut map);

    assert_eq!(map.len(), 4);
    assert_eq!(map[features::NB_HYPERLINKS], 1.0);
    assert_eq!(map[features::RATIO_INT_HYPERLINKS], 0.5);
    assert_eq!(map[features::EMPTY_TITLE], 0.0);
    assert_eq!(map[features::DOMAIN_IN_TITLE], 0.0);
}
