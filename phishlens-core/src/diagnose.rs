// Fetch diagnostics for a single URL.

use phishlens_scanner::markup::decode_markup;
use phishlens_scanner::{FetchResult, Fetcher, MarkupQuery, ScraperDocument};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const SHORT_CONTENT_BYTES: usize = 100;

/// Tags counted in a diagnosis, with the label each is reported under.
const COUNTED_TAGS: [(&str, &str); 6] = [
    ("p", "body"),
    ("head", "heads"),
    ("title", "titles"),
    ("script", "scripts"),
    ("a", "links"),
    ("img", "images"),
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnosis {
    pub original_url: String,
    pub processed_url: String,
    pub accessible: bool,
    pub final_url: Option<String>,
    pub status_code: Option<u16>,
    pub content_length: usize,
    pub content_type: Option<String>,
    pub response_headers: HashMap<String, String>,
    pub parsing_success: bool,
    pub extracted_elements: BTreeMap<String, usize>,
    /// Status of the HEAD probe sent when the page was inaccessible.
    pub probe_status: Option<u16>,
    pub errors: Vec<String>,
}

impl Diagnosis {
    pub fn element_count(&self, label: &str) -> usize {
        self.extracted_elements.get(label).copied().unwrap_or(0)
    }
}

/// Fetch `url` and report what the extractor would see. `url` is expected to
/// already carry its scheme; `original` is the input as given.
pub async fn diagnose(fetcher: &Fetcher, original: &str, url: &str) -> Diagnosis {
    let mut diagnosis = Diagnosis {
        original_url: original.to_string(),
        processed_url: url.to_string(),
        ..Default::default()
    };

    let page = match fetcher.fetch(url).await {
        FetchResult::Accessible(page) => page,
        FetchResult::Inaccessible => {
            match fetcher.probe(url).await {
                Ok(status) => {
                    diagnosis.probe_status = Some(status);
                    diagnosis
                        .errors
                        .push(format!("URL not accessible - Status: {}", status));
                }
                Err(e) => diagnosis
                    .errors
                    .push(format!("URL not accessible - Error: {}", e)),
            }
            return diagnosis;
        }
    };

    diagnosis.accessible = true;
    diagnosis.final_url = Some(page.final_url.clone());
    diagnosis.status_code = Some(page.status_code);
    diagnosis.content_length = page.content_length();
    diagnosis.content_type = Some(page.content_type().unwrap_or("unknown").to_string());
    diagnosis.response_headers = page.headers.clone();

    match decode_markup(&page.body, page.content_type()) {
        Ok((source, encoding)) => {
            debug!("Diagnosis decoded {} as {:?}", url, encoding);
            let document = ScraperDocument::parse(&source);
            diagnosis.parsing_success = true;
            for (tag, label) in COUNTED_TAGS {
                diagnosis
                    .extracted_elements
                    .insert(label.to_string(), document.count(tag));
            }

            if diagnosis.element_count("titles") == 0 {
                diagnosis.errors.push("No title tags found".to_string());
            }
            if diagnosis.element_count("body") == 0 {
                diagnosis.errors.push("No body tags found".to_string());
            }
        }
        Err(e) => diagnosis.errors.push(format!("Parsing error: {}", e)),
    }

    if diagnosis.content_length < SHORT_CONTENT_BYTES {
        diagnosis.errors.push("Content seems too short".to_string());
    }

    diagnosis
}
