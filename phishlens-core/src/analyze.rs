use crate::config::AnalyzerConfig;
use crate::content::ContentFeatures;
use crate::error::{AnalysisError, Result};
use crate::features::{self, FeatureMap, FeatureVector, FeatureVectorAssembler};
use crate::lexical::lexical_features;
use crate::model::{Classifier, Prediction};
use crate::reputation::{
    self, DisabledReputation, HttpReputation, NameserverLookup, ReputationLookup,
    ReputationSignals,
};
use crate::url::{CandidateUrl, DefaultScheme, UrlNormalizer};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use phishlens_scanner::{FetchResult, Fetcher, StructuralReport, classify};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Callback for reporting batch progress: (completed, total, url)
pub type BatchProgressCallback = Arc<dyn Fn(usize, usize, String) + Send + Sync>;

/// Page markup kept alongside the features.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedContent {
    pub body: Vec<String>,
    pub heads: Vec<String>,
    pub titles: Vec<String>,
    pub scripts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractedContent {
    fn from_report(report: &StructuralReport) -> Self {
        if report.parse_failed() {
            return Self::failed("Failed to parse HTML content");
        }
        Self {
            body: report.paragraphs.clone(),
            heads: report.heads.clone(),
            titles: report.titles.clone(),
            scripts: report.scripts.clone(),
            error: None,
        }
    }

    fn failed(reason: &str) -> Self {
        Self {
            error: Some(reason.to_string()),
            ..Default::default()
        }
    }
}

/// Result of scoring one URL.
#[derive(Debug, Clone, Serialize)]
pub struct UrlAnalysis {
    /// URL with its default scheme applied.
    pub url: String,
    pub candidate: CandidateUrl,
    pub accessible: bool,
    pub final_url: Option<String>,
    pub features: FeatureMap,
    pub vector: FeatureVector,
    pub content: ContentFeatures,
    pub extracted_content: ExtractedContent,
    pub reputation: ReputationSignals,
    pub prediction: Prediction,
    /// Non-fatal degradations met along the way.
    pub warnings: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    #[serde(skip)]
    pub structure: Option<StructuralReport>,
}

impl UrlAnalysis {
    pub fn nameservers(&self) -> &NameserverLookup {
        &self.reputation.nameservers
    }
}

/// One position of a batch, in input order.
#[derive(Debug, Clone)]
pub enum BatchEntry {
    Success(Box<UrlAnalysis>),
    Failure { url: String, error: String },
}

impl BatchEntry {
    pub fn url(&self) -> &str {
        match self {
            BatchEntry::Success(analysis) => &analysis.url,
            BatchEntry::Failure { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchEntry::Success(_))
    }
}

/// Runs the extraction pipeline and scores the result. Built once, then shared
/// read-only by every analysis.
pub struct Analyzer {
    config: AnalyzerConfig,
    normalizer: UrlNormalizer,
    fetcher: Fetcher,
    reputation: Arc<dyn ReputationLookup>,
    classifier: Arc<dyn Classifier>,
    assembler: FeatureVectorAssembler,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig, classifier: Arc<dyn Classifier>) -> Result<Self> {
        let normalizer = match &config.suffix_list {
            Some(path) => UrlNormalizer::from_list_file(path)?,
            None => UrlNormalizer::new()?,
        };
        let fetcher = Fetcher::with_config(config.fetch.clone())?;
        let reputation: Arc<dyn ReputationLookup> = if config.lookups_enabled {
            Arc::new(HttpReputation::new(&config)?)
        } else {
            Arc::new(DisabledReputation)
        };
        let assembler = FeatureVectorAssembler::new(classifier.feature_names());

        Ok(Self {
            config,
            normalizer,
            fetcher,
            reputation,
            classifier,
            assembler,
        })
    }

    pub fn with_reputation(mut self, reputation: Arc<dyn ReputationLookup>) -> Self {
        self.reputation = reputation;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Score one URL, defaulting to `scheme` when the input carries none.
    pub async fn analyze(&self, raw: &str, scheme: DefaultScheme) -> Result<UrlAnalysis> {
        let candidate = self.normalizer.normalize(raw, scheme)?;
        info!("Analyzing {}", candidate.url);

        let mut features = lexical_features(&candidate);
        let mut warnings = Vec::new();

        let (fetched, (signals, lookup_warnings)) = tokio::join!(
            self.fetcher.fetch(&candidate.url),
            reputation::gather(
                self.reputation.as_ref(),
                &candidate.domain,
                &candidate.url,
                &candidate.hostname,
            ),
        );
        warnings.extend(lookup_warnings);

        let (content, extracted_content, structure, final_url) = match fetched {
            FetchResult::Accessible(page) => {
                let report = classify(
                    &page.body,
                    page.content_type(),
                    &candidate.hostname,
                    &candidate.domain,
                );
                if report.parse_failed() {
                    let e = AnalysisError::ParseFailure(page.final_url.clone());
                    warn!("{}", e);
                    warnings.push(e.to_string());
                }
                debug!(
                    "{}: {} internal, {} external, {} null links",
                    candidate.hostname,
                    report.links.total_internals(),
                    report.links.total_externals(),
                    report.links.total_nulls()
                );
                (
                    ContentFeatures::from_report(&report, &candidate.domain),
                    ExtractedContent::from_report(&report),
                    Some(report),
                    Some(page.final_url),
                )
            }
            FetchResult::Inaccessible => {
                let e = AnalysisError::FetchInaccessible(candidate.url.clone());
                warn!("{}, using neutral content features", e);
                warnings.push(e.to_string());
                (
                    ContentFeatures::UNREACHABLE,
                    ExtractedContent::failed("URL not accessible"),
                    None,
                    None,
                )
            }
        };

        content.insert_into(&mut features);
        features.insert(features::DOMAIN_AGE.into(), signals.domain_age as f64);
        features.insert(features::GOOGLE_INDEX.into(), signals.google_index as f64);
        features.insert(features::PAGE_RANK.into(), signals.page_rank as f64);

        let vector = self.assembler.assemble(&features)?;
        let prediction = self.classifier.predict(&vector)?;
        info!(
            "{} scored {} (p={:.4})",
            candidate.url, prediction.label, prediction.probability
        );

        Ok(UrlAnalysis {
            url: candidate.url.clone(),
            accessible: final_url.is_some(),
            candidate,
            final_url,
            features,
            vector,
            content,
            extracted_content,
            reputation: signals,
            prediction,
            warnings,
            analyzed_at: Utc::now(),
            structure,
        })
    }

    /// Score a list of URLs with bounded concurrency. Entries come back in
    /// input order; a failing URL becomes a `Failure` entry without aborting
    /// the rest. Lists over the configured cap are rejected before any fetch.
    pub async fn analyze_batch(
        &self,
        urls: &[String],
        progress_callback: Option<BatchProgressCallback>,
    ) -> Result<Vec<BatchEntry>> {
        if urls.len() > self.config.max_batch_size {
            return Err(AnalysisError::BatchTooLarge(
                urls.len(),
                self.config.max_batch_size,
            ));
        }

        let total = urls.len();
        let completed = Arc::new(AtomicUsize::new(0));
        info!(
            "Starting batch of {} URLs with {} workers",
            total,
            self.config.concurrency()
        );

        let entries = stream::iter(urls.iter().cloned())
            .map(|url| {
                let completed = completed.clone();
                let progress_callback = progress_callback.clone();
                async move {
                    let entry = match self.analyze(&url, DefaultScheme::Http).await {
                        Ok(analysis) => BatchEntry::Success(Box::new(analysis)),
                        Err(e) => {
                            warn!("Batch entry {} failed: {}", url, e);
                            BatchEntry::Failure {
                                url: url.trim().to_string(),
                                error: e.to_string(),
                            }
                        }
                    };

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(callback) = &progress_callback {
                        callback(done, total, url);
                    }
                    entry
                }
            })
            .buffered(self.config.concurrency())
            .collect::<Vec<_>>()
            .await;

        Ok(entries)
    }
}
