// Email address scoring.

use crate::error::{AnalysisError, Result};
use crate::features::{FeatureMap, FeatureVector, FeatureVectorAssembler};
use crate::model::{Classifier, Label, ModelBundle};
use crate::url::UrlNormalizer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("valid email pattern")
});

pub const LENGTH_USERNAME: &str = "length_username";
pub const LENGTH_DOMAIN: &str = "length_domain";
pub const NB_DIGITS_USERNAME: &str = "nb_digits_username";
pub const IS_LONG_SUBDOMAIN: &str = "is_long_subdomain";
pub const IS_COMMON_DOMAIN: &str = "is_common_domain";
pub const USERNAME_TO_DOMAIN_RATIO: &str = "username_to_domain_ratio";
pub const NB_DIGITS_DOMAIN: &str = "nb_digits_domain";

pub const EMAIL_FEATURES: [&str; 7] = [
    LENGTH_USERNAME,
    LENGTH_DOMAIN,
    NB_DIGITS_USERNAME,
    IS_LONG_SUBDOMAIN,
    IS_COMMON_DOMAIN,
    USERNAME_TO_DOMAIN_RATIO,
    NB_DIGITS_DOMAIN,
];

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address)
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailAnalysis {
    pub email: String,
    /// Registrable domain of the address, lowercased.
    pub domain: String,
    pub label: Label,
    pub probability: f64,
    /// Probability of the more likely label.
    pub confidence: f64,
    pub features: FeatureMap,
    pub vector: FeatureVector,
}

fn count_digits(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

/// Features of one address. Returns the feature map and the registrable domain.
pub fn email_features(
    address: &str,
    normalizer: &UrlNormalizer,
    top_domains: &[String],
) -> Result<(FeatureMap, String)> {
    if !is_valid_email(address) {
        return Err(AnalysisError::InvalidEmail(address.to_string()));
    }

    let (username, host) = address
        .split_once('@')
        .ok_or_else(|| AnalysisError::InvalidEmail(address.to_string()))?;
    let (domain, _, subdomain, _) = normalizer.split_host(host);
    let domain = domain.to_lowercase();

    let length_username = username.chars().count();
    let length_domain = domain.chars().count();
    let is_common = top_domains.iter().any(|d| d.eq_ignore_ascii_case(&domain));

    let mut map = FeatureMap::new();
    map.insert(LENGTH_USERNAME.into(), length_username as f64);
    map.insert(LENGTH_DOMAIN.into(), length_domain as f64);
    map.insert(NB_DIGITS_USERNAME.into(), count_digits(username) as f64);
    map.insert(
        IS_LONG_SUBDOMAIN.into(),
        if subdomain.chars().count() > 3 { 1.0 } else { 0.0 },
    );
    map.insert(IS_COMMON_DOMAIN.into(), if is_common { 1.0 } else { 0.0 });
    map.insert(
        USERNAME_TO_DOMAIN_RATIO.into(),
        length_username as f64 / (length_domain as f64 + 1.0),
    );
    map.insert(NB_DIGITS_DOMAIN.into(), count_digits(&domain) as f64);

    Ok((map, domain))
}

pub struct EmailAnalyzer {
    normalizer: UrlNormalizer,
    model: Arc<ModelBundle>,
    assembler: FeatureVectorAssembler,
}

impl EmailAnalyzer {
    pub fn new(normalizer: UrlNormalizer, model: Arc<ModelBundle>) -> Self {
        let assembler = FeatureVectorAssembler::new(model.feature_names());
        Self {
            normalizer,
            model,
            assembler,
        }
    }

    pub fn analyze(&self, address: &str) -> Result<EmailAnalysis> {
        let address = address.trim();
        let (features, domain) = email_features(address, &self.normalizer, &self.model.top_domains)?;
        let vector = self.assembler.assemble(&features)?;
        let prediction = self.model.predict(&vector)?;

        info!("{} scored {}", address, prediction.label);

        Ok(EmailAnalysis {
            email: address.to_string(),
            domain,
            label: prediction.label,
            probability: prediction.probability,
            confidence: prediction.probability.max(1.0 - prediction.probability),
            features,
            vector,
        })
    }
}
