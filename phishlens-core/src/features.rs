// Feature names and assembly of the ordered vector a classifier consumes.

use crate::error::{AnalysisError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Named feature values before ordering.
pub type FeatureMap = BTreeMap<String, f64>;

pub const LENGTH_URL: &str = "length_url";
pub const LENGTH_HOSTNAME: &str = "length_hostname";
pub const IP: &str = "ip";
pub const NB_DOTS: &str = "nb_dots";
pub const NB_QM: &str = "nb_qm";
pub const NB_EQ: &str = "nb_eq";
pub const NB_SLASH: &str = "nb_slash";
pub const NB_WWW: &str = "nb_www";
pub const RATIO_DIGITS_URL: &str = "ratio_digits_url";
pub const RATIO_DIGITS_HOST: &str = "ratio_digits_host";
pub const TLD_IN_SUBDOMAIN: &str = "tld_in_subdomain";
pub const PREFIX_SUFFIX: &str = "prefix_suffix";
pub const SHORTEST_WORD_HOST: &str = "shortest_word_host";
pub const LONGEST_WORDS_RAW: &str = "longest_words_raw";
pub const LONGEST_WORD_PATH: &str = "longest_word_path";
pub const PHISH_HINTS: &str = "phish_hints";
pub const NB_HYPERLINKS: &str = "nb_hyperlinks";
pub const RATIO_INT_HYPERLINKS: &str = "ratio_intHyperlinks";
pub const EMPTY_TITLE: &str = "empty_title";
pub const DOMAIN_IN_TITLE: &str = "domain_in_title";
pub const DOMAIN_AGE: &str = "domain_age";
pub const GOOGLE_INDEX: &str = "google_index";
pub const PAGE_RANK: &str = "page_rank";

/// Every URL feature the extractor produces, in canonical order.
pub const URL_FEATURES: [&str; 23] = [
    LENGTH_URL,
    LENGTH_HOSTNAME,
    IP,
    NB_DOTS,
    NB_QM,
    NB_EQ,
    NB_SLASH,
    NB_WWW,
    RATIO_DIGITS_URL,
    RATIO_DIGITS_HOST,
    TLD_IN_SUBDOMAIN,
    PREFIX_SUFFIX,
    SHORTEST_WORD_HOST,
    LONGEST_WORDS_RAW,
    LONGEST_WORD_PATH,
    PHISH_HINTS,
    NB_HYPERLINKS,
    RATIO_INT_HYPERLINKS,
    EMPTY_TITLE,
    DOMAIN_IN_TITLE,
    DOMAIN_AGE,
    GOOGLE_INDEX,
    PAGE_RANK,
];

/// Values in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Orders feature maps by a classifier's declared schema.
#[derive(Debug, Clone)]
pub struct FeatureVectorAssembler {
    schema: Vec<String>,
}

impl FeatureVectorAssembler {
    pub fn new<S: AsRef<str>>(schema: &[S]) -> Self {
        Self {
            schema: schema.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Select the schema's features from `features` in schema order. Extra
    /// entries are ignored; a missing one is a `SchemaMismatch`.
    pub fn assemble(&self, features: &FeatureMap) -> Result<FeatureVector> {
        let values = self
            .schema
            .iter()
            .map(|name| {
                features
                    .get(name)
                    .copied()
                    .ok_or_else(|| AnalysisError::SchemaMismatch(name.clone()))
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(FeatureVector {
            names: self.schema.clone(),
            values,
        })
    }
}
