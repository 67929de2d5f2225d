// Content features derived from a page's structural report.

use crate::features::{self, FeatureMap};
use phishlens_scanner::StructuralReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContentFeatures {
    pub nb_hyperlinks: f64,
    pub ratio_int_hyperlinks: f64,
    pub empty_title: f64,
    /// 0 when the domain appears in the title, 1 otherwise.
    pub domain_in_title: f64,
}

impl ContentFeatures {
    /// Neutral values used when the page could not be fetched.
    pub const UNREACHABLE: ContentFeatures = ContentFeatures {
        nb_hyperlinks: 1.0,
        ratio_int_hyperlinks: 0.5,
        empty_title: 0.0,
        domain_in_title: 0.0,
    };

    pub fn from_report(report: &StructuralReport, domain: &str) -> Self {
        let internals = report.links.total_internals();
        let total = internals + report.links.total_externals();
        let ratio = if total == 0 {
            0.0
        } else {
            internals as f64 / total as f64
        };

        Self {
            nb_hyperlinks: total as f64,
            ratio_int_hyperlinks: ratio,
            empty_title: if report.title.is_empty() { 1.0 } else { 0.0 },
            domain_in_title: domain_in_title(domain, &report.title),
        }
    }

    pub fn insert_into(&self, map: &mut FeatureMap) {
        map.insert(features::NB_HYPERLINKS.into(), self.nb_hyperlinks);
        map.insert(features::RATIO_INT_HYPERLINKS.into(), self.ratio_int_hyperlinks);
        map.insert(features::EMPTY_TITLE.into(), self.empty_title);
        map.insert(features::DOMAIN_IN_TITLE.into(), self.domain_in_title);
    }
}

pub fn domain_in_title(domain: &str, title: &str) -> f64 {
    if title.to_lowercase().contains(&domain.to_lowercase()) {
        0.0
    } else {
        1.0
    }
}
