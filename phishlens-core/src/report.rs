// Report rendering for analyses, batches, diagnoses and model metadata

use crate::analyze::{BatchEntry, UrlAnalysis};
use crate::diagnose::Diagnosis;
use crate::email::EmailAnalysis;
use crate::features::{self, FeatureMap};
use crate::model::ModelBundle;
use crate::reputation::NameserverLookup;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const THIN_RULE: &str = "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Round to four decimal places for display.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}

fn section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

fn header(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(&format!("{:^80}\n", title));
    report.push_str(RULE);
    report.push('\n');
}

fn footer(report: &mut String) {
    report.push_str(RULE);
    report.push_str(&format!(
        "\nGenerated by Phishlens {} at {}\n\n",
        env!("CARGO_PKG_VERSION"),
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
}

fn format_nameservers(nameservers: &NameserverLookup) -> String {
    match nameservers {
        NameserverLookup::Found(names) if names.is_empty() => "(none)".to_string(),
        NameserverLookup::Found(names) => names.join(", "),
        NameserverLookup::Error(e) => e.clone(),
    }
}

fn metadata() -> serde_json::Value {
    serde_json::json!({
        "generator": "Phishlens",
        "version": env!("CARGO_PKG_VERSION"),
        "generated_at": chrono::Utc::now().to_rfc3339(),
    })
}

/// Headline features surfaced in URL reports.
fn key_features(features: &FeatureMap) -> serde_json::Value {
    let get = |name: &str| features.get(name).copied().unwrap_or(0.0);
    serde_json::json!({
        "length_url": get(features::LENGTH_URL) as i64,
        "ip_address": get(features::IP) != 0.0,
        "nb_dots": get(features::NB_DOTS) as i64,
        "phish_hints": get(features::PHISH_HINTS) as i64,
        "nb_hyperlinks": get(features::NB_HYPERLINKS) as i64,
        "empty_title": get(features::EMPTY_TITLE) != 0.0,
    })
}

pub fn generate_text_report(analysis: &UrlAnalysis) -> String {
    let mut report = String::new();
    header(&mut report, "PHISHLENS URL REPORT");

    let prediction = &analysis.prediction;
    report.push_str(&format!("URL:          {}\n", analysis.url));
    report.push_str(&format!("Domain:       {}\n", analysis.candidate.domain));
    report.push_str(&format!(
        "Prediction:   {}\n",
        prediction.label.to_string().to_uppercase()
    ));
    report.push_str(&format!("Confidence:   {:.4}\n", prediction.confidence));
    report.push_str(&format!("P(phishing):  {:.4}\n", prediction.probability));
    report.push_str(&format!(
        "Accessible:   {}\n",
        match &analysis.final_url {
            Some(final_url) => format!("yes ({})", final_url),
            None => "no".to_string(),
        }
    ));
    report.push_str(&format!(
        "Nameservers:  {}\n",
        format_nameservers(analysis.nameservers())
    ));
    report.push_str(&format!(
        "Analyzed:     {}\n\n",
        analysis.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    section(&mut report, "FEATURES");
    for (name, value) in analysis.vector.iter() {
        report.push_str(&format!("  {:<22} {}\n", name, value));
    }
    report.push('\n');

    if let Some(structure) = &analysis.structure {
        section(&mut report, "PAGE STRUCTURE");
        report.push_str(&format!("Title:        {}\n", structure.title));
        report.push_str(&format!(
            "{:<14}{:>10}{:>10}{:>10}\n",
            "Element", "Internal", "External", "Null"
        ));
        for (kind, bucket) in structure.links.iter() {
            if bucket.is_empty() {
                continue;
            }
            report.push_str(&format!(
                "{:<14}{:>10}{:>10}{:>10}\n",
                kind.as_str(),
                bucket.internals.len(),
                bucket.externals.len(),
                bucket.nulls.len()
            ));
        }
        report.push_str(&format!(
            "Anchors:      {} safe, {} unsafe\n",
            structure.anchors.safe.len(),
            structure.anchors.unsafe_links.len()
        ));
        report.push_str(&format!(
            "Iframes:      {} visible, {} invisible\n\n",
            structure.iframes.visible.len(),
            structure.iframes.invisible.len()
        ));
    }

    if !analysis.warnings.is_empty() {
        section(&mut report, "WARNINGS");
        for warning in &analysis.warnings {
            report.push_str(&format!("  - {}\n", warning));
        }
        report.push('\n');
    }

    footer(&mut report);
    report
}

pub fn generate_json_report(analysis: &UrlAnalysis) -> Result<String, serde_json::Error> {
    let prediction = &analysis.prediction;
    let json_report = serde_json::json!({
        "metadata": metadata(),
        "url": analysis.url,
        "prediction": prediction.label,
        "confidence": round4(prediction.confidence),
        "phishing_probability": round4(prediction.probability),
        "domain": analysis.candidate.domain,
        "nameservers": analysis.nameservers(),
        "accessible": analysis.accessible,
        "final_url": analysis.final_url,
        "timestamp": analysis.analyzed_at.to_rfc3339(),
        "features": key_features(&analysis.features),
        "feature_vector": analysis.features,
        "reputation": {
            "domain_age": analysis.reputation.domain_age,
            "google_index": analysis.reputation.google_index,
            "page_rank": analysis.reputation.page_rank,
        },
        "extracted_content": analysis.extracted_content,
        "warnings": analysis.warnings,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_batch_text_report(entries: &[BatchEntry]) -> String {
    let mut report = String::new();
    header(&mut report, "PHISHLENS BATCH REPORT");

    let phishing = entries
        .iter()
        .filter(|e| matches!(e, BatchEntry::Success(a) if a.prediction.is_phishing()))
        .count();
    let failed = entries.iter().filter(|e| !e.is_success()).count();

    report.push_str(&format!("Total URLs:   {}\n", entries.len()));
    report.push_str(&format!("Phishing:     {}\n", phishing));
    report.push_str(&format!(
        "Legitimate:   {}\n",
        entries.len() - phishing - failed
    ));
    report.push_str(&format!("Errors:       {}\n\n", failed));

    section(&mut report, "RESULTS");
    for (idx, entry) in entries.iter().enumerate() {
        match entry {
            BatchEntry::Success(analysis) => {
                let prediction = &analysis.prediction;
                report.push_str(&format!("[{}] {}\n", idx + 1, analysis.url));
                report.push_str(&format!(
                    "    {} (confidence {:.4}, p={:.4})\n",
                    prediction.label.to_string().to_uppercase(),
                    prediction.confidence,
                    prediction.probability
                ));
                report.push_str(&format!(
                    "    Nameservers: {}\n",
                    format_nameservers(analysis.nameservers())
                ));
            }
            BatchEntry::Failure { url, error } => {
                report.push_str(&format!("[{}] {}\n", idx + 1, url));
                report.push_str(&format!("    ERROR: {}\n", error));
            }
        }
        report.push_str(THIN_RULE);
    }
    report.push('\n');

    footer(&mut report);
    report
}

pub fn generate_batch_json_report(entries: &[BatchEntry]) -> Result<String, serde_json::Error> {
    let results: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| match entry {
            BatchEntry::Success(analysis) => serde_json::json!({
                "url": analysis.url,
                "prediction": analysis.prediction.label,
                "nameservers": analysis.nameservers(),
                "confidence": round4(analysis.prediction.confidence),
                "phishing_probability": round4(analysis.prediction.probability),
                "status": "success",
            }),
            BatchEntry::Failure { url, error } => serde_json::json!({
                "url": url,
                "error": error,
                "status": "error",
            }),
        })
        .collect();

    let json_report = serde_json::json!({
        "metadata": metadata(),
        "results": results,
        "total_urls": entries.len(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_email_text_report(analysis: &EmailAnalysis) -> String {
    let mut report = String::new();
    header(&mut report, "PHISHLENS EMAIL REPORT");

    report.push_str(&format!("Email:        {}\n", analysis.email));
    report.push_str(&format!("Domain:       {}\n", analysis.domain));
    report.push_str(&format!(
        "Prediction:   {}\n",
        analysis.label.to_string().to_uppercase()
    ));
    report.push_str(&format!("Confidence:   {:.3}\n\n", analysis.confidence));

    section(&mut report, "FEATURES");
    for (name, value) in analysis.vector.iter() {
        report.push_str(&format!("  {:<26} {}\n", name, value));
    }
    report.push('\n');

    footer(&mut report);
    report
}

pub fn generate_email_json_report(analysis: &EmailAnalysis) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "metadata": metadata(),
        "email": analysis.email,
        "prediction": analysis.label,
        "confidence": round3(analysis.confidence),
        "features": analysis.features,
        "domain": analysis.domain,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_diagnosis_text_report(diagnosis: &Diagnosis) -> String {
    let mut report = String::new();
    header(&mut report, "PHISHLENS FETCH DIAGNOSIS");

    report.push_str(&format!("Original URL:   {}\n", diagnosis.original_url));
    report.push_str(&format!("Processed URL:  {}\n", diagnosis.processed_url));
    report.push_str(&format!("Accessible:     {}\n", diagnosis.accessible));
    if let Some(final_url) = &diagnosis.final_url {
        report.push_str(&format!("Final URL:      {}\n", final_url));
    }
    if let Some(status) = diagnosis.status_code {
        report.push_str(&format!("Status:         {}\n", status));
    }
    if let Some(status) = diagnosis.probe_status {
        report.push_str(&format!("HEAD status:    {}\n", status));
    }
    report.push_str(&format!("Content length: {}\n", diagnosis.content_length));
    if let Some(content_type) = &diagnosis.content_type {
        report.push_str(&format!("Content type:   {}\n", content_type));
    }
    report.push_str(&format!("Parsed:         {}\n\n", diagnosis.parsing_success));

    if !diagnosis.extracted_elements.is_empty() {
        section(&mut report, "ELEMENTS");
        for (label, count) in &diagnosis.extracted_elements {
            report.push_str(&format!("  {:<10} {}\n", label, count));
        }
        report.push('\n');
    }

    if !diagnosis.response_headers.is_empty() {
        section(&mut report, "RESPONSE HEADERS");
        let mut headers: Vec<_> = diagnosis.response_headers.iter().collect();
        headers.sort();
        for (name, value) in headers {
            report.push_str(&format!("  {}: {}\n", name, value));
        }
        report.push('\n');
    }

    if !diagnosis.errors.is_empty() {
        section(&mut report, "ISSUES");
        for error in &diagnosis.errors {
            report.push_str(&format!("  - {}\n", error));
        }
        report.push('\n');
    }

    footer(&mut report);
    report
}

pub fn generate_diagnosis_json_report(diagnosis: &Diagnosis) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "metadata": metadata(),
        "debug_info": diagnosis,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_model_info_text_report(model: &ModelBundle) -> String {
    let mut report = String::new();
    header(&mut report, "PHISHLENS MODEL");

    report.push_str(&format!("Model type:     {}\n", model.model_type));
    report.push_str(&format!("Feature count:  {}\n", model.features.len()));
    report.push_str(&format!("Threshold:      {}\n", model.threshold));
    if let Some(accuracy) = model.info.accuracy {
        report.push_str(&format!("Accuracy:       {:.4}\n", accuracy));
    }
    if let Some(samples) = model.info.training_samples {
        report.push_str(&format!("Training rows:  {}\n", samples));
    }
    if let Some(samples) = model.info.test_samples {
        report.push_str(&format!("Test rows:      {}\n", samples));
    }
    report.push('\n');

    section(&mut report, "FEATURES");
    for (idx, name) in model.features.iter().enumerate() {
        report.push_str(&format!("  {:>2}. {}\n", idx + 1, name));
    }
    report.push('\n');

    if !model.info.parameters.is_null() {
        section(&mut report, "PARAMETERS");
        report.push_str(
            &serde_json::to_string_pretty(&model.info.parameters).unwrap_or_default(),
        );
        report.push_str("\n\n");
    }

    footer(&mut report);
    report
}

pub fn generate_model_info_json_report(model: &ModelBundle) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "model_type": model.model_type,
        "feature_count": model.features.len(),
        "features": model.features,
        "threshold": model.threshold,
        "accuracy": model.info.accuracy.unwrap_or(0.0),
        "training_samples": model.info.training_samples.unwrap_or(0),
        "test_samples": model.info.test_samples.unwrap_or(0),
        "model_parameters": model.info.parameters,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
