// Classifier seam and the persisted logistic-model bundle.

use crate::error::{AnalysisError, Result};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Scores an ordered feature vector. Implementations are immutable once built
/// and shared across concurrent analyses.
pub trait Classifier: Send + Sync {
    /// Feature names the vector must carry, in order.
    fn feature_names(&self) -> &[String];

    fn threshold(&self) -> f64 {
        0.5
    }

    /// Probability in [0, 1] that the input is phishing.
    fn predict_proba(&self, vector: &FeatureVector) -> Result<f64>;

    fn predict(&self, vector: &FeatureVector) -> Result<Prediction> {
        let probability = self.predict_proba(vector)?;
        Ok(Prediction::from_probability(probability, self.threshold()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Phishing,
    Legitimate,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Phishing => write!(f, "phishing"),
            Label::Legitimate => write!(f, "legitimate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    /// Probability of phishing.
    pub probability: f64,
    /// Probability of the predicted label.
    pub confidence: f64,
}

impl Prediction {
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let label = if probability > threshold {
            Label::Phishing
        } else {
            Label::Legitimate
        };
        let confidence = match label {
            Label::Phishing => probability,
            Label::Legitimate => 1.0 - probability,
        };
        Self {
            label,
            probability,
            confidence,
        }
    }

    pub fn is_phishing(&self) -> bool {
        self.label == Label::Phishing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, index: usize, value: f64) -> f64 {
        let scale = self.scale[index];
        let scale = if scale == 0.0 { 1.0 } else { scale };
        (value - self.mean[index]) / scale
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub training_samples: Option<u64>,
    #[serde(default)]
    pub test_samples: Option<u64>,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

fn default_threshold() -> f64 {
    0.5
}

/// A standardised logistic model persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model_type: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub info: ModelInfo,
    /// Common mail domains, used by email models.
    #[serde(default)]
    pub top_domains: Vec<String>,
}

impl ModelBundle {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::ClassifierUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let bundle = Self::from_json(&contents)?;
        info!(
            "Loaded {} model with {} features from {}",
            bundle.model_type,
            bundle.features.len(),
            path.display()
        );
        Ok(bundle)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let bundle: ModelBundle = serde_json::from_str(contents)
            .map_err(|e| AnalysisError::ClassifierUnavailable(format!("invalid model: {}", e)))?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Every per-feature array must match the feature count.
    pub fn validate(&self) -> Result<()> {
        let n = self.features.len();
        if n == 0 {
            return Err(AnalysisError::ClassifierUnavailable(
                "model declares no features".to_string(),
            ));
        }
        if self.coefficients.len() != n {
            return Err(AnalysisError::ClassifierUnavailable(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                n
            )));
        }
        if let Some(scaler) = &self.scaler
            && (scaler.mean.len() != n || scaler.scale.len() != n)
        {
            return Err(AnalysisError::ClassifierUnavailable(format!(
                "scaler has {} means and {} scales for {} features",
                scaler.mean.len(),
                scaler.scale.len(),
                n
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AnalysisError::ClassifierUnavailable(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    pub fn is_common_domain(&self, domain: &str) -> bool {
        self.top_domains.iter().any(|d| d.eq_ignore_ascii_case(domain))
    }
}

impl Classifier for ModelBundle {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn predict_proba(&self, vector: &FeatureVector) -> Result<f64> {
        if vector.names() != self.features.as_slice() {
            let missing = self
                .features
                .iter()
                .find(|name| vector.get(name).is_none())
                .cloned()
                .unwrap_or_else(|| "feature order".to_string());
            return Err(AnalysisError::SchemaMismatch(missing));
        }

        let z = vector
            .values()
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let scaled = match &self.scaler {
                    Some(scaler) => scaler.transform(i, value),
                    None => value,
                };
                scaled * self.coefficients[i]
            })
            .sum::<f64>()
            + self.intercept;

        Ok(sigmoid(z))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
