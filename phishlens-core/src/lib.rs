pub mod analyze;
pub mod config;
pub mod content;
pub mod diagnose;
pub mod email;
pub mod error;
pub mod features;
pub mod lexical;
pub mod model;
pub mod report;
pub mod reputation;
pub mod url;

pub use analyze::{Analyzer, BatchEntry, UrlAnalysis};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, Result};
pub use model::{Classifier, ModelBundle, Prediction};
pub use url::{CandidateUrl, DefaultScheme, UrlNormalizer};
