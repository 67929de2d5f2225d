use phishlens_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Page inaccessible: {0}")]
    FetchInaccessible(String),

    #[error("Markup could not be parsed: {0}")]
    ParseFailure(String),

    #[error("Reputation lookup failed: {0}")]
    ReputationLookupFailure(String),

    #[error("Feature '{0}' declared by the model is missing from the assembled vector")]
    SchemaMismatch(String),

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Batch of {0} URLs exceeds the limit of {1}")]
    BatchTooLarge(usize, usize),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
