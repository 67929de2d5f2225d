use phishlens_scanner::FetchConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;
pub const MAX_BATCH_CONCURRENCY: usize = 10;
pub const MAX_BATCH_SIZE: usize = 100;

/// Settings fixed at start-up and shared read-only by every analysis.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub fetch: FetchConfig,
    pub batch_concurrency: usize,
    pub max_batch_size: usize,
    pub reputation_timeout: Duration,
    pub page_rank_key: Option<String>,
    /// Full public suffix list to load instead of the bundled one.
    pub suffix_list: Option<PathBuf>,
    pub lookups_enabled: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            max_batch_size: MAX_BATCH_SIZE,
            reputation_timeout: Duration::from_secs(10),
            page_rank_key: None,
            suffix_list: None,
            lookups_enabled: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.batch_concurrency = workers.clamp(1, MAX_BATCH_CONCURRENCY);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch.timeout = timeout;
        self
    }

    pub fn offline(mut self) -> Self {
        self.lookups_enabled = false;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.batch_concurrency.clamp(1, MAX_BATCH_CONCURRENCY)
    }
}
