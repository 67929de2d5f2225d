// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{expand_path, load_urls_from_file, parse_url_line, write_report};

pub use phishlens_core::analyze::{Analyzer, BatchEntry, UrlAnalysis};
