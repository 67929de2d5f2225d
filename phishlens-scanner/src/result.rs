use std::collections::HashMap;
use std::time::Duration;

/// A page that answered with an accepted status and a non-empty body.
#[derive(Debug, Clone)]
pub struct Page {
    pub final_url: String,
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
    pub response_time: Duration,
}

impl Page {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

/// Outcome of a resilient fetch. Never an error: every network failure is
/// folded into `Inaccessible`.
#[derive(Debug, Clone)]
pub enum FetchResult {
    Accessible(Page),
    Inaccessible,
}

impl FetchResult {
    pub fn is_accessible(&self) -> bool {
        matches!(self, FetchResult::Accessible(_))
    }

    pub fn page(&self) -> Option<&Page> {
        match self {
            FetchResult::Accessible(page) => Some(page),
            FetchResult::Inaccessible => None,
        }
    }

    pub fn into_page(self) -> Option<Page> {
        match self {
            FetchResult::Accessible(page) => Some(page),
            FetchResult::Inaccessible => None,
        }
    }
}
