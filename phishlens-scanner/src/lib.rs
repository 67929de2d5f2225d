pub mod error;
pub mod fetcher;
pub mod markup;
pub mod result;

pub use error::ScanError;
pub use fetcher::{FetchConfig, Fetcher, HeaderProfile, url_variants};
pub use markup::{
    AnchorSafety, ElementKind, IframeVisibility, LinkBucket, LinkBuckets, LinkTarget,
    MarkupElement, MarkupQuery, ScraperDocument, StructuralReport, TextEncoding, categorize,
    classify, classify_document,
};
pub use result::{FetchResult, Page};
