// Structural classification of fetched markup: link bucketing per element
// kind, anchor safety and iframe visibility.

use crate::error::{Result, ScanError};
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Placeholder targets that point nowhere. Compared case-insensitively after
/// trimming.
pub const NULL_LIKE: &[&str] = &[
    "",
    "#",
    "#nothing",
    "#doesnotexist",
    "#null",
    "#void",
    "#whatever",
    "#content",
    "javascript::void(0)",
    "javascript::void(0);",
    "javascript::;",
    "javascript:void(0)",
    "javascript:void(0);",
    "javascript:;",
    "javascript",
    "about:blank",
];

static IMPORT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+(?:url\(\s*)?["']?([^"')\s;]+)"#).expect("valid @import pattern")
});

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([a-z0-9_\-:.]+)"#)
        .expect("valid meta charset pattern")
});

static HEADER_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([a-z0-9_\-:.]+)"#).expect("valid charset pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Anchor,
    Image,
    Audio,
    Embed,
    Iframe,
    Stylesheet,
    Script,
    FormAction,
    Favicon,
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [
        ElementKind::Anchor,
        ElementKind::Image,
        ElementKind::Audio,
        ElementKind::Embed,
        ElementKind::Iframe,
        ElementKind::Stylesheet,
        ElementKind::Script,
        ElementKind::FormAction,
        ElementKind::Favicon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Anchor => "anchor",
            ElementKind::Image => "image",
            ElementKind::Audio => "audio",
            ElementKind::Embed => "embed",
            ElementKind::Iframe => "iframe",
            ElementKind::Stylesheet => "stylesheet",
            ElementKind::Script => "script",
            ElementKind::FormAction => "form_action",
            ElementKind::Favicon => "favicon",
        }
    }
}

/// Element kinds read straight from one `tag[attr]` selector. Stylesheets and
/// favicons come from `<link rel>` and are handled separately.
const DIRECT_SOURCES: [(ElementKind, &str, &str); 7] = [
    (ElementKind::Anchor, "a", "href"),
    (ElementKind::Image, "img", "src"),
    (ElementKind::Audio, "audio", "src"),
    (ElementKind::Embed, "embed", "src"),
    (ElementKind::Iframe, "iframe", "src"),
    (ElementKind::Script, "script", "src"),
    (ElementKind::FormAction, "form", "action"),
];

/// Where a link-bearing attribute points, relative to the page's host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Same-site target, relative values rewritten onto the hostname.
    Internal(String),
    External,
    Null,
}

/// Categorize one href/src/action value against the page's hostname and
/// registrable domain.
pub fn categorize(value: &str, hostname: &str, domain: &str) -> LinkTarget {
    let absolute = value.starts_with("http");
    let is_internal = (!hostname.is_empty() && value.contains(hostname))
        || (!domain.is_empty() && value.contains(domain))
        || value.matches('.').count() == 1
        || !absolute;

    if !is_internal {
        return LinkTarget::External;
    }
    if absolute {
        return LinkTarget::Internal(value.to_string());
    }
    if is_null_like(value) {
        LinkTarget::Null
    } else if value.starts_with('/') {
        LinkTarget::Internal(format!("{}{}", hostname, value))
    } else {
        LinkTarget::Internal(format!("{}/{}", hostname, value))
    }
}

pub fn is_null_like(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    NULL_LIKE.contains(&normalized.as_str())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkBucket {
    pub internals: Vec<String>,
    pub externals: Vec<String>,
    pub nulls: Vec<String>,
}

impl LinkBucket {
    pub fn insert(&mut self, value: &str, target: LinkTarget) {
        match target {
            LinkTarget::Internal(resolved) => self.internals.push(resolved),
            LinkTarget::External => self.externals.push(value.to_string()),
            LinkTarget::Null => self.nulls.push(value.to_string()),
        }
    }

    /// Number of elements this bucket has seen.
    pub fn len(&self) -> usize {
        self.internals.len() + self.externals.len() + self.nulls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One `LinkBucket` per element kind; every kind is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkBuckets {
    buckets: BTreeMap<ElementKind, LinkBucket>,
}

impl Default for LinkBuckets {
    fn default() -> Self {
        Self {
            buckets: ElementKind::ALL
                .iter()
                .map(|kind| (*kind, LinkBucket::default()))
                .collect(),
        }
    }
}

impl LinkBuckets {
    pub fn get(&self, kind: ElementKind) -> &LinkBucket {
        &self.buckets[&kind]
    }

    fn get_mut(&mut self, kind: ElementKind) -> &mut LinkBucket {
        self.buckets.entry(kind).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementKind, &LinkBucket)> {
        self.buckets.iter()
    }

    pub fn total_internals(&self) -> usize {
        self.buckets.values().map(|b| b.internals.len()).sum()
    }

    pub fn total_externals(&self) -> usize {
        self.buckets.values().map(|b| b.externals.len()).sum()
    }

    pub fn total_nulls(&self) -> usize {
        self.buckets.values().map(|b| b.nulls.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnchorSafety {
    pub safe: Vec<String>,
    #[serde(rename = "unsafe")]
    pub unsafe_links: Vec<String>,
}

impl AnchorSafety {
    fn record(&mut self, value: &str, target: &LinkTarget) {
        let lowered = value.to_ascii_lowercase();
        let is_unsafe = !matches!(target, LinkTarget::External)
            && (value.contains('#')
                || lowered.contains("javascript:")
                || lowered.contains("mailto:"));

        if is_unsafe {
            self.unsafe_links.push(value.to_string());
        } else {
            self.safe.push(value.to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IframeVisibility {
    pub visible: Vec<String>,
    pub invisible: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    Declared(String),
    Utf8,
    Latin1,
}

/// Everything the structural pass learns about one page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructuralReport {
    pub links: LinkBuckets,
    pub anchors: AnchorSafety,
    pub iframes: IframeVisibility,
    /// Empty when the page has no title.
    pub title: String,
    pub text: String,
    pub paragraphs: Vec<String>,
    pub heads: Vec<String>,
    pub titles: Vec<String>,
    pub scripts: Vec<String>,
    /// `None` means every decoding attempt failed and the buckets are empty.
    pub decoded_as: Option<TextEncoding>,
}

impl StructuralReport {
    pub fn parse_failed(&self) -> bool {
        self.decoded_as.is_none()
    }
}

/// Attributes of one element, in source order.
#[derive(Debug, Clone, Default)]
pub struct MarkupElement {
    attrs: Vec<(String, String)>,
}

impl MarkupElement {
    pub fn new(attrs: Vec<(String, String)>) -> Self {
        Self { attrs }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Query capability the classifier needs from an HTML parser.
pub trait MarkupQuery {
    /// Every `tag` element carrying `attr`, in document order.
    fn elements_with(&self, tag: &str, attr: &str) -> Vec<MarkupElement>;

    /// Concatenated text of every `tag` element.
    fn texts(&self, tag: &str) -> Vec<String>;

    /// Outer markup of every `tag` element.
    fn outer_html(&self, tag: &str) -> Vec<String>;

    fn count(&self, tag: &str) -> usize;

    fn title(&self) -> Option<String>;

    fn text(&self) -> String;
}

pub struct ScraperDocument {
    html: Html,
}

impl ScraperDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    fn selector(query: &str) -> Option<Selector> {
        match Selector::parse(query) {
            Ok(selector) => Some(selector),
            Err(e) => {
                debug!("Invalid selector {}: {:?}", query, e);
                None
            }
        }
    }
}

impl MarkupQuery for ScraperDocument {
    fn elements_with(&self, tag: &str, attr: &str) -> Vec<MarkupElement> {
        let Some(selector) = Self::selector(&format!("{}[{}]", tag, attr)) else {
            return Vec::new();
        };

        self.html
            .select(&selector)
            .map(|element| {
                MarkupElement::new(
                    element
                        .value()
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                )
            })
            .collect()
    }

    fn texts(&self, tag: &str) -> Vec<String> {
        let Some(selector) = Self::selector(tag) else {
            return Vec::new();
        };
        self.html
            .select(&selector)
            .map(|element| element.text().collect::<String>())
            .collect()
    }

    fn outer_html(&self, tag: &str) -> Vec<String> {
        let Some(selector) = Self::selector(tag) else {
            return Vec::new();
        };
        self.html.select(&selector).map(|e| e.html()).collect()
    }

    fn count(&self, tag: &str) -> usize {
        Self::selector(tag)
            .map(|selector| self.html.select(&selector).count())
            .unwrap_or(0)
    }

    fn title(&self) -> Option<String> {
        self.texts("title").into_iter().next()
    }

    fn text(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// Decode `body` and classify it. Decoding tries the declared charset, then
/// strict UTF-8, then Latin-1; when all three are rejected the report comes
/// back with empty buckets and `decoded_as == None`.
pub fn classify(
    body: &[u8],
    content_type: Option<&str>,
    hostname: &str,
    domain: &str,
) -> StructuralReport {
    match decode_markup(body, content_type) {
        Ok((source, encoding)) => {
            debug!("Decoded {} bytes as {:?}", body.len(), encoding);
            let document = ScraperDocument::parse(&source);
            let mut report = classify_document(&document, hostname, domain);
            report.decoded_as = Some(encoding);
            report
        }
        Err(e) => {
            warn!("Markup for {} could not be decoded: {}", hostname, e);
            StructuralReport::default()
        }
    }
}

/// Classify an already-parsed document.
pub fn classify_document<D: MarkupQuery>(
    document: &D,
    hostname: &str,
    domain: &str,
) -> StructuralReport {
    let mut links = LinkBuckets::default();
    let mut anchors = AnchorSafety::default();

    for (kind, tag, attr) in DIRECT_SOURCES {
        for element in document.elements_with(tag, attr) {
            let Some(value) = element.attr(attr) else {
                continue;
            };
            let target = categorize(value, hostname, domain);
            if kind == ElementKind::Anchor {
                anchors.record(value, &target);
            }
            links.get_mut(kind).insert(value, target);
        }
    }

    for element in document.elements_with("link", "href") {
        let Some(href) = element.attr("href") else {
            continue;
        };
        let rel = element.attr("rel").unwrap_or_default().to_ascii_lowercase();
        let rel_values: Vec<&str> = rel.split_whitespace().collect();

        if rel_values.contains(&"stylesheet") {
            links
                .get_mut(ElementKind::Stylesheet)
                .insert(href, categorize(href, hostname, domain));
        }
        if rel_values.iter().any(|value| value.ends_with("icon")) {
            links
                .get_mut(ElementKind::Favicon)
                .insert(href, categorize(href, hostname, domain));
        }
    }

    for style in document.texts("style") {
        for import in imported_stylesheets(&style) {
            links
                .get_mut(ElementKind::Stylesheet)
                .insert(&import, categorize(&import, hostname, domain));
        }
    }

    let iframes = iframe_visibility(document);
    let titles = document.texts("title");

    StructuralReport {
        links,
        anchors,
        iframes,
        title: document.title().unwrap_or_default(),
        text: document.text(),
        paragraphs: document.outer_html("p"),
        heads: document.outer_html("head"),
        titles,
        scripts: document.texts("script"),
        decoded_as: None,
    }
}

/// Targets of `@import` rules inside one style block.
pub fn imported_stylesheets(style: &str) -> Vec<String> {
    IMPORT_URL
        .captures_iter(style)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn iframe_visibility<D: MarkupQuery>(document: &D) -> IframeVisibility {
    let mut visibility = IframeVisibility::default();

    for iframe in document.elements_with("iframe", "width") {
        let (Some(width), Some(height)) = (iframe.attr("width"), iframe.attr("height")) else {
            continue;
        };

        let frameborder = iframe.attr("frameborder");
        let border = iframe.attr("border");
        let style = iframe.attr("style");
        if frameborder.is_none() && border.is_none() && style.is_none() {
            continue;
        }

        let borderless = frameborder.is_some_and(|v| v.trim() == "0")
            || border.is_some_and(|v| v.trim() == "0")
            || style.is_some_and(style_hides_border);
        let label = iframe.attr("src").unwrap_or_default().to_string();

        if width.trim() == "0" && height.trim() == "0" && borderless {
            visibility.invisible.push(label);
        } else {
            visibility.visible.push(label);
        }
    }

    visibility
}

fn style_hides_border(style: &str) -> bool {
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact
        .split(';')
        .any(|rule| rule == "border:none" || rule == "border:0" || rule == "border:0px")
}

/// Decode a response body, returning the text and the encoding that worked.
pub fn decode_markup(body: &[u8], content_type: Option<&str>) -> Result<(String, TextEncoding)> {
    if let Some(encoding) = declared_encoding(body, content_type) {
        match encoding.decode_without_bom_handling_and_without_replacement(strip_bom(body)) {
            Some(text) if is_markup_text(&text) => {
                return Ok((
                    text.into_owned(),
                    TextEncoding::Declared(encoding.name().to_string()),
                ));
            }
            _ => debug!("Declared encoding {} rejected the body", encoding.name()),
        }
    }

    match std::str::from_utf8(strip_bom(body)) {
        Ok(text) if is_markup_text(text) => return Ok((text.to_string(), TextEncoding::Utf8)),
        _ => debug!("UTF-8 decoding rejected the body"),
    }

    let latin1: String = body.iter().map(|&b| b as char).collect();
    if is_markup_text(&latin1) {
        return Ok((latin1, TextEncoding::Latin1));
    }

    Err(ScanError::ParseError(
        "body is not text in any supported encoding".to_string(),
    ))
}

fn declared_encoding(body: &[u8], content_type: Option<&str>) -> Option<&'static Encoding> {
    if let Some(label) = content_type
        .and_then(|ct| HEADER_CHARSET.captures(ct))
        .and_then(|caps| caps.get(1))
        && let Some(encoding) = Encoding::for_label(label.as_str().as_bytes())
    {
        return Some(encoding);
    }

    let head: String = body.iter().take(2048).map(|&b| b as char).collect();
    if let Some(label) = META_CHARSET.captures(&head).and_then(|caps| caps.get(1))
        && let Some(encoding) = Encoding::for_label(label.as_str().as_bytes())
    {
        return Some(encoding);
    }

    Encoding::for_bom(body).map(|(encoding, _)| encoding)
}

fn strip_bom(body: &[u8]) -> &[u8] {
    match Encoding::for_bom(body) {
        Some((_, bom_length)) => &body[bom_length..],
        None => body,
    }
}

// NUL bytes mean a binary payload rather than markup.
fn is_markup_text(text: &str) -> bool {
    !text.contains('\0')
}
