//! HTML signal extraction
//!
//! This module pulls the SEO-relevant signals out of a page:
//! - Title, meta description, every `<h1>` in order
//! - Canonical link and `noindex` directives
//! - Visible word count (script, style, nav and footer regions excluded)
//! - Image and missing-alt counts
//! - Internal and external links, normalized and deduplicated
//!
//! Parsing uses html5ever's error-recovering tree builder, so malformed
//! markup yields partial fields rather than an error.

use crate::url::{resolve_and_normalize, same_site};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text does not count as page content
const NON_CONTENT_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "nav", "footer",
];

/// Signals extracted from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1s: Vec<String>,
    pub canonical: Option<String>,
    pub noindex: bool,
    pub word_count: usize,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub images_total: usize,
    pub images_missing_alt: usize,
}

/// Parses HTML content and extracts page signals
///
/// # Link Extraction Rules
///
/// **Include:** `<a href>` resolved against `<base href>` (or `base_url`)
///
/// **Exclude:**
/// - `<a download>` anchors
/// - `javascript:`, `mailto:`, `tel:`, `data:` links
/// - Fragment-only links
/// - Anything that is not http(s) after resolution
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the page was fetched from
/// * `root_host` - Hostname of the crawl root, for internal/external split
///
/// # Example
///
/// ```
/// use site_audit::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base_url, "example.com");
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.internal_links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_page(html: &str, base_url: &Url, root_host: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let link_base = effective_base(&document, base_url);
    let (internal_links, external_links) = extract_links(&document, &link_base, root_host);
    let (images_total, images_missing_alt) = count_images(&document);

    ParsedPage {
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        h1s: extract_h1s(&document),
        canonical: extract_canonical(&document, &link_base),
        noindex: has_noindex_meta(&document),
        word_count: count_words(&document),
        internal_links,
        external_links,
        images_total,
        images_missing_alt,
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves `<base href>` if present
fn effective_base(document: &Html, base_url: &Url) -> Url {
    selector("base[href]")
        .and_then(|s| {
            document
                .select(&s)
                .next()
                .and_then(|e| e.value().attr("href"))
                .and_then(|href| base_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| base_url.clone())
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = selector("title")?;
    document
        .select(&title_selector)
        .next()
        .map(|element| element_text(&element))
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let meta_selector = selector("meta[name]")?;
    document
        .select(&meta_selector)
        .find(|e| {
            e.value()
                .attr("name")
                .map(|n| n.trim().eq_ignore_ascii_case("description"))
                .unwrap_or(false)
        })
        .map(|e| e.value().attr("content").unwrap_or("").trim().to_string())
}

fn extract_h1s(document: &Html) -> Vec<String> {
    match selector("h1") {
        Some(h1_selector) => document
            .select(&h1_selector)
            .map(|e| element_text(&e))
            .collect(),
        None => Vec::new(),
    }
}

fn extract_canonical(document: &Html, base: &Url) -> Option<String> {
    let link_selector = selector("link[rel][href]")?;
    let element = document.select(&link_selector).find(|e| {
        e.value()
            .attr("rel")
            .map(|rel| {
                rel.split_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("canonical"))
            })
            .unwrap_or(false)
    })?;

    let href = element.value().attr("href")?.trim();
    match base.join(href) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Some(href.to_string()),
    }
}

/// `noindex` or `none` in a robots or googlebot meta tag
fn has_noindex_meta(document: &Html) -> bool {
    let Some(meta_selector) = selector("meta[name][content]") else {
        return false;
    };

    document.select(&meta_selector).any(|e| {
        let name = e.value().attr("name").unwrap_or("").trim().to_lowercase();
        if name != "robots" && name != "googlebot" {
            return false;
        }
        e.value()
            .attr("content")
            .unwrap_or("")
            .split(',')
            .map(|d| d.trim().to_lowercase())
            .any(|d| d == "noindex" || d == "none")
    })
}

fn count_words(document: &Html) -> usize {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|e| NON_CONTENT_ELEMENTS.contains(&e.name()))
                    .unwrap_or(false)
            })
        })
        .map(|(_, text)| text.split_whitespace().count())
        .sum()
}

/// Returns (total images, images without an `alt` attribute)
fn count_images(document: &Html) -> (usize, usize) {
    let Some(img_selector) = selector("img") else {
        return (0, 0);
    };

    let mut total = 0;
    let mut missing_alt = 0;
    for img in document.select(&img_selector) {
        total += 1;
        if img.value().attr("alt").is_none() {
            missing_alt += 1;
        }
    }
    (total, missing_alt)
}

fn extract_links(document: &Html, base: &Url, root_host: &str) -> (Vec<String>, Vec<String>) {
    let mut internal = Vec::new();
    let mut external = Vec::new();
    let mut seen = HashSet::new();

    let Some(a_selector) = selector("a[href]") else {
        return (internal, external);
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if is_excluded_href(href) {
            continue;
        }

        let Some(resolved) = resolve_and_normalize(base, href) else {
            continue;
        };

        let is_internal = resolved
            .host_str()
            .map(|h| same_site(h, root_host))
            .unwrap_or(false);
        let resolved = resolved.to_string();
        if !seen.insert(resolved.clone()) {
            continue;
        }

        if is_internal {
            internal.push(resolved);
        } else {
            external.push(resolved);
        }
    }

    (internal, external)
}

fn is_excluded_href(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return true;
    }

    let lower = href.to_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
