//! Robots.txt and sitemap resolution
//!
//! Runs once before the crawl: fetches robots.txt (absence is not an error),
//! collects the disallow rules that apply to us, then walks the sitemap
//! candidates until one yields on-site URLs to seed the frontier.

mod parser;
mod sitemap;

pub use parser::ParsedRobots;
pub use sitemap::{parse_sitemap, SitemapDocument};

use crate::crawler::fetch_text;
use crate::url::{normalize_url, same_site};
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

/// Upper bound on sitemap URLs taken into the frontier
pub const MAX_SITEMAP_URLS: usize = 500;

/// Child sitemaps followed from a sitemap index
const MAX_CHILD_SITEMAPS: usize = 5;

/// What the resolver learned about a site before crawling it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteResolution {
    pub robots_txt_found: bool,
    /// Parsed robots.txt; allows everything when the file is absent
    pub robots: ParsedRobots,
    pub sitemap_found: bool,
    /// Normalized, on-site page URLs from the first productive sitemap
    pub sitemap_urls: Vec<String>,
}

/// Resolves robots.txt and sitemap data for the site rooted at `root`
///
/// # Sitemap Candidates
///
/// Tried in order, stopping at the first that yields at least one `<loc>`
/// on the crawl hostname:
/// 1. `Sitemap:` directives from robots.txt
/// 2. `/sitemap.xml`
/// 3. `/sitemap_index.xml`
///
/// No fetch is started once `deadline` has passed.
pub async fn resolve_site(
    client: &Client,
    root: &Url,
    user_agent: &str,
    timeout: Duration,
    deadline: Instant,
) -> SiteResolution {
    let mut resolution = SiteResolution::default();
    let host = root.host_str().unwrap_or_default().to_lowercase();

    if let Ok(robots_url) = root.join("/robots.txt") {
        match fetch_text(client, robots_url.as_str(), timeout).await {
            Some(body) if !looks_like_html(&body) => {
                let robots = ParsedRobots::parse(&body, user_agent);
                resolution.robots_txt_found = true;
                tracing::info!(
                    "robots.txt found: {} disallow rule(s), {} sitemap directive(s)",
                    robots.disallow_rules.len(),
                    robots.sitemaps.len()
                );
                resolution.robots = robots;
            }
            Some(_) => tracing::info!("robots.txt returned an HTML page, treating as absent"),
            None => tracing::info!("No robots.txt at {}", robots_url),
        }
    }

    let mut candidates: Vec<String> = resolution.robots.sitemaps.clone();
    for fallback in ["/sitemap.xml", "/sitemap_index.xml"] {
        if let Ok(url) = root.join(fallback) {
            let url = url.to_string();
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    }

    for candidate in candidates {
        if Instant::now() >= deadline {
            tracing::warn!("Time budget exhausted during sitemap discovery");
            break;
        }

        let urls = collect_sitemap_urls(client, &candidate, &host, timeout, deadline).await;
        if !urls.is_empty() {
            tracing::info!("Sitemap {} yielded {} URL(s)", candidate, urls.len());
            resolution.sitemap_found = true;
            resolution.sitemap_urls = urls;
            break;
        }
        tracing::debug!("Sitemap candidate {} yielded nothing usable", candidate);
    }

    resolution
}

async fn collect_sitemap_urls(
    client: &Client,
    sitemap_url: &str,
    host: &str,
    timeout: Duration,
    deadline: Instant,
) -> Vec<String> {
    let Some(body) = fetch_text(client, sitemap_url, timeout).await else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    match parse_sitemap(&body) {
        SitemapDocument::UrlSet(locs) => push_on_site(&mut urls, &locs, host),
        SitemapDocument::Index(children) => {
            let children = children
                .iter()
                .filter(|c| on_site(c, host))
                .take(MAX_CHILD_SITEMAPS);
            for child in children {
                if urls.len() >= MAX_SITEMAP_URLS || Instant::now() >= deadline {
                    break;
                }
                if let Some(child_body) = fetch_text(client, child, timeout).await {
                    if let SitemapDocument::UrlSet(locs) = parse_sitemap(&child_body) {
                        push_on_site(&mut urls, &locs, host);
                    }
                }
            }
        }
    }

    urls
}

/// Appends normalized on-site locations, deduplicated and capped
fn push_on_site(urls: &mut Vec<String>, locs: &[String], host: &str) {
    for loc in locs {
        if urls.len() >= MAX_SITEMAP_URLS {
            break;
        }
        let Ok(normalized) = normalize_url(loc) else {
            continue;
        };
        let on_host = normalized
            .host_str()
            .map(|h| same_site(h, host))
            .unwrap_or(false);
        let normalized = normalized.to_string();
        if on_host && !urls.contains(&normalized) {
            urls.push(normalized);
        }
    }
}

fn on_site(url: &str, host: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| same_site(h, host)))
        .unwrap_or(false)
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(64).collect::<String>().to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_on_site_filters_and_dedups() {
        let locs = vec![
            "https://example.com/".to_string(),
            "https://example.com/about/".to_string(),
            "https://example.com/about".to_string(),
            "https://other.com/page".to_string(),
            "not a url".to_string(),
        ];
        let mut urls = Vec::new();
        push_on_site(&mut urls, &locs, "example.com");
        assert_eq!(
            urls,
            vec!["https://example.com/", "https://example.com/about"]
        );
    }

    #[test]
    fn test_push_on_site_caps_at_limit() {
        let locs: Vec<String> = (0..MAX_SITEMAP_URLS + 100)
            .map(|i| format!("https://example.com/p{}", i))
            .collect();
        let mut urls = Vec::new();
        push_on_site(&mut urls, &locs, "example.com");
        assert_eq!(urls.len(), MAX_SITEMAP_URLS);
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("  <!DOCTYPE html><html></html>"));
        assert!(looks_like_html("<html lang=\"en\">"));
        assert!(!looks_like_html("User-agent: *\nDisallow:"));
    }
}
