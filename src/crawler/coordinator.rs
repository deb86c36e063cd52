//! Crawl orchestrator - main crawl loop
//!
//! One crawl is one task. Pages are fetched in batches of at most
//! `concurrency` URLs; a batch settles completely before the next one is
//! dispatched, and a politeness delay separates batches. The loop stops at
//! the first of: page limit reached, frontier exhausted, time budget spent.

use crate::config::{validate_crawl_config, CrawlConfig, UserAgentConfig};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchOutcome};
use crate::crawler::frontier::Frontier;
use crate::crawler::page::{CrawlResult, CrawlStats, CrawledPage, StopReason};
use crate::crawler::parser::parse_page;
use crate::robots::resolve_site;
use crate::url::{extract_host, is_internal, normalize_url, on_root_host, resolve_and_normalize};
use crate::AuditError;
use futures::future::join_all;
use reqwest::Client;
use std::time::Instant;
use url::Url;

/// Breadth-first site crawler bound to one root URL
pub struct Crawler {
    config: CrawlConfig,
    client: Client,
    robots_token: String,
    root: Url,
    root_host: String,
}

impl Crawler {
    /// Creates a crawler for `root_url`
    ///
    /// # Arguments
    ///
    /// * `root_url` - Site entry point; normalized before use
    /// * `config` - Page, concurrency and time budgets
    /// * `user_agent` - Identification sent with every request
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(AuditError)` - The budget is invalid, the root URL is invalid,
    ///   or the client failed to build
    pub fn new(
        root_url: &str,
        config: &CrawlConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, AuditError> {
        validate_crawl_config(config)?;
        let root = normalize_url(root_url)?;
        let root_host = extract_host(&root).ok_or(crate::UrlError::MissingHost)?;
        let client = build_http_client(user_agent, config.request_timeout())?;

        Ok(Self {
            config: config.clone(),
            client,
            robots_token: user_agent.crawler_name.clone(),
            root,
            root_host,
        })
    }

    /// The normalized root URL
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Runs the crawl to completion
    ///
    /// Never fails: every per-page problem is recorded on the page itself.
    pub async fn run(&self) -> CrawlResult {
        let started = Instant::now();
        let deadline = started + self.config.total_timeout();

        tracing::info!(
            "Starting crawl of {} (max {} pages, concurrency {})",
            self.root,
            self.config.max_pages,
            self.config.concurrency
        );

        let resolution = resolve_site(
            &self.client,
            &self.root,
            &self.robots_token,
            self.config.request_timeout(),
            deadline,
        )
        .await;

        let mut frontier = Frontier::new(self.config.visited_cap());
        frontier.push(self.root.clone());
        for sitemap_url in &resolution.sitemap_urls {
            if let Ok(url) = normalize_url(sitemap_url) {
                frontier.push(on_root_host(url, &self.root));
            }
        }

        let mut pages: Vec<CrawledPage> = Vec::new();
        let mut robots_skipped = 0;
        let mut root_pending = true;
        let mut batch_number = 0;

        let stop_reason = loop {
            if pages.len() >= self.config.max_pages {
                break StopReason::PageLimit;
            }
            if frontier.is_empty() {
                break StopReason::FrontierExhausted;
            }
            if Instant::now() >= deadline {
                break StopReason::TimeBudget;
            }

            // The root goes out alone so an unreachable site is detected
            // before any other request is made
            let batch_size = if root_pending {
                1
            } else {
                self.config
                    .concurrency
                    .min(self.config.max_pages - pages.len())
            };

            let mut batch = Vec::with_capacity(batch_size);
            while batch.len() < batch_size {
                let Some(url) = frontier.pop() else {
                    break;
                };
                if !resolution.robots.is_allowed(url.as_str()) {
                    tracing::debug!("Skipping {} (disallowed by robots.txt)", url);
                    robots_skipped += 1;
                    if url == self.root {
                        root_pending = false;
                    }
                    continue;
                }
                batch.push(url);
            }

            if batch.is_empty() {
                continue;
            }

            let contains_root = batch.iter().any(|u| *u == self.root);
            batch_number += 1;
            tracing::debug!("Batch {}: fetching {} URL(s)", batch_number, batch.len());

            let settled = join_all(batch.iter().map(|url| self.crawl_page(url))).await;

            for page in &settled {
                if let Some(target) = &page.redirect_target {
                    if let Ok(target) = Url::parse(target) {
                        if is_internal(&target, &self.root_host) {
                            frontier.push(on_root_host(target, &self.root));
                        }
                    }
                }
                if page.has_content() {
                    for link in &page.internal_links {
                        if let Ok(link) = Url::parse(link) {
                            frontier.push(on_root_host(link, &self.root));
                        }
                    }
                }
            }
            pages.extend(settled);

            if contains_root {
                root_pending = false;
                if pages.len() == 1 && pages[0].is_fetch_error() {
                    tracing::warn!(
                        "Root URL {} unreachable: {}",
                        self.root,
                        pages[0].error.as_deref().unwrap_or("unknown error")
                    );
                    break StopReason::RootUnreachable;
                }
            }

            let more_to_do = !frontier.is_empty() && pages.len() < self.config.max_pages;
            if more_to_do && !self.config.delay().is_zero() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                tokio::time::sleep(self.config.delay().min(remaining)).await;
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let stats = CrawlStats::from_pages(
            &pages,
            robots_skipped,
            duration_ms,
            frontier.len(),
            stop_reason,
        );

        tracing::info!(
            "Crawl finished ({}): {} pages in {}ms, {} URLs discovered, {} left in frontier",
            stop_reason.describe(),
            stats.pages_crawled,
            duration_ms,
            frontier.visited_count(),
            stats.frontier_remaining
        );

        CrawlResult {
            root_url: self.root.to_string(),
            pages,
            sitemap_found: resolution.sitemap_found,
            sitemap_urls: resolution.sitemap_urls,
            robots_txt_found: resolution.robots_txt_found,
            robots_blocked: resolution.robots.disallow_rules,
            stats,
        }
    }

    /// Fetches one URL and turns the outcome into a page record
    async fn crawl_page(&self, url: &Url) -> CrawledPage {
        let fetched = fetch_url(&self.client, url.as_str(), self.config.request_timeout()).await;
        let mut page = CrawledPage::new(
            url.as_str(),
            fetched.outcome.status_code(),
            fetched.elapsed_ms,
        );

        match fetched.outcome {
            FetchOutcome::Html {
                content_type,
                body,
                noindex_header,
                ..
            } => {
                let parsed = parse_page(&body, url, &self.root_host);
                page.is_html = true;
                page.content_type = Some(content_type);
                page.title = parsed.title;
                page.meta_description = parsed.meta_description;
                page.h1s = parsed.h1s;
                page.canonical = parsed.canonical;
                page.noindex = parsed.noindex || noindex_header;
                page.word_count = parsed.word_count;
                page.internal_links = parsed.internal_links;
                page.external_links = parsed.external_links;
                page.images_total = parsed.images_total;
                page.images_missing_alt = parsed.images_missing_alt;
            }
            FetchOutcome::NonHtml { content_type, .. } => {
                page.content_type = content_type;
            }
            FetchOutcome::Redirect { location, .. } => {
                page.redirect_target = location
                    .and_then(|l| resolve_and_normalize(url, &l))
                    .map(|u| u.to_string());
            }
            FetchOutcome::HttpError { content_type, .. } => {
                page.content_type = content_type;
            }
            FetchOutcome::NetworkError { error, timed_out } => {
                tracing::debug!("Fetch failed for {}: {}", url, error);
                page.error = Some(error);
                page.timed_out = timed_out;
            }
        }

        page
    }
}

/// Crawls a site and returns everything the crawl learned
///
/// This is the main entry point for a crawl. Only an invalid root URL or an
/// HTTP client that cannot be built produce an error.
///
/// # Example
///
/// ```no_run
/// use site_audit::config::{CrawlConfig, UserAgentConfig};
/// use site_audit::crawler::crawl_site;
///
/// # async fn demo() -> Result<(), site_audit::AuditError> {
/// let result = crawl_site("https://example.com", &CrawlConfig::default(), &UserAgentConfig::default()).await?;
/// println!("{} pages", result.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl_site(
    root_url: &str,
    config: &CrawlConfig,
    user_agent: &UserAgentConfig,
) -> Result<CrawlResult, AuditError> {
    let crawler = Crawler::new(root_url, config, user_agent)?;
    Ok(crawler.run().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let config = CrawlConfig {
            concurrency: 0,
            ..CrawlConfig::default()
        };
        let result = Crawler::new("https://example.com", &config, &UserAgentConfig::default());
        assert!(matches!(result, Err(AuditError::Config(_))));
    }

    #[test]
    fn test_budget_shorter_than_request_timeout_is_rejected() {
        let config = CrawlConfig {
            timeout_ms: 5_000,
            total_timeout_ms: 1_000,
            ..CrawlConfig::default()
        };
        let result = Crawler::new("https://example.com", &config, &UserAgentConfig::default());
        assert!(matches!(result, Err(AuditError::Config(_))));
    }

    #[test]
    fn test_invalid_root_is_rejected() {
        let result = Crawler::new(
            "ftp://example.com",
            &CrawlConfig::default(),
            &UserAgentConfig::default(),
        );
        assert!(matches!(result, Err(AuditError::Url(_))));
    }

    #[test]
    fn test_root_is_normalized() {
        let crawler = Crawler::new(
            "https://Example.com/#top",
            &CrawlConfig::default(),
            &UserAgentConfig::default(),
        )
        .unwrap();
        assert_eq!(crawler.root().as_str(), "https://example.com/");
    }
}
