//! Crawl data types
//!
//! A [`CrawledPage`] is created once per fetched URL and never changes after
//! the orchestrator appends it. Fetch failures are pages too: they carry
//! `status_code == 0`, the elapsed time, and the error text.

use serde::{Deserialize, Serialize};

/// Signals recorded for one fetched URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledPage {
    /// Normalized URL that was requested
    pub url: String,

    /// HTTP status, or 0 when no response was received
    pub status_code: u16,

    /// Normalized `Location` target for 3xx responses
    pub redirect_target: Option<String>,

    pub content_type: Option<String>,

    /// True when the body was HTML and went through the parser
    pub is_html: bool,

    /// `None` when there is no `<title>` element; `Some("")` when it is empty
    pub title: Option<String>,

    /// `None` when there is no description meta tag; `Some("")` when it is empty
    pub meta_description: Option<String>,

    /// Text of every `<h1>`, in document order
    pub h1s: Vec<String>,

    pub canonical: Option<String>,
    pub noindex: bool,
    pub word_count: usize,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub images_total: usize,
    pub images_missing_alt: usize,

    /// Measured for every page, including failures
    pub response_time_ms: u64,

    /// Network or timeout error text for `status_code == 0`
    pub error: Option<String>,

    /// True when the request hit the per-request timeout
    #[serde(default)]
    pub timed_out: bool,
}

impl CrawledPage {
    /// Creates a bare page record with no parsed signals
    pub fn new(url: impl Into<String>, status_code: u16, response_time_ms: u64) -> Self {
        Self {
            url: url.into(),
            status_code,
            response_time_ms,
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// True when no HTTP response was received at all
    pub fn is_fetch_error(&self) -> bool {
        self.status_code == 0
    }

    /// 2xx HTML page whose content signals are meaningful
    pub fn has_content(&self) -> bool {
        self.is_success() && self.is_html
    }
}

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    PageLimit,
    FrontierExhausted,
    TimeBudget,
    RootUnreachable,
}

impl StopReason {
    pub fn describe(&self) -> &'static str {
        match self {
            StopReason::PageLimit => "page limit reached",
            StopReason::FrontierExhausted => "no more URLs to crawl",
            StopReason::TimeBudget => "time budget exhausted",
            StopReason::RootUnreachable => "root URL unreachable",
        }
    }
}

/// Summary statistics persisted with each audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub pages_crawled: usize,
    pub html_pages: usize,
    pub ok_pages: usize,
    pub redirects: usize,
    pub client_errors: usize,
    pub server_errors: usize,
    pub fetch_errors: usize,
    /// Fetch errors caused by the per-request timeout
    #[serde(default)]
    pub timeouts: usize,
    pub robots_skipped: usize,
    pub non_html_pages: usize,
    /// Mean response time over pages that produced a response
    pub avg_response_ms: u64,
    pub total_words: usize,
    pub duration_ms: u64,
    pub frontier_remaining: usize,
    pub stop_reason: StopReason,
}

impl CrawlStats {
    /// Computes statistics from the settled page list
    pub fn from_pages(
        pages: &[CrawledPage],
        robots_skipped: usize,
        duration_ms: u64,
        frontier_remaining: usize,
        stop_reason: StopReason,
    ) -> Self {
        let responded: Vec<&CrawledPage> = pages.iter().filter(|p| !p.is_fetch_error()).collect();
        let avg_response_ms = if responded.is_empty() {
            0
        } else {
            let total: u64 = responded.iter().map(|p| p.response_time_ms).sum();
            (total as f64 / responded.len() as f64).round() as u64
        };

        Self {
            pages_crawled: pages.len(),
            html_pages: pages.iter().filter(|p| p.is_html).count(),
            ok_pages: pages.iter().filter(|p| p.is_success()).count(),
            redirects: pages.iter().filter(|p| p.is_redirect()).count(),
            client_errors: pages.iter().filter(|p| p.is_client_error()).count(),
            server_errors: pages.iter().filter(|p| p.is_server_error()).count(),
            fetch_errors: pages.iter().filter(|p| p.is_fetch_error()).count(),
            timeouts: pages.iter().filter(|p| p.timed_out).count(),
            robots_skipped,
            non_html_pages: pages
                .iter()
                .filter(|p| p.is_success() && !p.is_html)
                .count(),
            avg_response_ms,
            total_words: pages.iter().map(|p| p.word_count).sum(),
            duration_ms,
            frontier_remaining,
            stop_reason,
        }
    }
}

/// Everything one crawl produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub root_url: String,
    pub pages: Vec<CrawledPage>,
    pub sitemap_found: bool,
    pub sitemap_urls: Vec<String>,
    pub robots_txt_found: bool,
    /// Disallow prefixes that applied to this crawl
    pub robots_blocked: Vec<String>,
    pub stats: CrawlStats,
}

impl CrawlResult {
    /// True when at least one page produced an HTTP response
    pub fn has_crawl_data(&self) -> bool {
        self.pages.iter().any(|p| !p.is_fetch_error())
    }

    /// The record for the root URL, if it was fetched
    pub fn root_page(&self) -> Option<&CrawledPage> {
        self.pages.iter().find(|p| p.url == self.root_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(CrawledPage::new("u", 204, 1).is_success());
        assert!(CrawledPage::new("u", 301, 1).is_redirect());
        assert!(CrawledPage::new("u", 404, 1).is_client_error());
        assert!(CrawledPage::new("u", 503, 1).is_server_error());
        assert!(CrawledPage::new("u", 0, 1).is_fetch_error());
    }

    #[test]
    fn test_stats_from_pages() {
        let mut html = CrawledPage::new("https://example.com/", 200, 100);
        html.is_html = true;
        html.word_count = 250;
        let pdf = CrawledPage::new("https://example.com/a.pdf", 200, 300);
        let missing = CrawledPage::new("https://example.com/gone", 404, 200);
        let mut dead = CrawledPage::new("https://example.com/slow", 0, 8000);
        dead.timed_out = true;

        let stats = CrawlStats::from_pages(
            &[html, pdf, missing, dead],
            2,
            1234,
            7,
            StopReason::PageLimit,
        );

        assert_eq!(stats.pages_crawled, 4);
        assert_eq!(stats.html_pages, 1);
        assert_eq!(stats.ok_pages, 2);
        assert_eq!(stats.client_errors, 1);
        assert_eq!(stats.fetch_errors, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.non_html_pages, 1);
        assert_eq!(stats.robots_skipped, 2);
        // Failed fetches do not count toward the average
        assert_eq!(stats.avg_response_ms, 200);
        assert_eq!(stats.total_words, 250);
    }

    #[test]
    fn test_stop_reason_serializes_snake_case() {
        let json = serde_json::to_string(&StopReason::FrontierExhausted).unwrap();
        assert_eq!(json, "\"frontier_exhausted\"");
    }
}
