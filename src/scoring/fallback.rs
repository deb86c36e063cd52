//! Deterministic crawl-based scoring
//!
//! Used when the AI scorer cannot produce a usable result. The same crawl
//! and business profile always yield the same scores: no clocks, no
//! randomness, no iteration over hash maps.
//!
//! `seo` and `website` are derived from crawl signals. `social`, `offer`,
//! `reputation` and `local` only see whether profile URLs were supplied and
//! are reported as low-confidence estimates.

use super::{BusinessProfile, ScoreCard};
use crate::analysis::{is_utility_path, SLOW_PAGE_MS, THIN_CONTENT_WORDS};
use crate::crawler::{CrawlResult, CrawledPage};

/// Disclosure embedded in every fallback root-cause summary
pub const FALLBACK_DISCLOSURE: &str = "AI analysis unavailable";

const MIN_SCORE: f64 = 5.0;
const MAX_SCORE: f64 = 100.0;

fn clamp_score(score: f64) -> u8 {
    score.clamp(MIN_SCORE, MAX_SCORE).round() as u8
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Counts the fallback formulas and the summary template both need
struct CrawlSignals {
    pages_crawled: usize,
    content_pages: usize,
    missing_titles: usize,
    missing_meta: usize,
    missing_h1: usize,
    thin_pages: usize,
    client_errors: usize,
    server_errors: usize,
    images_total: usize,
    images_missing_alt: usize,
    slow_pages: usize,
    avg_response_ms: Option<u64>,
    avg_words: f64,
    root_reachable: bool,
    root_https: bool,
    sitemap_found: bool,
    robots_found: bool,
}

impl CrawlSignals {
    fn collect(crawl: &CrawlResult) -> Self {
        let content: Vec<&CrawledPage> = crawl.pages.iter().filter(|p| p.has_content()).collect();
        let blank = |v: &Option<String>| v.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true);
        let responded: Vec<&CrawledPage> =
            crawl.pages.iter().filter(|p| !p.is_fetch_error()).collect();

        let avg_response_ms = if responded.is_empty() {
            None
        } else {
            let total: u64 = responded.iter().map(|p| p.response_time_ms).sum();
            Some((total as f64 / responded.len() as f64).round() as u64)
        };
        let avg_words = if content.is_empty() {
            0.0
        } else {
            content.iter().map(|p| p.word_count).sum::<usize>() as f64 / content.len() as f64
        };

        let root_reachable = match crawl.root_page() {
            Some(root) => !root.is_fetch_error(),
            None => crawl.has_crawl_data(),
        };

        Self {
            pages_crawled: crawl.pages.len(),
            content_pages: content.len(),
            missing_titles: content.iter().filter(|p| blank(&p.title)).count(),
            missing_meta: content.iter().filter(|p| blank(&p.meta_description)).count(),
            missing_h1: content.iter().filter(|p| p.h1s.is_empty()).count(),
            thin_pages: content
                .iter()
                .filter(|p| p.word_count < THIN_CONTENT_WORDS && !is_utility_path(&p.url))
                .count(),
            client_errors: crawl.pages.iter().filter(|p| p.is_client_error()).count(),
            server_errors: crawl.pages.iter().filter(|p| p.is_server_error()).count(),
            images_total: content.iter().map(|p| p.images_total).sum(),
            images_missing_alt: content.iter().map(|p| p.images_missing_alt).sum(),
            slow_pages: responded
                .iter()
                .filter(|p| p.response_time_ms > SLOW_PAGE_MS)
                .count(),
            avg_response_ms,
            avg_words,
            root_reachable,
            root_https: crawl.root_url.starts_with("https://"),
            sitemap_found: crawl.sitemap_found,
            robots_found: crawl.robots_txt_found,
        }
    }

    /// Ratio over content pages; with no content page every page "misses" it
    fn content_ratio(&self, count: usize) -> f64 {
        if self.content_pages == 0 {
            1.0
        } else {
            ratio(count, self.content_pages)
        }
    }
}

fn seo_score(s: &CrawlSignals) -> u8 {
    let mut score = 100.0;
    score -= (20.0 * s.content_ratio(s.missing_titles)).min(20.0);
    score -= (15.0 * s.content_ratio(s.missing_meta)).min(15.0);
    score -= (10.0 * s.content_ratio(s.missing_h1)).min(10.0);
    score -= (10.0 * s.content_ratio(s.thin_pages)).min(10.0);
    if !s.sitemap_found {
        score -= 10.0;
    }
    if !s.robots_found {
        score -= 5.0;
    }
    score -= (3.0 * s.client_errors as f64).min(15.0);
    score -= (5.0 * s.server_errors as f64).min(15.0);
    score -= (10.0 * ratio(s.images_missing_alt, s.images_total)).min(10.0);
    score -= (2.0 * s.slow_pages as f64).min(10.0);
    clamp_score(score)
}

fn website_score(s: &CrawlSignals) -> u8 {
    let mut score = if s.root_reachable { 50.0 } else { 10.0 };
    if s.avg_words >= THIN_CONTENT_WORDS as f64 {
        score += 15.0;
    }
    if s.client_errors == 0 && s.server_errors == 0 {
        score += 15.0;
    }
    match s.avg_response_ms {
        Some(ms) if ms < 1000 => score += 10.0,
        Some(ms) if ms < 2000 => score += 5.0,
        _ => {}
    }
    if s.root_https {
        score += 10.0;
    }
    clamp_score(score)
}

fn social_score(business: &BusinessProfile) -> u8 {
    match business.social_profile_urls.len() {
        0 => 25,
        1 => 45,
        _ => 60,
    }
}

fn local_score(business: &BusinessProfile) -> u8 {
    if business.google_business_url.is_some() {
        60
    } else {
        30
    }
}

fn reputation_score(business: &BusinessProfile) -> u8 {
    if !business.review_profile_urls.is_empty() || business.google_business_url.is_some() {
        55
    } else {
        30
    }
}

fn offer_score(s: &CrawlSignals) -> u8 {
    if s.root_reachable {
        45
    } else {
        35
    }
}

fn found(flag: bool) -> &'static str {
    if flag {
        "found"
    } else {
        "not found"
    }
}

fn root_cause_summary(s: &CrawlSignals) -> String {
    let response = match s.avg_response_ms {
        Some(ms) => format!("{}ms", ms),
        None => "n/a".to_string(),
    };
    format!(
        "{}: scores were computed from crawl data only. \
         Crawled {} page(s): {} missing title(s), {} missing meta description(s), \
         {} client error(s) (4xx), {} server error(s) (5xx). \
         Sitemap {}; robots.txt {}; average response time {}. \
         Social, offer, reputation and local scores are low-confidence estimates \
         based only on which profile URLs were supplied.",
        FALLBACK_DISCLOSURE,
        s.pages_crawled,
        s.missing_titles,
        s.missing_meta,
        s.client_errors,
        s.server_errors,
        found(s.sitemap_found),
        found(s.robots_found),
        response,
    )
}

/// Computes a score card from crawl data and business presence flags
///
/// # Example
///
/// ```
/// use site_audit::crawler::{CrawlResult, CrawlStats, CrawledPage, StopReason};
/// use site_audit::scoring::{fallback_scores, BusinessProfile};
///
/// let pages = vec![CrawledPage::new("https://example.com/", 200, 120)];
/// let crawl = CrawlResult {
///     root_url: "https://example.com/".to_string(),
///     stats: CrawlStats::from_pages(&pages, 0, 10, 0, StopReason::FrontierExhausted),
///     pages,
///     sitemap_found: true,
///     sitemap_urls: vec![],
///     robots_txt_found: true,
///     robots_blocked: vec![],
/// };
/// let first = fallback_scores(&crawl, &BusinessProfile::default());
/// let second = fallback_scores(&crawl, &BusinessProfile::default());
/// assert_eq!(first, second);
/// ```
pub fn fallback_scores(crawl: &CrawlResult, business: &BusinessProfile) -> ScoreCard {
    let signals = CrawlSignals::collect(crawl);

    let website = website_score(&signals);
    let seo = seo_score(&signals);
    let social = social_score(business);
    let offer = offer_score(&signals);
    let reputation = reputation_score(business);
    let local = local_score(business);

    ScoreCard {
        overall_score: ScoreCard::mean_of([website, seo, social, offer, reputation, local]),
        website_score: website,
        seo_score: seo,
        social_score: social,
        offer_score: offer,
        reputation_score: reputation,
        local_score: local,
        root_cause_summary: root_cause_summary(&signals),
    }
}
