//! Issue analysis over a finished crawl
//!
//! Every issue is tied to one URL and carries a concrete evidence string, so
//! each claim in a report can be checked by visiting that URL. Site-level
//! issues (missing sitemap, missing robots.txt) are attached to the root URL.

mod rules;

pub use rules::{is_utility_path, MAX_ISSUES, SLOW_PAGE_MS, THIN_CONTENT_WORDS, VERY_SLOW_PAGE_MS};

use crate::crawler::CrawlResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How urgent an issue is; lower rank sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }

    /// Converts the severity to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    /// Parses a severity from its database string representation
    ///
    /// Matching is case-insensitive so externally produced labels map too.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            "INFO" => Some(Severity::Info),
            _ => None,
        }
    }

    pub fn all() -> [Severity; 5] {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Info,
        ]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Area of the site an issue belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Seo,
    Technical,
    Content,
    Performance,
    Accessibility,
}

impl IssueCategory {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            IssueCategory::Seo => "seo",
            IssueCategory::Technical => "technical",
            IssueCategory::Content => "content",
            IssueCategory::Performance => "performance",
            IssueCategory::Accessibility => "accessibility",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "seo" => Some(IssueCategory::Seo),
            "technical" => Some(IssueCategory::Technical),
            "content" => Some(IssueCategory::Content),
            "performance" => Some(IssueCategory::Performance),
            "accessibility" => Some(IssueCategory::Accessibility),
            _ => None,
        }
    }
}

/// One evidence-backed finding about one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoIssue {
    pub category: IssueCategory,
    pub title: String,
    pub detail: String,
    pub severity: Severity,
    pub fixable: bool,
    pub url: String,
    pub evidence: String,
}

/// Runs every rule over a crawl
///
/// Issues come back sorted by severity, ties kept in discovery order, and
/// capped at [`MAX_ISSUES`].
///
/// # Arguments
///
/// * `result` - The finished crawl
/// * `root_url` - URL that site-level issues are attached to
pub fn analyze(result: &CrawlResult, root_url: &str) -> Vec<SeoIssue> {
    let mut issues = Vec::new();

    rules::site_issues(result, root_url, &mut issues);
    for page in &result.pages {
        rules::page_issues(page, &mut issues);
    }
    rules::duplicate_title_issues(&result.pages, &mut issues);
    rules::duplicate_meta_issues(&result.pages, &mut issues);

    issues.sort_by_key(|issue| issue.severity.rank());
    if issues.len() > MAX_ISSUES {
        tracing::debug!("Truncating {} issues to {}", issues.len(), MAX_ISSUES);
        issues.truncate(MAX_ISSUES);
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CrawlStats, CrawledPage, StopReason};

    fn html_page(url: &str, title: &str, meta: &str, words: usize) -> CrawledPage {
        let mut page = CrawledPage::new(url, 200, 120);
        page.is_html = true;
        page.title = Some(title.to_string());
        page.meta_description = Some(meta.to_string());
        page.h1s = vec!["Heading".to_string()];
        page.word_count = words;
        page
    }

    fn result(pages: Vec<CrawledPage>, sitemap: bool, robots: bool) -> CrawlResult {
        let stats = CrawlStats::from_pages(&pages, 0, 10, 0, StopReason::FrontierExhausted);
        CrawlResult {
            root_url: "https://example.com/".to_string(),
            pages,
            sitemap_found: sitemap,
            sitemap_urls: Vec::new(),
            robots_txt_found: robots,
            robots_blocked: Vec::new(),
            stats,
        }
    }

    #[test]
    fn test_clean_site_has_no_issues() {
        let pages = vec![
            html_page("https://example.com/", "Home", "Welcome home", 500),
            html_page("https://example.com/about", "About", "About us", 450),
        ];
        assert!(analyze(&result(pages, true, true), "https://example.com/").is_empty());
    }

    #[test]
    fn test_site_level_issues_emitted_once() {
        let pages = vec![
            html_page("https://example.com/", "Home", "Welcome home", 500),
            html_page("https://example.com/about", "About", "About us", 450),
            html_page("https://example.com/team", "Team", "Our team", 450),
        ];
        let issues = analyze(&result(pages, false, false), "https://example.com/");

        let sitemap: Vec<_> = issues.iter().filter(|i| i.title == "No XML sitemap").collect();
        let robots: Vec<_> = issues.iter().filter(|i| i.title == "No robots.txt").collect();
        assert_eq!(sitemap.len(), 1);
        assert_eq!(robots.len(), 1);
        assert_eq!(sitemap[0].url, "https://example.com/");
        assert_eq!(sitemap[0].severity, Severity::Critical);
        assert_eq!(robots[0].severity, Severity::High);
    }

    #[test]
    fn test_duplicate_title_group_lists_siblings() {
        let pages = vec![
            html_page("https://example.com/a", "Same", "A", 500),
            html_page("https://example.com/b", "Same", "B", 500),
            html_page("https://example.com/c", "Same", "C", 500),
            html_page("https://example.com/d", "Unique", "D", 500),
        ];
        let issues = analyze(&result(pages, true, true), "https://example.com/");
        let dupes: Vec<_> = issues
            .iter()
            .filter(|i| i.title == "Duplicate page title")
            .collect();

        assert_eq!(dupes.len(), 3);
        let for_a = dupes.iter().find(|i| i.url == "https://example.com/a").unwrap();
        assert!(for_a.evidence.contains("https://example.com/b"));
        assert!(for_a.evidence.contains("https://example.com/c"));
        assert!(!for_a.evidence.contains("https://example.com/a"));
    }

    #[test]
    fn test_sorted_by_severity_then_discovery() {
        let mut broken = CrawledPage::new("https://example.com/gone", 404, 50);
        broken.is_html = true;
        let mut no_h1 = html_page("https://example.com/x", "X", "X", 500);
        no_h1.h1s.clear();
        let pages = vec![no_h1, broken];
        let issues = analyze(&result(pages, true, true), "https://example.com/");

        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].url, "https://example.com/gone");
        assert!(issues.windows(2).all(|w| w[0].severity.rank() <= w[1].severity.rank()));
    }

    #[test]
    fn test_issue_cap() {
        let pages: Vec<CrawledPage> = (0..400)
            .map(|i| CrawledPage::new(format!("https://example.com/p{}", i), 404, 10))
            .collect();
        let issues = analyze(&result(pages, true, true), "https://example.com/");
        assert_eq!(issues.len(), MAX_ISSUES);
    }

    #[test]
    fn test_severity_db_roundtrip_is_case_insensitive() {
        assert_eq!(Severity::from_db_string("high"), Some(Severity::High));
        assert_eq!(Severity::from_db_string(" CRITICAL "), Some(Severity::Critical));
        assert_eq!(Severity::from_db_string("urgent"), None);
    }
}
