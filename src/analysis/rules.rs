//! Rule catalog
//!
//! | Rule | Severity |
//! |------|----------|
//! | Missing `<title>` | CRITICAL |
//! | Duplicate title (per URL) | HIGH |
//! | Missing meta description | HIGH |
//! | Duplicate meta description (per URL) | MEDIUM |
//! | Missing H1 | HIGH |
//! | Multiple H1 | MEDIUM |
//! | 4xx / 5xx status | CRITICAL |
//! | 3xx redirect | MEDIUM |
//! | Thin content | HIGH below 100 words, else MEDIUM |
//! | `noindex` | CRITICAL at depth 0-1, else HIGH |
//! | Canonical on another host | HIGH |
//! | No sitemap (site-level) | CRITICAL |
//! | No robots.txt (site-level) | HIGH |
//! | Images missing alt | HIGH above 50%, else MEDIUM |
//! | Slow response | MEDIUM above 3s, HIGH above 5s |

use super::{IssueCategory, SeoIssue, Severity};
use crate::crawler::{CrawlResult, CrawledPage};
use crate::url::{path_depth, same_site};
use std::collections::HashMap;
use url::Url;

/// Upper bound on issues returned by one analysis
pub const MAX_ISSUES: usize = 300;

/// Pages under this word count are thin
pub const THIN_CONTENT_WORDS: usize = 300;

/// Pages under this word count are very thin
const VERY_THIN_CONTENT_WORDS: usize = 100;

pub const SLOW_PAGE_MS: u64 = 3000;
pub const VERY_SLOW_PAGE_MS: u64 = 5000;

/// Paths that are short by nature and exempt from the thin-content rule
const UTILITY_PATHS: &[&str] = &[
    "/contact",
    "/privacy",
    "/privacy-policy",
    "/terms",
    "/terms-of-service",
    "/login",
    "/signin",
    "/sign-in",
    "/signup",
    "/register",
    "/cart",
    "/checkout",
    "/account",
    "/search",
    "/404",
    "/sitemap",
    "/thank-you",
];

/// True for contact, legal, account and similar utility pages
pub fn is_utility_path(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().trim_end_matches('/').to_lowercase();
    UTILITY_PATHS
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{}/", p)))
}

fn issue(
    category: IssueCategory,
    severity: Severity,
    title: &str,
    detail: &str,
    fixable: bool,
    url: &str,
    evidence: String,
) -> SeoIssue {
    SeoIssue {
        category,
        title: title.to_string(),
        detail: detail.to_string(),
        severity,
        fixable,
        url: url.to_string(),
        evidence,
    }
}

pub(super) fn site_issues(result: &CrawlResult, root_url: &str, issues: &mut Vec<SeoIssue>) {
    if !result.sitemap_found {
        issues.push(issue(
            IssueCategory::Seo,
            Severity::Critical,
            "No XML sitemap",
            "Search engines rely on a sitemap to discover every page. Publish one at /sitemap.xml and reference it from robots.txt.",
            true,
            root_url,
            "No sitemap found via robots.txt directives, /sitemap.xml or /sitemap_index.xml".to_string(),
        ));
    }

    if !result.robots_txt_found {
        issues.push(issue(
            IssueCategory::Technical,
            Severity::High,
            "No robots.txt",
            "A robots.txt file tells crawlers what to skip and where the sitemap lives.",
            true,
            root_url,
            "GET /robots.txt did not return a robots.txt file".to_string(),
        ));
    }
}

pub(super) fn page_issues(page: &CrawledPage, issues: &mut Vec<SeoIssue>) {
    status_issues(page, issues);
    response_time_issues(page, issues);
    if page.has_content() {
        content_issues(page, issues);
    }
}

fn status_issues(page: &CrawledPage, issues: &mut Vec<SeoIssue>) {
    let url = page.url.as_str();
    if page.is_client_error() {
        issues.push(issue(
            IssueCategory::Technical,
            Severity::Critical,
            "Broken page",
            "The page returns a client error. Fix or redirect it and update links pointing here.",
            true,
            url,
            format!("HTTP {} returned for {}", page.status_code, url),
        ));
    } else if page.is_server_error() {
        issues.push(issue(
            IssueCategory::Technical,
            Severity::Critical,
            "Server error",
            "The server failed to render this page. Visitors and crawlers both see an error.",
            false,
            url,
            format!("HTTP {} returned for {}", page.status_code, url),
        ));
    } else if page.is_redirect() {
        let evidence = match &page.redirect_target {
            Some(target) => format!("HTTP {} redirect to {}", page.status_code, target),
            None => format!("HTTP {} redirect without a usable Location header", page.status_code),
        };
        issues.push(issue(
            IssueCategory::Technical,
            Severity::Medium,
            "Redirecting URL",
            "Internal links should point at the final URL instead of going through a redirect.",
            true,
            url,
            evidence,
        ));
    }
}

fn response_time_issues(page: &CrawledPage, issues: &mut Vec<SeoIssue>) {
    if page.is_fetch_error() || page.response_time_ms <= SLOW_PAGE_MS {
        return;
    }
    let severity = if page.response_time_ms > VERY_SLOW_PAGE_MS {
        Severity::High
    } else {
        Severity::Medium
    };
    issues.push(issue(
        IssueCategory::Performance,
        severity,
        "Slow response",
        "Slow pages lose visitors and rank lower. Check hosting, caching and page weight.",
        false,
        &page.url,
        format!("Responded in {}ms (threshold {}ms)", page.response_time_ms, SLOW_PAGE_MS),
    ));
}

fn content_issues(page: &CrawledPage, issues: &mut Vec<SeoIssue>) {
    let url = page.url.as_str();

    match page.title.as_deref() {
        None => issues.push(issue(
            IssueCategory::Seo,
            Severity::Critical,
            "Missing page title",
            "Every page needs a unique, descriptive <title>; it is the headline shown in search results.",
            true,
            url,
            "No <title> element found".to_string(),
        )),
        Some(t) if t.trim().is_empty() => issues.push(issue(
            IssueCategory::Seo,
            Severity::Critical,
            "Missing page title",
            "Every page needs a unique, descriptive <title>; it is the headline shown in search results.",
            true,
            url,
            "<title> element is empty".to_string(),
        )),
        Some(_) => {}
    }

    match page.meta_description.as_deref() {
        None => issues.push(issue(
            IssueCategory::Seo,
            Severity::High,
            "Missing meta description",
            "Without a meta description search engines pick arbitrary text for the result snippet.",
            true,
            url,
            "No <meta name=\"description\"> tag found".to_string(),
        )),
        Some(d) if d.trim().is_empty() => issues.push(issue(
            IssueCategory::Seo,
            Severity::High,
            "Missing meta description",
            "Without a meta description search engines pick arbitrary text for the result snippet.",
            true,
            url,
            "<meta name=\"description\"> has empty content".to_string(),
        )),
        Some(_) => {}
    }

    if page.h1s.is_empty() {
        issues.push(issue(
            IssueCategory::Seo,
            Severity::High,
            "Missing H1 heading",
            "The main heading tells visitors and search engines what the page is about.",
            true,
            url,
            "No <h1> element found".to_string(),
        ));
    } else if page.h1s.len() > 1 {
        let quoted: Vec<String> = page.h1s.iter().map(|h| format!("\"{}\"", h)).collect();
        issues.push(issue(
            IssueCategory::Seo,
            Severity::Medium,
            "Multiple H1 headings",
            "Use a single <h1> per page and demote the others to <h2>.",
            true,
            url,
            format!("Found {} <h1> elements: {}", page.h1s.len(), quoted.join(", ")),
        ));
    }

    if page.word_count < THIN_CONTENT_WORDS && !is_utility_path(url) {
        let severity = if page.word_count < VERY_THIN_CONTENT_WORDS {
            Severity::High
        } else {
            Severity::Medium
        };
        issues.push(issue(
            IssueCategory::Content,
            severity,
            "Thin content",
            "Pages with little text rarely rank. Expand the copy with useful detail for the visitor.",
            true,
            url,
            format!("{} words of body text (minimum {})", page.word_count, THIN_CONTENT_WORDS),
        ));
    }

    if page.noindex {
        let depth = Url::parse(url).map(|u| path_depth(&u)).unwrap_or(0);
        let severity = if depth <= 1 {
            Severity::Critical
        } else {
            Severity::High
        };
        issues.push(issue(
            IssueCategory::Seo,
            severity,
            "Page excluded from search (noindex)",
            "A noindex directive keeps this page out of search results. Remove it unless that is intended.",
            true,
            url,
            format!("noindex directive present at path depth {}", depth),
        ));
    }

    if let Some(canonical) = &page.canonical {
        let page_host = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string));
        let canonical_host = Url::parse(canonical)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        if let (Some(page_host), Some(canonical_host)) = (page_host, canonical_host) {
            if !same_site(&page_host, &canonical_host) {
                issues.push(issue(
                    IssueCategory::Seo,
                    Severity::High,
                    "Canonical points to another domain",
                    "The canonical link hands this page's ranking to a different site.",
                    true,
                    url,
                    format!("rel=canonical points to {}", canonical),
                ));
            }
        }
    }

    if page.images_missing_alt > 0 {
        let severity = if page.images_missing_alt * 2 > page.images_total {
            Severity::High
        } else {
            Severity::Medium
        };
        issues.push(issue(
            IssueCategory::Accessibility,
            severity,
            "Images missing alt text",
            "Alt text describes images to screen readers and image search.",
            true,
            url,
            format!(
                "{} of {} images have no alt attribute",
                page.images_missing_alt, page.images_total
            ),
        ));
    }
}

/// Groups content pages by a non-empty key, keeping first-seen order
fn group_by<'a, F>(pages: &'a [CrawledPage], key: F) -> Vec<Vec<&'a CrawledPage>>
where
    F: Fn(&CrawledPage) -> Option<&str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<&CrawledPage>> = Vec::new();

    for page in pages.iter().filter(|p| p.has_content()) {
        let Some(value) = key(page).map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        match index.get(value) {
            Some(&i) => groups[i].push(page),
            None => {
                index.insert(value.to_string(), groups.len());
                groups.push(vec![page]);
            }
        }
    }

    groups.into_iter().filter(|g| g.len() > 1).collect()
}

fn siblings(group: &[&CrawledPage], current: &CrawledPage) -> String {
    group
        .iter()
        .filter(|p| p.url != current.url)
        .map(|p| p.url.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn duplicate_title_issues(pages: &[CrawledPage], issues: &mut Vec<SeoIssue>) {
    for group in group_by(pages, |p| p.title.as_deref()) {
        for page in &group {
            issues.push(issue(
                IssueCategory::Seo,
                Severity::High,
                "Duplicate page title",
                "Several pages share this title, so search engines cannot tell them apart.",
                true,
                &page.url,
                format!(
                    "Title \"{}\" also used by: {}",
                    page.title.as_deref().unwrap_or_default().trim(),
                    siblings(&group, page)
                ),
            ));
        }
    }
}

pub(super) fn duplicate_meta_issues(pages: &[CrawledPage], issues: &mut Vec<SeoIssue>) {
    for group in group_by(pages, |p| p.meta_description.as_deref()) {
        for page in &group {
            issues.push(issue(
                IssueCategory::Seo,
                Severity::Medium,
                "Duplicate meta description",
                "Each page should describe its own content in its meta description.",
                true,
                &page.url,
                format!("Same meta description as: {}", siblings(&group, page)),
            ));
        }
    }
}
