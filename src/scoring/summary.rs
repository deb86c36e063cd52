//! Bounded text summary of a crawl, sent to the AI scorer

use crate::crawler::{CrawlResult, CrawledPage};

/// Hard upper bound on the summary length, in characters
pub const MAX_SUMMARY_CHARS: usize = 12_000;

/// Pages listed individually before the rest are elided
pub const MAX_SUMMARY_PAGES: usize = 60;

const TRUNCATION_MARKER: &str = "\n[summary truncated]";

/// Builds the crawl summary: headline statistics, then one line per page
///
/// The result never exceeds [`MAX_SUMMARY_CHARS`] characters.
pub fn build_crawl_summary(crawl: &CrawlResult) -> String {
    let stats = &crawl.stats;
    let mut out = String::new();

    out.push_str(&format!("Root URL: {}\n", crawl.root_url));
    out.push_str(&format!(
        "Pages crawled: {} (2xx: {}, redirects: {}, 4xx: {}, 5xx: {}, fetch errors: {}, timeouts: {})\n",
        stats.pages_crawled,
        stats.ok_pages,
        stats.redirects,
        stats.client_errors,
        stats.server_errors,
        stats.fetch_errors,
        stats.timeouts
    ));

    let sitemap = if crawl.sitemap_found {
        format!("found ({} URLs)", crawl.sitemap_urls.len())
    } else {
        "not found".to_string()
    };
    out.push_str(&format!("Sitemap: {}\n", sitemap));

    let robots = if crawl.robots_txt_found {
        format!("found ({} disallow rules)", crawl.robots_blocked.len())
    } else {
        "not found".to_string()
    };
    out.push_str(&format!("robots.txt: {}\n", robots));

    out.push_str(&format!("Average response time: {}ms\n", stats.avg_response_ms));
    out.push_str(&format!("Total words: {}\n", stats.total_words));
    out.push_str(&format!("Crawl stopped: {}\n", stats.stop_reason.describe()));
    out.push_str("Pages:\n");

    for page in crawl.pages.iter().take(MAX_SUMMARY_PAGES) {
        out.push_str(&format!("- {}\n", page_line(page)));
    }
    if crawl.pages.len() > MAX_SUMMARY_PAGES {
        out.push_str(&format!(
            "... and {} more page(s)\n",
            crawl.pages.len() - MAX_SUMMARY_PAGES
        ));
    }

    truncate_chars(out)
}

fn page_line(page: &CrawledPage) -> String {
    if page.is_fetch_error() {
        return format!(
            "{} | {} ({}) | {}ms",
            page.url,
            if page.timed_out { "timed out" } else { "unreachable" },
            page.error.as_deref().unwrap_or("no response"),
            page.response_time_ms
        );
    }
    if !page.has_content() {
        let mut line = format!("{} | HTTP {}", page.url, page.status_code);
        if let Some(target) = &page.redirect_target {
            line.push_str(&format!(" -> {}", target));
        }
        line.push_str(&format!(" | {}ms", page.response_time_ms));
        return line;
    }

    let title = match page.title.as_deref() {
        Some(t) if !t.trim().is_empty() => format!("\"{}\"", clip(t, 80)),
        Some(_) => "(empty)".to_string(),
        None => "(none)".to_string(),
    };
    let meta = match page.meta_description.as_deref() {
        Some(d) if !d.trim().is_empty() => "yes",
        _ => "no",
    };
    format!(
        "{} | HTTP {} | title {} | meta {} | h1 {} | words {} | images {} ({} no alt){} | {}ms",
        page.url,
        page.status_code,
        title,
        meta,
        page.h1s.len(),
        page.word_count,
        page.images_total,
        page.images_missing_alt,
        if page.noindex { " | noindex" } else { "" },
        page.response_time_ms
    )
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(max_chars).collect();
        format!("{}...", clipped)
    }
}

fn truncate_chars(text: String) -> String {
    if text.chars().count() <= MAX_SUMMARY_CHARS {
        return text;
    }
    let keep = MAX_SUMMARY_CHARS - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
