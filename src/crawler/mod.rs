//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with hard timeouts and manual redirects
//! - HTML signal extraction
//! - The breadth-first frontier
//! - Batch orchestration under page and time budgets

mod coordinator;
mod fetcher;
mod frontier;
mod page;
mod parser;

pub use coordinator::{crawl_site, Crawler};
pub use fetcher::{build_http_client, fetch_text, fetch_url, FetchOutcome, FetchResult, MAX_BODY_BYTES};
pub use frontier::Frontier;
pub use page::{CrawlResult, CrawlStats, CrawledPage, StopReason};
pub use parser::{parse_page, ParsedPage};
