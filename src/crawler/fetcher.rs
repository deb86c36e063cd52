//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Timeout-bounded GET requests (the timeout aborts the whole exchange)
//! - Manual redirect capture via the `Location` header
//! - Error classification
//!
//! Fetch failures are never returned as `Err`: they are part of the crawl
//! data, so one bad page cannot abort the crawl.

use crate::config::UserAgentConfig;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};

/// Bodies larger than this are truncated before parsing
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Result of a single fetch, always carrying the measured elapsed time
#[derive(Debug)]
pub struct FetchResult {
    /// Wall-clock time from dispatch to settle, in milliseconds
    pub elapsed_ms: u64,
    pub outcome: FetchOutcome,
}

/// What a fetch produced
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with an HTML body
    Html {
        status_code: u16,
        content_type: String,
        body: String,
        /// `X-Robots-Tag: noindex` was present
        noindex_header: bool,
    },

    /// 2xx response that is not HTML; recorded but not parsed
    NonHtml {
        status_code: u16,
        content_type: Option<String>,
    },

    /// 3xx response; the target is enqueued rather than followed
    Redirect {
        status_code: u16,
        location: Option<String>,
    },

    /// 4xx or 5xx response
    HttpError {
        status_code: u16,
        content_type: Option<String>,
    },

    /// Connection failure, timeout, or unreadable body
    NetworkError { error: String, timed_out: bool },
}

impl FetchOutcome {
    /// Status code as recorded on the page (0 when nothing was received)
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Html { status_code, .. }
            | Self::NonHtml { status_code, .. }
            | Self::Redirect { status_code, .. }
            | Self::HttpError { status_code, .. } => *status_code,
            Self::NetworkError { .. } => 0,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled so the crawler can treat each hop as its own
/// frontier entry. `timeout` is a backstop; [`fetch_url`] enforces its own.
///
/// # Example
///
/// ```no_run
/// use site_audit::config::UserAgentConfig;
/// use site_audit::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(8)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL under a hard timeout
///
/// # Outcome Mapping
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx + `text/html` / `application/xhtml+xml` | Html |
/// | 2xx, any other type | NonHtml |
/// | 3xx | Redirect (target from `Location`) |
/// | 4xx / 5xx | HttpError |
/// | Timeout, connection error, body error | NetworkError |
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> FetchResult {
    let started = Instant::now();
    let outcome = match tokio::time::timeout(timeout, fetch_inner(client, url)).await {
        Ok(outcome) => outcome,
        Err(_) => FetchOutcome::NetworkError {
            error: format!("Request timed out after {}ms", timeout.as_millis()),
            timed_out: true,
        },
    };

    FetchResult {
        elapsed_ms: started.elapsed().as_millis() as u64,
        outcome,
    }
}

async fn fetch_inner(client: &Client, url: &str) -> FetchOutcome {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    let status_code = status.as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        return FetchOutcome::Redirect {
            status_code,
            location,
        };
    }

    if status.is_client_error() || status.is_server_error() {
        return FetchOutcome::HttpError {
            status_code,
            content_type,
        };
    }

    let is_html = content_type.as_deref().map(is_html_content_type).unwrap_or(false);
    if !is_html {
        return FetchOutcome::NonHtml {
            status_code,
            content_type,
        };
    }

    let noindex_header = response
        .headers()
        .get_all("x-robots-tag")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_lowercase().contains("noindex"));

    match response.bytes().await {
        Ok(bytes) => {
            let slice = &bytes[..bytes.len().min(MAX_BODY_BYTES)];
            FetchOutcome::Html {
                status_code,
                content_type: content_type.unwrap_or_default(),
                body: String::from_utf8_lossy(slice).into_owned(),
                noindex_header,
            }
        }
        Err(e) => classify_error(&e),
    }
}

/// Fetches a small text resource (robots.txt, sitemaps)
///
/// Returns the body only for 2xx responses; everything else is `None`.
pub async fn fetch_text(client: &Client, url: &str, timeout: Duration) -> Option<String> {
    let request = async {
        let response = client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            tracing::debug!("{} returned HTTP {}", url, response.status());
            return None;
        }
        let bytes = response.bytes().await.ok()?;
        let slice = &bytes[..bytes.len().min(MAX_BODY_BYTES)];
        Some(String::from_utf8_lossy(slice).into_owned())
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(body) => body,
        Err(_) => {
            tracing::debug!("Timed out fetching {}", url);
            None
        }
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::NetworkError {
            error: "Request timeout".to_string(),
            timed_out: true,
        }
    } else if e.is_connect() {
        FetchOutcome::NetworkError {
            error: format!("Connection failed: {}", e),
            timed_out: false,
        }
    } else {
        FetchOutcome::NetworkError {
            error: e.to_string(),
            timed_out: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("text/plain"));
    }

    #[test]
    fn test_network_error_status_is_zero() {
        let outcome = FetchOutcome::NetworkError {
            error: "boom".to_string(),
            timed_out: false,
        };
        assert_eq!(outcome.status_code(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_data_not_error() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(2)).unwrap();
        // Port 9 on localhost is the discard port; nothing listens there in CI
        let result = fetch_url(&client, "http://127.0.0.1:9/", Duration::from_secs(2)).await;
        assert_eq!(result.outcome.status_code(), 0);
        assert!(matches!(result.outcome, FetchOutcome::NetworkError { .. }));
    }
}
