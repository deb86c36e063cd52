//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use site_audit::config::{CrawlConfig, UserAgentConfig};
use site_audit::crawler::{crawl_site, StopReason};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A fast crawl budget suitable for a local mock server
fn test_config(max_pages: usize, concurrency: usize) -> CrawlConfig {
    CrawlConfig {
        max_pages,
        concurrency,
        delay_ms: 0,
        timeout_ms: 2_000,
        total_timeout_ms: 20_000,
    }
}

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn html_page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    let body = format!(
        r#"<html><head><title>{}</title></head><body><h1>{}</h1><p>Some text.</p>{}</body></html>"#,
        title, title, anchors
    );
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_follows_links_until_frontier_exhausted() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/about", "/contact"])).await;
    mount_page(&server, "/about", html_page("About", &["/", "/contact"])).await;
    mount_page(&server, "/contact", html_page("Contact", &["/about"])).await;

    let result = crawl_site(&server.uri(), &test_config(50, 5), &test_user_agent())
        .await
        .unwrap();

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.stats.stop_reason, StopReason::FrontierExhausted);
    assert_eq!(result.stats.frontier_remaining, 0);
    assert!(!result.robots_txt_found);
    assert!(!result.sitemap_found);

    // The root is always crawled first
    assert_eq!(result.pages[0].url, format!("{}/", server.uri()));
    assert_eq!(result.pages[0].title.as_deref(), Some("Home"));
    assert!(result.pages.iter().all(|p| p.status_code == 200));
}

#[tokio::test]
async fn test_page_limit_caps_results() {
    let server = MockServer::start().await;

    let links: Vec<String> = (1..=10).map(|i| format!("/p{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Home", &link_refs)).await;
    for link in &links {
        mount_page(&server, link, html_page("Child", &[])).await;
    }

    let result = crawl_site(&server.uri(), &test_config(4, 5), &test_user_agent())
        .await
        .unwrap();

    assert_eq!(result.pages.len(), 4);
    assert_eq!(result.stats.stop_reason, StopReason::PageLimit);
    assert_eq!(result.stats.frontier_remaining, 7);
}

#[tokio::test]
async fn test_time_budget_stops_crawl() {
    let server = MockServer::start().await;

    let links: Vec<String> = (1..=10).map(|i| format!("/slow{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Home", &link_refs)).await;
    for link in &links {
        mount_page(
            &server,
            link,
            html_page("Slow", &[]).set_delay(Duration::from_millis(600)),
        )
        .await;
    }

    let config = CrawlConfig {
        max_pages: 50,
        concurrency: 1,
        delay_ms: 0,
        timeout_ms: 1_000,
        total_timeout_ms: 1_500,
    };
    let result = crawl_site(&server.uri(), &config, &test_user_agent())
        .await
        .unwrap();

    assert_eq!(result.stats.stop_reason, StopReason::TimeBudget);
    assert!(result.pages.len() < 11);
    assert!(result.stats.frontier_remaining > 0);
    // Overshoot is bounded by one batch
    assert!(result.stats.duration_ms < 1_500 + 1_000 + 1_000);
}

#[tokio::test]
async fn test_robots_disallowed_urls_are_skipped() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200)
            .set_body_raw("User-agent: *\nDisallow: /private\nDisallow: /café\n", "text/plain"),
    )
    .await;
    mount_page(
        &server,
        "/",
        html_page("Home", &["/private/report", "/public", "/café/menu"]),
    )
    .await;
    mount_page(&server, "/public", html_page("Public", &[])).await;
    mount_page(&server, "/private/report", html_page("Secret", &[])).await;

    let result = crawl_site(&server.uri(), &test_config(50, 5), &test_user_agent())
        .await
        .unwrap();

    assert!(result.robots_txt_found);
    assert_eq!(result.robots_blocked.len(), 2);
    assert_eq!(result.robots_blocked[0], "/private");
    // Non-ASCII rules match the percent-encoded request path
    assert_eq!(result.stats.robots_skipped, 2);
    assert_eq!(result.pages.len(), 2);
    assert!(result.pages.iter().all(|p| !p.url.contains("/private")));
    assert!(result.pages.iter().all(|p| !p.url.contains("/caf")));
}

#[tokio::test]
async fn test_redirect_target_is_enqueued() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/old", "/offsite"])).await;
    mount_page(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", "/new"),
    )
    .await;
    mount_page(
        &server,
        "/offsite",
        ResponseTemplate::new(302).insert_header("location", "https://elsewhere.example/landing"),
    )
    .await;
    mount_page(&server, "/new", html_page("New", &[])).await;

    let result = crawl_site(&server.uri(), &test_config(50, 5), &test_user_agent())
        .await
        .unwrap();

    let old = result
        .pages
        .iter()
        .find(|p| p.url.ends_with("/old"))
        .unwrap();
    assert_eq!(old.status_code, 301);
    assert_eq!(old.redirect_target, Some(format!("{}/new", server.uri())));

    let new = result
        .pages
        .iter()
        .find(|p| p.url.ends_with("/new"))
        .unwrap();
    assert_eq!(new.status_code, 200);

    // External redirect targets are recorded but never fetched
    assert!(result.pages.iter().all(|p| !p.url.contains("elsewhere.example")));
    assert_eq!(result.stats.redirects, 2);
}

#[tokio::test]
async fn test_unreachable_root_stops_immediately() {
    // Bind then drop a listener to get a port nothing is listening on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let root = format!("http://127.0.0.1:{}/", port);

    let result = crawl_site(&root, &test_config(50, 5), &test_user_agent())
        .await
        .unwrap();

    assert_eq!(result.stats.stop_reason, StopReason::RootUnreachable);
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.pages[0].status_code, 0);
    assert!(result.pages[0].error.is_some());
    assert!(!result.has_crawl_data());
}

#[tokio::test]
async fn test_sitemap_still_found_when_root_times_out() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        r#"<urlset><url><loc>{base}/services</loc></url></urlset>"#
    );
    mount_page(
        &server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"),
    )
    .await;
    mount_page(
        &server,
        "/",
        html_page("Home", &[]).set_delay(Duration::from_millis(3_000)),
    )
    .await;

    let config = CrawlConfig {
        timeout_ms: 1_000,
        ..test_config(50, 5)
    };
    let result = crawl_site(&base, &config, &test_user_agent()).await.unwrap();

    assert_eq!(result.stats.stop_reason, StopReason::RootUnreachable);
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.pages[0].status_code, 0);
    assert!(result.pages[0].timed_out);
    assert_eq!(result.stats.timeouts, 1);
    assert!(result.sitemap_found);
    assert_eq!(result.sitemap_urls, vec![format!("{}/services", base)]);
}

#[tokio::test]
async fn test_sitemap_urls_seed_frontier() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/orphan</loc></url>
  <url><loc>https://other-site.example/page</loc></url>
</urlset>"#
    );
    mount_page(
        &server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"),
    )
    .await;
    mount_page(&server, "/", html_page("Home", &[])).await;
    mount_page(&server, "/orphan", html_page("Orphan", &[])).await;

    let result = crawl_site(&base, &test_config(50, 5), &test_user_agent())
        .await
        .unwrap();

    assert!(result.sitemap_found);
    assert_eq!(result.sitemap_urls, vec![format!("{}/orphan", base)]);
    assert_eq!(result.pages.len(), 2);
    assert!(result.pages.iter().any(|p| p.url.ends_with("/orphan")));
}

#[tokio::test]
async fn test_error_pages_are_recorded_not_followed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/missing", "/broken"])).await;
    mount_page(
        &server,
        "/missing",
        ResponseTemplate::new(404).set_body_raw(
            r#"<html><body><a href="/hidden">hidden</a></body></html>"#,
            "text/html",
        ),
    )
    .await;
    mount_page(&server, "/broken", ResponseTemplate::new(500)).await;

    let result = crawl_site(&server.uri(), &test_config(50, 5), &test_user_agent())
        .await
        .unwrap();

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.stats.client_errors, 1);
    assert_eq!(result.stats.server_errors, 1);
    assert!(result.pages.iter().all(|p| !p.url.ends_with("/hidden")));
}
