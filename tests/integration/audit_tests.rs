//! Integration tests for the audit pipeline
//!
//! A wiremock server plays the audited website and, where needed, the AI
//! scoring endpoint. Runs are persisted to an in-memory SQLite database.

use site_audit::config::{CrawlConfig, ResolvedScoring};
use site_audit::scoring::{ChatCompletionScorer, ScoreSource, FALLBACK_DISCLOSURE};
use site_audit::storage::{FindingSource, SqliteStorage, Storage};
use site_audit::{AuditPipeline, AuditRequest, AuditStatus};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE_PAGES: usize = 40;

fn fast_crawl() -> CrawlConfig {
    CrawlConfig {
        max_pages: 50,
        concurrency: 5,
        delay_ms: 0,
        timeout_ms: 2_000,
        total_timeout_ms: 20_000,
    }
}

fn scorer(endpoint: String) -> Box<ChatCompletionScorer> {
    let settings = ResolvedScoring {
        endpoint,
        model: "test-model".to_string(),
        api_key: "sk-test".to_string(),
        timeout: Duration::from_secs(5),
    };
    Box::new(ChatCompletionScorer::new(&settings).unwrap())
}

/// Mounts a 40-page site: a home page linking to 39 article pages
async fn mount_site(server: &MockServer) {
    let links: String = (1..SITE_PAGES)
        .map(|i| format!(r#"<a href="/article-{}">Article {}</a>"#, i, i))
        .collect();
    let home = format!(
        r#"<html><head><title>Acme Plumbing</title>
        <meta name="description" content="Emergency plumbing in Springfield."></head>
        <body><h1>Acme Plumbing</h1><p>We fix pipes.</p>{}</body></html>"#,
        links
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(home, "text/html"))
        .mount(server)
        .await;

    for i in 1..SITE_PAGES {
        // Every article lacks a meta description; odd ones also lack a title
        let title = if i % 2 == 0 {
            format!("<title>Article {}</title>", i)
        } else {
            String::new()
        };
        let body = format!(
            "<html><head>{}</head><body><h1>Article {}</h1><p>{}</p></body></html>",
            title,
            i,
            "word ".repeat(50)
        );
        Mock::given(method("GET"))
            .and(path(format!("/article-{}", i)))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
            .mount(server)
            .await;
    }
}

fn chat_completion(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content.to_string() }
        }]
    }))
}

#[tokio::test]
async fn test_ai_failure_falls_back_to_crawl_scores() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let ai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"error": {"message": "upstream overloaded"}})),
        )
        .mount(&ai)
        .await;

    let mut pipeline = AuditPipeline::new(SqliteStorage::new_in_memory().unwrap())
        .with_provider(scorer(format!("{}/v1/chat/completions", ai.uri())));

    let mut request = AuditRequest::new(site.uri());
    request.crawl = fast_crawl();
    let run = pipeline.run(request).await.unwrap();

    assert_eq!(run.status, AuditStatus::Completed);
    assert_eq!(run.progress, 100);
    assert_eq!(run.score_source, Some(ScoreSource::Fallback));

    let scores = run.scores.as_ref().unwrap();
    assert!(scores.root_cause_summary.starts_with(FALLBACK_DISCLOSURE));
    assert!(scores.overall_score <= 100);

    let stats = run.crawl_stats.as_ref().unwrap();
    assert_eq!(stats.pages_crawled, SITE_PAGES);

    // Crawl findings are persisted; no AI findings exist
    let findings = pipeline.storage().get_findings(run.id).unwrap();
    assert!(!findings.is_empty());
    assert!(findings.iter().all(|f| f.source == FindingSource::Crawl));
    assert!(findings
        .iter()
        .any(|f| f.finding.title == "Missing page title"));

    // The stored snapshot matches what the pipeline returned
    let stored = pipeline.storage().get_run(run.id).unwrap();
    assert_eq!(stored.status, AuditStatus::Completed);
    assert_eq!(stored.scores, run.scores);
}

#[tokio::test]
async fn test_fallback_scores_are_deterministic() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let mut pipeline = AuditPipeline::new(SqliteStorage::new_in_memory().unwrap());

    let mut first = AuditRequest::new(site.uri());
    first.crawl = fast_crawl();
    let second = first.clone();

    let a = pipeline.run(first).await.unwrap();
    let b = pipeline.run(second).await.unwrap();

    assert_ne!(a.id, b.id);
    let (a, b) = (a.scores.unwrap(), b.scores.unwrap());
    // The summary quotes measured response times, so only the numbers are compared
    assert_eq!(a.overall_score, b.overall_score);
    assert_eq!(a.website_score, b.website_score);
    assert_eq!(a.seo_score, b.seo_score);
    assert_eq!(a.local_score, b.local_score);
}

#[tokio::test]
async fn test_ai_failure_without_crawl_data_fails_run() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let ai = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({"error": {"message": "Invalid API key"}}),
        ))
        .mount(&ai)
        .await;

    let mut pipeline = AuditPipeline::new(SqliteStorage::new_in_memory().unwrap())
        .with_provider(scorer(format!("{}/v1/chat/completions", ai.uri())));

    let mut request = AuditRequest::new(format!("http://127.0.0.1:{}/", port));
    request.crawl = fast_crawl();
    let run = pipeline.run(request).await.unwrap();

    assert_eq!(run.status, AuditStatus::Failed);
    assert_eq!(run.progress, 0);
    assert!(run.scores.is_none());
    let reason = run.failure_reason.as_deref().unwrap();
    assert!(!reason.is_empty());
    assert!(reason.contains("Invalid API key"));

    let stored = pipeline.storage().get_run(run.id).unwrap();
    assert_eq!(stored.status, AuditStatus::Failed);
    assert_eq!(pipeline.storage().count_findings(run.id).unwrap(), 0);
}

#[tokio::test]
async fn test_ai_scores_and_findings_are_stored() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let ai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_completion(serde_json::json!({
            "overallScore": 61,
            "websiteScore": 72,
            "seoScore": 55,
            "socialScore": 40,
            "offerScore": 66,
            "reputationScore": 58,
            "localScore": 70,
            "rootCauseSummary": "Half of the articles have no title, which hides them from search.",
            "findings": [
                {
                    "title": "No clear call to action",
                    "detail": "Visitors are not told how to book a plumber.",
                    "category": "offer",
                    "severity": "HIGH",
                    "evidence": "Home page has no booking link"
                }
            ]
        })))
        .mount(&ai)
        .await;

    let mut pipeline = AuditPipeline::new(SqliteStorage::new_in_memory().unwrap())
        .with_provider(scorer(format!("{}/v1/chat/completions", ai.uri())));

    let mut request = AuditRequest::new(site.uri());
    request.crawl = fast_crawl();
    let run = pipeline.run(request).await.unwrap();

    assert_eq!(run.status, AuditStatus::Completed);
    assert_eq!(run.score_source, Some(ScoreSource::Ai));
    let scores = run.scores.as_ref().unwrap();
    assert_eq!(scores.overall_score, 61);
    assert_eq!(scores.seo_score, 55);

    let findings = pipeline.storage().get_findings(run.id).unwrap();
    let ai_findings: Vec<_> = findings
        .iter()
        .filter(|f| f.source == FindingSource::Ai)
        .collect();
    assert_eq!(ai_findings.len(), 1);
    assert_eq!(ai_findings[0].finding.title, "No clear call to action");
    // AI findings without a URL point at the root
    assert_eq!(ai_findings[0].finding.url, format!("{}/", site.uri()));

    // AI findings are stored before crawl findings
    assert_eq!(findings[0].source, FindingSource::Ai);
    assert!(findings.iter().any(|f| f.source == FindingSource::Crawl));
}
