//! AI scoring provider seam
//!
//! The audit only depends on [`ScoringProvider`]. [`ChatCompletionScorer`]
//! talks to any OpenAI-compatible chat-completions endpoint.

use super::response::{parse_ai_response, AiScoreResponse};
use super::BusinessProfile;
use crate::config::ResolvedScoring;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failures of the external scorer; all of them trigger fallback scoring
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("AI scoring is not configured")]
    NotConfigured,

    #[error("AI provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("AI provider returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("AI provider timed out")]
    Timeout,
}

/// Everything the scorer is told about an audit
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub root_url: String,
    pub business: BusinessProfile,
    /// Output of [`build_crawl_summary`](super::build_crawl_summary)
    pub crawl_summary: String,
}

/// An external scorer
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<AiScoreResponse, ProviderError>;
}

const SYSTEM_PROMPT: &str = "You are a marketing and SEO auditor for small businesses. \
Score the business from 0 to 100 in six categories using the crawl data provided. \
Respond with a single JSON object and nothing else, with the keys: \
overallScore, websiteScore, seoScore, socialScore, offerScore, reputationScore, localScore, \
rootCauseSummary (two or three sentences naming the main root causes), and findings \
(an array of objects with title, detail, category, severity (CRITICAL, HIGH, MEDIUM, LOW or INFO), \
fixable, url and evidence). Only cite evidence that appears in the crawl data.";

/// Scorer backed by an OpenAI-compatible chat-completions API
pub struct ChatCompletionScorer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl ChatCompletionScorer {
    /// Builds a scorer from the resolved scoring overlay
    pub fn new(settings: &ResolvedScoring) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout,
        })
    }

    fn user_prompt(request: &ScoringRequest) -> String {
        let business = &request.business;
        let list = |urls: &[String]| {
            if urls.is_empty() {
                "none".to_string()
            } else {
                urls.join(", ")
            }
        };
        format!(
            "Business: {}\nWebsite: {}\nSocial profiles: {}\nGoogle Business profile: {}\nReview profiles: {}\n\nCrawl data:\n{}",
            business.name.as_deref().unwrap_or("(unnamed)"),
            request.root_url,
            list(&business.social_profile_urls),
            business.google_business_url.as_deref().unwrap_or("none"),
            list(&business.review_profile_urls),
            request.crawl_summary
        )
    }

    async fn complete(&self, request: &ScoringRequest) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::user_prompt(request) },
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or(raw);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ProviderError::InvalidResponse(format!("body is not JSON: {}", e)))?;
        extract_message_content(&value)
    }
}

#[async_trait]
impl ScoringProvider for ChatCompletionScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<AiScoreResponse, ProviderError> {
        tracing::info!("Requesting AI scores from {} ({})", self.endpoint, self.model);
        let content = tokio::time::timeout(self.timeout, self.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout)??;

        parse_ai_response(&content)
            .map_err(|e| ProviderError::InvalidResponse(format!("scores are not valid JSON: {}", e)))
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_message_content(value: &serde_json::Value) -> Result<String, ProviderError> {
    let content = value
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .ok_or_else(|| ProviderError::InvalidResponse("missing choices[0].message.content".to_string()))?;

    if content.trim().is_empty() {
        return Err(ProviderError::InvalidResponse("message content is empty".to_string()));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(endpoint: String) -> ResolvedScoring {
        ResolvedScoring {
            endpoint,
            model: "test-model".to_string(),
            api_key: "sk-test".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> ScoringRequest {
        ScoringRequest {
            root_url: "https://example.com/".to_string(),
            business: BusinessProfile::new("https://example.com/"),
            crawl_summary: "Pages crawled: 1".to_string(),
        }
    }

    #[test]
    fn test_parse_error_message() {
        let raw = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
        assert_eq!(parse_error_message(raw), Some("Invalid API key".to_string()));
        assert_eq!(parse_error_message("not json"), None);
    }

    #[test]
    fn test_extract_message_content() {
        let value = serde_json::json!({"choices":[{"message":{"role":"assistant","content":"{}"}}]});
        assert_eq!(extract_message_content(&value).unwrap(), "{}");

        let empty = serde_json::json!({"choices":[]});
        assert!(matches!(
            extract_message_content(&empty),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_scores_from_chat_completion() {
        let server = MockServer::start().await;
        let content = r#"{"overallScore":50,"websiteScore":50,"seoScore":50,"socialScore":50,"offerScore":50,"reputationScore":50,"localScore":50,"rootCauseSummary":"ok","findings":[]}"#;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            })))
            .mount(&server)
            .await;

        let scorer =
            ChatCompletionScorer::new(&settings(format!("{}/v1/chat/completions", server.uri()))).unwrap();
        let response = scorer.score(&request()).await.unwrap();
        assert_eq!(response.seo_score, 50.0);
    }

    #[tokio::test]
    async fn test_status_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"error":{"message":"Incorrect API key provided"}}"#),
            )
            .mount(&server)
            .await;

        let scorer = ChatCompletionScorer::new(&settings(server.uri())).unwrap();
        match scorer.score(&request()).await {
            Err(ProviderError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
