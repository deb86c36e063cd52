//! Scoring: external AI scorer with a deterministic crawl-based fallback
//!
//! The audit tries the AI provider first. When the provider is missing,
//! fails, or returns something unusable, scores are computed from crawl data
//! instead. When there is no crawl data either, the outcome is
//! [`ScoringOutcome::Unavailable`] and no score is produced at all.

mod fallback;
mod provider;
mod response;
mod summary;

pub use fallback::{fallback_scores, FALLBACK_DISCLOSURE};
pub use provider::{ChatCompletionScorer, ProviderError, ScoringProvider, ScoringRequest};
pub use response::{parse_ai_response, AiFinding, AiScoreResponse};
pub use summary::{build_crawl_summary, MAX_SUMMARY_CHARS, MAX_SUMMARY_PAGES};

use crate::crawler::CrawlResult;
use serde::{Deserialize, Serialize};

/// Where a run's scores came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Ai,
    Fallback,
}

impl ScoreSource {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            ScoreSource::Ai => "ai",
            ScoreSource::Fallback => "fallback",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "ai" => Some(ScoreSource::Ai),
            "fallback" => Some(ScoreSource::Fallback),
            _ => None,
        }
    }
}

/// The six category scores, their mean, and the root-cause summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub overall_score: u8,
    pub website_score: u8,
    pub seo_score: u8,
    pub social_score: u8,
    pub offer_score: u8,
    pub reputation_score: u8,
    pub local_score: u8,
    pub root_cause_summary: String,
}

impl ScoreCard {
    /// Unweighted mean of the six category scores, rounded
    pub fn mean_of(scores: [u8; 6]) -> u8 {
        let total: u32 = scores.iter().map(|&s| s as u32).sum();
        (total as f64 / 6.0).round() as u8
    }
}

/// The business behind the site; only URL presence feeds the fallback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: Option<String>,
    pub website_url: String,
    pub social_profile_urls: Vec<String>,
    pub google_business_url: Option<String>,
    pub review_profile_urls: Vec<String>,
}

impl BusinessProfile {
    pub fn new(website_url: impl Into<String>) -> Self {
        Self {
            website_url: website_url.into(),
            ..Default::default()
        }
    }
}

/// Result of the try-AI-then-fallback decision
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringOutcome {
    /// The AI provider returned usable scores
    Scored {
        scores: ScoreCard,
        findings: Vec<AiFinding>,
    },
    /// Scores computed from crawl data; `reason` says why AI was not used
    Fallback { scores: ScoreCard, reason: String },
    /// Neither source produced anything
    Unavailable { reason: String },
}

/// Scores an audit: AI first, then the crawl-based fallback
///
/// Provider errors never propagate; they become the fallback reason.
pub async fn score_audit(
    provider: Option<&dyn ScoringProvider>,
    crawl: &CrawlResult,
    business: &BusinessProfile,
) -> ScoringOutcome {
    let reason = match provider {
        Some(provider) => {
            let request = ScoringRequest {
                root_url: crawl.root_url.clone(),
                business: business.clone(),
                crawl_summary: build_crawl_summary(crawl),
            };
            match provider.score(&request).await {
                Ok(response) => match response.validate() {
                    Ok(()) => {
                        tracing::info!("AI scoring succeeded ({} findings)", response.findings.len());
                        let (scores, findings) = response.into_parts();
                        return ScoringOutcome::Scored { scores, findings };
                    }
                    Err(problem) => {
                        tracing::warn!("AI response unusable: {}", problem);
                        format!("AI response unusable: {}", problem)
                    }
                },
                Err(e) => {
                    tracing::warn!("AI scoring failed: {}", e);
                    format!("AI scoring failed: {}", e)
                }
            }
        }
        None => "AI scoring is not configured".to_string(),
    };

    if crawl.has_crawl_data() {
        tracing::info!("Using crawl-based fallback scoring");
        ScoringOutcome::Fallback {
            scores: fallback_scores(crawl, business),
            reason,
        }
    } else {
        ScoringOutcome::Unavailable {
            reason: format!("{}; the crawl returned no usable pages", reason),
        }
    }
}
