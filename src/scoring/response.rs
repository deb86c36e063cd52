//! AI scorer response contract
//!
//! The scorer answers with a JSON object:
//! `{overallScore, websiteScore, seoScore, socialScore, offerScore,
//! reputationScore, localScore, rootCauseSummary, findings[]}`.
//! Models like to wrap JSON in markdown fences or prose, so parsing looks
//! for the outermost object instead of requiring a clean body.

use super::ScoreCard;
use serde::{Deserialize, Serialize};

/// A finding proposed by the AI scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiFinding {
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_fixable")]
    pub fixable: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_severity() -> String {
    "MEDIUM".to_string()
}

fn default_fixable() -> bool {
    true
}

/// Parsed AI scorer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiScoreResponse {
    /// Missing overall scores are recomputed from the six categories
    #[serde(default)]
    pub overall_score: Option<f64>,
    pub website_score: f64,
    pub seo_score: f64,
    pub social_score: f64,
    pub offer_score: f64,
    pub reputation_score: f64,
    pub local_score: f64,
    #[serde(default)]
    pub root_cause_summary: String,
    #[serde(default)]
    pub findings: Vec<AiFinding>,
}

impl AiScoreResponse {
    fn category_scores(&self) -> [(&'static str, f64); 6] {
        [
            ("websiteScore", self.website_score),
            ("seoScore", self.seo_score),
            ("socialScore", self.social_score),
            ("offerScore", self.offer_score),
            ("reputationScore", self.reputation_score),
            ("localScore", self.local_score),
        ]
    }

    /// Checks that the response can be shown to a user
    ///
    /// Every score must be a finite number in 0..=100 and the root-cause
    /// summary must not be blank.
    pub fn validate(&self) -> Result<(), String> {
        let overall = self.overall_score.map(|s| ("overallScore", s));
        for (name, score) in self.category_scores().into_iter().chain(overall) {
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                return Err(format!("{} out of range: {}", name, score));
            }
        }
        if self.root_cause_summary.trim().is_empty() {
            return Err("rootCauseSummary is empty".to_string());
        }
        Ok(())
    }

    /// Splits a validated response into a score card and findings
    pub fn into_parts(self) -> (ScoreCard, Vec<AiFinding>) {
        let round = |s: f64| s.round().clamp(0.0, 100.0) as u8;
        let six = [
            round(self.website_score),
            round(self.seo_score),
            round(self.social_score),
            round(self.offer_score),
            round(self.reputation_score),
            round(self.local_score),
        ];
        let overall = match self.overall_score {
            Some(s) => round(s),
            None => ScoreCard::mean_of(six),
        };

        let card = ScoreCard {
            overall_score: overall,
            website_score: six[0],
            seo_score: six[1],
            social_score: six[2],
            offer_score: six[3],
            reputation_score: six[4],
            local_score: six[5],
            root_cause_summary: self.root_cause_summary.trim().to_string(),
        };
        (card, self.findings)
    }
}

/// Parses the scorer's raw text into a response
///
/// Accepts a bare JSON object, a fenced code block, or an object embedded
/// in surrounding prose.
pub fn parse_ai_response(text: &str) -> Result<AiScoreResponse, serde_json::Error> {
    let trimmed = text.trim();
    if let Ok(parsed) = serde_json::from_str(trimmed) {
        return Ok(parsed);
    }

    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(candidate)
}
