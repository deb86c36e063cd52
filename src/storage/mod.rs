//! Storage module for persisting audit runs and findings
//!
//! This module handles all database operations for the audit pipeline:
//! - SQLite database initialization and schema management
//! - Audit run snapshots (status, progress, scores, crawl statistics)
//! - Finding rows from both the crawl analyzer and the AI scorer
//!
//! Crawl pages themselves are never stored; only statistics and findings
//! outlive a run.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::analysis::{SeoIssue, Severity};
use crate::scoring::AiFinding;
use serde::Serialize;

/// Which producer a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    Crawl,
    Ai,
}

impl FindingSource {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Ai => "ai",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "crawl" => Some(Self::Crawl),
            "ai" => Some(Self::Ai),
            _ => None,
        }
    }
}

/// A finding ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub category: String,
    pub title: String,
    pub detail: String,
    pub severity: Severity,
    pub fixable: bool,
    pub url: String,
    pub evidence: String,
}

impl From<&SeoIssue> for Finding {
    fn from(issue: &SeoIssue) -> Self {
        Self {
            category: issue.category.to_db_string().to_string(),
            title: issue.title.clone(),
            detail: issue.detail.clone(),
            severity: issue.severity,
            fixable: issue.fixable,
            url: issue.url.clone(),
            evidence: issue.evidence.clone(),
        }
    }
}

impl Finding {
    /// Converts an AI finding; unknown severities become MEDIUM and a
    /// missing URL falls back to the audited site
    pub fn from_ai(finding: &AiFinding, root_url: &str) -> Self {
        Self {
            category: finding.category.trim().to_lowercase(),
            title: finding.title.clone(),
            detail: finding.detail.clone(),
            severity: Severity::from_db_string(&finding.severity).unwrap_or(Severity::Medium),
            fixable: finding.fixable,
            url: finding
                .url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| root_url.to_string()),
            evidence: finding.evidence.clone().unwrap_or_default(),
        }
    }
}

/// A finding as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingRecord {
    pub id: i64,
    pub run_id: i64,
    pub source: FindingSource,
    /// Insertion order within the run
    pub position: i64,
    #[serde(flatten)]
    pub finding: Finding,
}
