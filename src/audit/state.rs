//! Audit run status and progress tracking
//!
//! # State Transitions
//!
//! ```text
//! QUEUED -> RUNNING -> COMPLETED
//!    |         |
//!    +---------+-----> FAILED
//! ```
//!
//! Terminal states never change again. Progress only moves forward through
//! the checkpoints below until the run ends; failing resets it to 0.

use crate::crawler::CrawlStats;
use crate::scoring::{ScoreCard, ScoreSource};
use crate::AuditError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl AuditStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "QUEUED" => Some(Self::Queued),
            "RUNNING" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Checks if a transition to another status is valid
    pub fn can_transition_to(&self, next: AuditStatus) -> bool {
        use AuditStatus::*;
        matches!(
            (self, next),
            (Queued, Running) | (Queued, Failed) | (Running, Completed) | (Running, Failed)
        )
    }
}

/// Progress checkpoints reached while a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressCheckpoint {
    Created,
    Running,
    PreCrawl,
    CrawlStarted,
    CrawlFinished,
    ScoringAttempted,
    AiFindingsSaved,
    CrawlFindingsSaved,
    Completed,
}

impl ProgressCheckpoint {
    /// Percentage reported for this checkpoint
    pub fn percent(&self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Running => 10,
            Self::PreCrawl => 20,
            Self::CrawlStarted => 25,
            Self::CrawlFinished => 45,
            Self::ScoringAttempted => 70,
            Self::AiFindingsSaved => 80,
            Self::CrawlFindingsSaved => 90,
            Self::Completed => 100,
        }
    }
}

/// One audit of one website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRun {
    pub id: i64,
    pub root_url: String,
    pub status: AuditStatus,
    pub progress: u8,
    pub scores: Option<ScoreCard>,
    pub score_source: Option<ScoreSource>,
    pub crawl_stats: Option<CrawlStats>,
    /// Human-readable reason, set only when the run failed
    pub failure_reason: Option<String>,
    pub config_hash: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AuditRun {
    /// A freshly created, queued run
    pub fn new(id: i64, root_url: impl Into<String>, config_hash: impl Into<String>) -> Self {
        Self {
            id,
            root_url: root_url.into(),
            status: AuditStatus::Queued,
            progress: ProgressCheckpoint::Created.percent(),
            scores: None,
            score_source: None,
            crawl_stats: None,
            failure_reason: None,
            config_hash: config_hash.into(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    fn transition(&mut self, next: AuditStatus) -> Result<(), AuditError> {
        if !self.status.can_transition_to(next) {
            return Err(AuditError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::info!(
            "Audit {}: {} -> {}",
            self.id,
            self.status.to_db_string(),
            next.to_db_string()
        );
        self.status = next;
        Ok(())
    }

    /// QUEUED -> RUNNING
    pub fn start(&mut self) -> Result<(), AuditError> {
        self.transition(AuditStatus::Running)?;
        self.started_at = Some(Utc::now());
        self.progress = ProgressCheckpoint::Running.percent();
        Ok(())
    }

    /// Moves progress forward to a checkpoint of a running audit
    pub fn advance(&mut self, checkpoint: ProgressCheckpoint) -> Result<(), AuditError> {
        if self.status != AuditStatus::Running {
            return Err(AuditError::InvalidTransition {
                from: self.status,
                to: AuditStatus::Running,
            });
        }
        let next = checkpoint.percent();
        if next < self.progress {
            return Err(AuditError::ProgressRegression {
                from: self.progress,
                to: next,
            });
        }
        tracing::debug!("Audit {}: progress {} -> {}", self.id, self.progress, next);
        self.progress = next;
        Ok(())
    }

    /// RUNNING -> COMPLETED with the final scores
    pub fn complete(&mut self, scores: ScoreCard, source: ScoreSource) -> Result<(), AuditError> {
        self.transition(AuditStatus::Completed)?;
        self.progress = ProgressCheckpoint::Completed.percent();
        self.scores = Some(scores);
        self.score_source = Some(source);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Any non-terminal status -> FAILED; progress resets to 0
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), AuditError> {
        self.transition(AuditStatus::Failed)?;
        self.progress = 0;
        self.failure_reason = Some(reason.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }
}
