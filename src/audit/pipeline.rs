//! Audit pipeline: crawl, score, analyze, persist
//!
//! The pipeline drives one [`AuditRun`] through its checkpoints and saves a
//! snapshot after each step. Any error fails the run with a readable reason;
//! findings already written stay in place.

use super::state::{AuditRun, ProgressCheckpoint};
use crate::analysis::analyze;
use crate::config::{CrawlConfig, UserAgentConfig};
use crate::crawler::Crawler;
use crate::scoring::{score_audit, BusinessProfile, ScoreSource, ScoringOutcome, ScoringProvider};
use crate::storage::{Finding, FindingSource, Storage};
use crate::AuditError;

/// Everything needed to audit one site
#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub root_url: String,
    pub business: BusinessProfile,
    pub crawl: CrawlConfig,
    pub user_agent: UserAgentConfig,
    /// Hash of the configuration file, empty when running on defaults
    pub config_hash: String,
}

impl AuditRequest {
    /// A request with default crawl settings and no business profile URLs
    pub fn new(root_url: impl Into<String>) -> Self {
        let root_url = root_url.into();
        Self {
            business: BusinessProfile::new(root_url.clone()),
            root_url,
            crawl: CrawlConfig::default(),
            user_agent: UserAgentConfig::default(),
            config_hash: String::new(),
        }
    }
}

/// Runs audits against a storage backend and an optional AI scorer
pub struct AuditPipeline<S: Storage> {
    storage: S,
    provider: Option<Box<dyn ScoringProvider>>,
}

impl<S: Storage> AuditPipeline<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            provider: None,
        }
    }

    /// Attaches the external AI scorer
    pub fn with_provider(mut self, provider: Box<dyn ScoringProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs one audit to a terminal state
    ///
    /// # Returns
    ///
    /// * `Ok(AuditRun)` - The run, either COMPLETED or FAILED with a reason
    /// * `Err(AuditError)` - The run could not even be recorded
    pub async fn run(&mut self, request: AuditRequest) -> Result<AuditRun, AuditError> {
        let mut run = self
            .storage
            .create_run(&request.root_url, &request.config_hash)?;

        match self.execute(&mut run, &request).await {
            Ok(()) => Ok(run),
            Err(e) => {
                let reason = failure_reason(&e);
                tracing::warn!("Audit {} failed: {}", run.id, reason);
                run.fail(reason)?;
                self.storage.save_run(&run)?;
                Ok(run)
            }
        }
    }

    async fn execute(&mut self, run: &mut AuditRun, request: &AuditRequest) -> Result<(), AuditError> {
        run.start()?;
        self.storage.save_run(run)?;

        run.advance(ProgressCheckpoint::PreCrawl)?;
        self.storage.save_run(run)?;
        let crawler = Crawler::new(&request.root_url, &request.crawl, &request.user_agent)?;

        run.advance(ProgressCheckpoint::CrawlStarted)?;
        self.storage.save_run(run)?;
        let crawl = crawler.run().await;

        run.crawl_stats = Some(crawl.stats.clone());
        run.advance(ProgressCheckpoint::CrawlFinished)?;
        self.storage.save_run(run)?;

        let outcome = score_audit(self.provider.as_deref(), &crawl, &request.business).await;
        run.advance(ProgressCheckpoint::ScoringAttempted)?;
        self.storage.save_run(run)?;

        let (scores, source) = match outcome {
            ScoringOutcome::Scored { scores, findings } => {
                let findings: Vec<Finding> = findings
                    .iter()
                    .map(|f| Finding::from_ai(f, &crawl.root_url))
                    .collect();
                self.storage
                    .insert_findings(run.id, FindingSource::Ai, &findings)?;
                (scores, ScoreSource::Ai)
            }
            ScoringOutcome::Fallback { scores, reason } => {
                tracing::info!("Audit {} scored from crawl data ({})", run.id, reason);
                (scores, ScoreSource::Fallback)
            }
            ScoringOutcome::Unavailable { reason } => {
                return Err(AuditError::DataUnavailable(reason));
            }
        };
        run.advance(ProgressCheckpoint::AiFindingsSaved)?;
        self.storage.save_run(run)?;

        let issues = analyze(&crawl, &crawl.root_url);
        let findings: Vec<Finding> = issues.iter().map(Finding::from).collect();
        self.storage
            .insert_findings(run.id, FindingSource::Crawl, &findings)?;
        run.advance(ProgressCheckpoint::CrawlFindingsSaved)?;
        self.storage.save_run(run)?;

        run.complete(scores, source)?;
        self.storage.save_run(run)?;
        tracing::info!(
            "Audit {} completed: overall score {} ({} crawl findings)",
            run.id,
            run.scores.as_ref().map(|s| s.overall_score).unwrap_or_default(),
            findings.len()
        );
        Ok(())
    }
}

/// Turns a pipeline error into the reason shown to the user
fn failure_reason(error: &AuditError) -> String {
    match error {
        AuditError::Url(e) => format!("The website URL is not valid: {}", e),
        AuditError::DataUnavailable(reason) => format!(
            "No score could be produced: {}. Check that the website is online and reachable, then run the audit again.",
            reason
        ),
        other => format!("Audit failed: {}", other),
    }
}
