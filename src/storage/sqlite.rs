//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::analysis::Severity;
use crate::audit::{AuditRun, AuditStatus};
use crate::crawler::CrawlStats;
use crate::scoring::{ScoreCard, ScoreSource};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{Finding, FindingRecord, FindingSource};
use crate::AuditError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, root_url, status, progress, overall_score, website_score, seo_score, \
     social_score, offer_score, reputation_score, local_score, score_source, root_cause_summary, \
     crawl_stats, failure_reason, config_hash, created_at, started_at, finished_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(AuditError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, used by tests and dry runs
    pub fn new_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Column values of one `audit_runs` row before validation
struct RawRun {
    id: i64,
    root_url: String,
    status: String,
    progress: i64,
    scores: [Option<i64>; 7],
    score_source: Option<String>,
    root_cause_summary: Option<String>,
    crawl_stats: Option<String>,
    failure_reason: Option<String>,
    config_hash: String,
    created_at: String,
    started_at: Option<String>,
    finished_at: Option<String>,
}

impl RawRun {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            root_url: row.get(1)?,
            status: row.get(2)?,
            progress: row.get(3)?,
            scores: [
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
            ],
            score_source: row.get(11)?,
            root_cause_summary: row.get(12)?,
            crawl_stats: row.get(13)?,
            failure_reason: row.get(14)?,
            config_hash: row.get(15)?,
            created_at: row.get(16)?,
            started_at: row.get(17)?,
            finished_at: row.get(18)?,
        })
    }

    fn into_run(self) -> StorageResult<AuditRun> {
        let status = AuditStatus::from_db_string(&self.status)
            .ok_or_else(|| StorageError::InvalidData(format!("unknown status '{}'", self.status)))?;

        let scores = match self.scores {
            [Some(overall), Some(website), Some(seo), Some(social), Some(offer), Some(reputation), Some(local)] => {
                Some(ScoreCard {
                    overall_score: score_u8(overall)?,
                    website_score: score_u8(website)?,
                    seo_score: score_u8(seo)?,
                    social_score: score_u8(social)?,
                    offer_score: score_u8(offer)?,
                    reputation_score: score_u8(reputation)?,
                    local_score: score_u8(local)?,
                    root_cause_summary: self.root_cause_summary.unwrap_or_default(),
                })
            }
            _ => None,
        };

        let score_source = match self.score_source.as_deref() {
            Some(s) => Some(
                ScoreSource::from_db_string(s)
                    .ok_or_else(|| StorageError::InvalidData(format!("unknown score source '{}'", s)))?,
            ),
            None => None,
        };

        let crawl_stats = match self.crawl_stats.as_deref() {
            Some(json) => Some(serde_json::from_str::<CrawlStats>(json)?),
            None => None,
        };

        Ok(AuditRun {
            id: self.id,
            root_url: self.root_url,
            status,
            progress: score_u8(self.progress)?,
            scores,
            score_source,
            crawl_stats,
            failure_reason: self.failure_reason,
            config_hash: self.config_hash,
            created_at: parse_timestamp(&self.created_at)?,
            started_at: self.started_at.as_deref().map(parse_timestamp).transpose()?,
            finished_at: self.finished_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn score_u8(value: i64) -> StorageResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| StorageError::InvalidData(format!("value {} outside 0..=100", value)))
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("bad timestamp '{}': {}", value, e)))
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, root_url: &str, config_hash: &str) -> StorageResult<AuditRun> {
        let mut run = AuditRun::new(0, root_url, config_hash);
        self.conn.execute(
            "INSERT INTO audit_runs (root_url, status, progress, config_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.root_url,
                run.status.to_db_string(),
                run.progress,
                run.config_hash,
                run.created_at.to_rfc3339()
            ],
        )?;
        run.id = self.conn.last_insert_rowid();
        tracing::debug!("Created audit run {} for {}", run.id, root_url);
        Ok(run)
    }

    fn save_run(&mut self, run: &AuditRun) -> StorageResult<()> {
        let crawl_stats = run
            .crawl_stats
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let scores = run.scores.as_ref();

        let updated = self.conn.execute(
            "UPDATE audit_runs SET
                status = ?1, progress = ?2,
                overall_score = ?3, website_score = ?4, seo_score = ?5, social_score = ?6,
                offer_score = ?7, reputation_score = ?8, local_score = ?9,
                score_source = ?10, root_cause_summary = ?11, crawl_stats = ?12,
                failure_reason = ?13, started_at = ?14, finished_at = ?15
             WHERE id = ?16",
            params![
                run.status.to_db_string(),
                run.progress,
                scores.map(|s| s.overall_score),
                scores.map(|s| s.website_score),
                scores.map(|s| s.seo_score),
                scores.map(|s| s.social_score),
                scores.map(|s| s.offer_score),
                scores.map(|s| s.reputation_score),
                scores.map(|s| s.local_score),
                run.score_source.map(|s| s.to_db_string()),
                scores.map(|s| s.root_cause_summary.as_str()),
                crawl_stats,
                run.failure_reason,
                run.started_at.map(|t| t.to_rfc3339()),
                run.finished_at.map(|t| t.to_rfc3339()),
                run.id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run.id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<AuditRun> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {} FROM audit_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                RawRun::from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;
        raw.into_run()
    }

    fn latest_runs(&self, limit: usize) -> StorageResult<Vec<AuditRun>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM audit_runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;

        let raws = stmt
            .query_map(params![limit as i64], RawRun::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(RawRun::into_run).collect()
    }

    // ===== Findings =====

    fn insert_findings(
        &mut self,
        run_id: i64,
        source: FindingSource,
        findings: &[Finding],
    ) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let start: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM findings WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO findings
                    (run_id, source, category, title, detail, severity, fixable, url, evidence, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for (offset, finding) in findings.iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    source.to_db_string(),
                    finding.category,
                    finding.title,
                    finding.detail,
                    finding.severity.to_db_string(),
                    finding.fixable,
                    finding.url,
                    finding.evidence,
                    start + offset as i64
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            "Stored {} {} finding(s) for run {}",
            findings.len(),
            source.to_db_string(),
            run_id
        );
        Ok(findings.len())
    }

    fn get_findings(&self, run_id: i64) -> StorageResult<Vec<FindingRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, source, category, title, detail, severity, fixable, url, evidence, position
             FROM findings WHERE run_id = ?1 ORDER BY position",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(6)?,
                    Finding {
                        category: row.get(3)?,
                        title: row.get(4)?,
                        detail: row.get(5)?,
                        severity: Severity::Info,
                        fixable: row.get(7)?,
                        url: row.get(8)?,
                        evidence: row.get(9)?,
                    },
                    row.get::<_, i64>(10)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, run_id, source, severity, mut finding, position)| {
                finding.severity = Severity::from_db_string(&severity).ok_or_else(|| {
                    StorageError::InvalidData(format!("unknown severity '{}'", severity))
                })?;
                let source = FindingSource::from_db_string(&source).ok_or_else(|| {
                    StorageError::InvalidData(format!("unknown finding source '{}'", source))
                })?;
                Ok(FindingRecord {
                    id,
                    run_id,
                    source,
                    position,
                    finding,
                })
            })
            .collect()
    }

    fn count_findings(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM findings WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
