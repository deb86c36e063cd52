//! Output module for audit reports
//!
//! This module handles:
//! - Loading a stored run together with its findings
//! - Rendering markdown reports
//! - JSON export and the run history listing

mod markdown;

pub use markdown::{format_markdown_report, write_markdown_report};

use crate::audit::AuditRun;
use crate::storage::{FindingRecord, Storage, StorageError};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A run and its findings, as exported
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub run: AuditRun,
    pub findings: Vec<FindingRecord>,
}

/// Loads a run and its findings from storage
pub fn load_report(storage: &dyn Storage, run_id: i64) -> OutputResult<AuditReport> {
    let run = storage.get_run(run_id)?;
    let findings = storage.get_findings(run_id)?;
    Ok(AuditReport { run, findings })
}

/// Serializes a report as pretty-printed JSON
pub fn format_json_report(report: &AuditReport) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// One line per run: id, status, overall score, URL, creation time
pub fn format_history(runs: &[AuditRun]) -> String {
    if runs.is_empty() {
        return "No audits recorded yet.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:>5}  {:<10} {:>7}  {:<40} {}\n",
        "ID", "STATUS", "SCORE", "URL", "CREATED"
    ));
    for run in runs {
        let score = run
            .scores
            .as_ref()
            .map(|s| s.overall_score.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>5}  {:<10} {:>7}  {:<40} {}\n",
            run.id,
            run.status.to_db_string(),
            score,
            run.root_url,
            run.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Finding, FindingSource, SqliteStorage};
    use crate::Severity;

    #[test]
    fn test_load_and_export_report() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run = storage.create_run("https://example.com/", "").unwrap();
        storage
            .insert_findings(
                run.id,
                FindingSource::Crawl,
                &[Finding {
                    category: "technical".to_string(),
                    title: "Broken page".to_string(),
                    detail: String::new(),
                    severity: Severity::Critical,
                    fixable: true,
                    url: "https://example.com/gone".to_string(),
                    evidence: "HTTP 404 returned for https://example.com/gone".to_string(),
                }],
            )
            .unwrap();

        let report = load_report(&storage, run.id).unwrap();
        assert_eq!(report.findings.len(), 1);

        let json = format_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["run"]["status"], "QUEUED");
        assert_eq!(value["findings"][0]["severity"], "CRITICAL");
        assert_eq!(value["findings"][0]["source"], "crawl");
    }

    #[test]
    fn test_history_listing() {
        assert_eq!(format_history(&[]), "No audits recorded yet.\n");

        let run = AuditRun::new(12, "https://example.com/", "");
        let listing = format_history(&[run]);
        assert!(listing.contains("QUEUED"));
        assert!(listing.contains("https://example.com/"));
        assert!(listing.lines().nth(1).unwrap().trim_start().starts_with("12"));
    }
}
