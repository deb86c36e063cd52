//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::audit::AuditRun;
use crate::storage::{Finding, FindingRecord, FindingSource};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Runs are saved as whole snapshots: the pipeline mutates an [`AuditRun`]
/// in memory and calls [`save_run`](Storage::save_run) after every step.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new queued run
    ///
    /// # Arguments
    ///
    /// * `root_url` - The site being audited
    /// * `config_hash` - Hash of the configuration file (empty for defaults)
    ///
    /// # Returns
    ///
    /// The new run, with its database ID assigned
    fn create_run(&mut self, root_url: &str, config_hash: &str) -> StorageResult<AuditRun>;

    /// Overwrites the stored snapshot of an existing run
    fn save_run(&mut self, run: &AuditRun) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<AuditRun>;

    /// Gets the most recent runs, newest first
    fn latest_runs(&self, limit: usize) -> StorageResult<Vec<AuditRun>>;

    // ===== Findings =====

    /// Appends findings to a run, continuing its position sequence
    ///
    /// # Returns
    ///
    /// The number of rows inserted
    fn insert_findings(
        &mut self,
        run_id: i64,
        source: FindingSource,
        findings: &[Finding],
    ) -> StorageResult<usize>;

    /// Gets all findings of a run in insertion order
    fn get_findings(&self, run_id: i64) -> StorageResult<Vec<FindingRecord>>;

    fn count_findings(&self, run_id: i64) -> StorageResult<u64>;
}
