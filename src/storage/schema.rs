//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Site-Audit database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per audit; re-running an audit inserts a new row
CREATE TABLE IF NOT EXISTS audit_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    root_url TEXT NOT NULL,
    status TEXT NOT NULL,
    progress INTEGER NOT NULL DEFAULT 0,
    overall_score INTEGER,
    website_score INTEGER,
    seo_score INTEGER,
    social_score INTEGER,
    offer_score INTEGER,
    reputation_score INTEGER,
    local_score INTEGER,
    score_source TEXT,
    root_cause_summary TEXT,
    crawl_stats TEXT,
    failure_reason TEXT,
    config_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    started_at TEXT,
    finished_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_audit_runs_created ON audit_runs(created_at);

-- Evidence-backed findings attached to a run
CREATE TABLE IF NOT EXISTS findings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES audit_runs(id),
    source TEXT NOT NULL,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    detail TEXT NOT NULL,
    severity TEXT NOT NULL,
    fixable INTEGER NOT NULL,
    url TEXT NOT NULL,
    evidence TEXT NOT NULL,
    position INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_findings_run ON findings(run_id);
CREATE INDEX IF NOT EXISTS idx_findings_severity ON findings(severity);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
