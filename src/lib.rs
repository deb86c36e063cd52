//! Site-Audit: crawl a business website and diagnose its marketing/SEO health
//!
//! This crate implements the diagnostic pipeline behind a site audit: a polite,
//! resource-bounded crawler, a per-page signal extractor, an evidence-backed
//! issue analyzer, and a deterministic scoring fallback used whenever the
//! external AI scorer cannot produce a usable result.

pub mod analysis;
pub mod audit;
pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod scoring;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: audit::AuditStatus,
        to: audit::AuditStatus,
    },

    #[error("Progress cannot move backwards: {from} -> {to}")]
    ProgressRegression { from: u8, to: u8 },

    #[error("No usable data: {0}")]
    DataUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Site-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analysis::{analyze, IssueCategory, SeoIssue, Severity};
pub use audit::{AuditPipeline, AuditRequest, AuditRun, AuditStatus};
pub use config::{Config, CrawlConfig};
pub use crawler::{crawl_site, CrawlResult, CrawledPage};
pub use scoring::{BusinessProfile, ScoreCard, ScoringOutcome};
pub use url::{extract_host, normalize_url};
