use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Site-Audit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

/// Crawl budget for a single audit invocation
///
/// Immutable once the crawl starts. Every field can be overridden
/// individually; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of pages recorded in the crawl result
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Number of pages fetched in parallel per batch
    pub concurrency: usize,

    /// Politeness pause between batches (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Hard timeout for a single request (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Wall-clock budget for the whole crawl (milliseconds)
    #[serde(rename = "total-timeout-ms")]
    pub total_timeout_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 200,
            concurrency: 5,
            delay_ms: 300,
            timeout_ms: 8_000,
            total_timeout_ms: 300_000,
        }
    }
}

impl CrawlConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }

    /// Upper bound on the visited set, so a link-heavy site cannot grow it forever
    pub fn visited_cap(&self) -> usize {
        self.max_pages.saturating_mul(3)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also used as the robots.txt token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteAuditBot".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/site-audit-bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown report file
    #[serde(rename = "report-path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./site-audit.db".to_string(),
            report_path: "./audit-report.md".to_string(),
        }
    }
}

/// External AI scorer settings as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Stored API key; takes precedence over the environment
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    /// Environment variable consulted when no key is stored
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(rename = "timeout-ms", default = "default_scoring_timeout")]
    pub timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_scoring_timeout(),
        }
    }
}

/// Scorer settings after the key overlay has been resolved
///
/// Built once per pipeline invocation and passed by value; the crawl and
/// analysis code never read configuration on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScoring {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ScoringConfig {
    /// Resolves the API key from the stored value, then the environment
    ///
    /// Returns `None` when neither source yields a non-empty key.
    pub fn resolve(&self) -> Option<ResolvedScoring> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve`](Self::resolve) with an injectable environment lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Option<ResolvedScoring>
    where
        F: Fn(&str) -> Option<String>,
    {
        let stored = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let api_key = stored.or_else(|| {
            lookup(&self.api_key_env)
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })?;

        Some(ResolvedScoring {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_scoring_timeout() -> u64 {
    60_000
}
