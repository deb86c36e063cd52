//! Markdown report generation
//!
//! This module renders a finished audit as a human-readable markdown report:
//! scorecard, root-cause summary, crawl statistics, and every finding grouped
//! by severity.

use crate::analysis::Severity;
use crate::audit::{AuditRun, AuditStatus};
use crate::output::OutputResult;
use crate::scoring::ScoreSource;
use crate::storage::{FindingRecord, FindingSource};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for a run
///
/// # Arguments
///
/// * `run` - The audit run
/// * `findings` - The run's stored findings
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(
    run: &AuditRun,
    findings: &[FindingRecord],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(run, findings);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Escapes characters that would break a markdown table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Formats an audit run and its findings as markdown
pub fn format_markdown_report(run: &AuditRun, findings: &[FindingRecord]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Site Audit: {}\n\n", run.root_url));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", run.id));
    md.push_str(&format!("- **Status**: {}\n", run.status.to_db_string()));
    md.push_str(&format!("- **Created**: {}\n", run.created_at.to_rfc3339()));
    if let Some(finished) = run.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
        if let Some(started) = run.started_at {
            md.push_str(&format!(
                "- **Duration**: {} seconds\n",
                (finished - started).num_seconds()
            ));
        }
    }
    if !run.config_hash.is_empty() {
        md.push_str(&format!("- **Config Hash**: {}\n", run.config_hash));
    }
    md.push('\n');

    if run.status == AuditStatus::Failed {
        md.push_str("## Audit Failed\n\n");
        md.push_str(run.failure_reason.as_deref().unwrap_or("Unknown error"));
        md.push_str("\n\n");
    }

    // Scorecard
    if let Some(scores) = &run.scores {
        md.push_str("## Scorecard\n\n");
        if run.score_source == Some(ScoreSource::Fallback) {
            md.push_str(
                "> Scores were computed from crawl data because AI analysis was unavailable. \
                 Social, offer, reputation and local scores are low-confidence estimates.\n\n",
            );
        }
        md.push_str("| Category | Score |\n");
        md.push_str("|----------|-------|\n");
        md.push_str(&format!("| **Overall** | **{}** |\n", scores.overall_score));
        md.push_str(&format!("| Website | {} |\n", scores.website_score));
        md.push_str(&format!("| SEO | {} |\n", scores.seo_score));
        md.push_str(&format!("| Social | {} |\n", scores.social_score));
        md.push_str(&format!("| Offer | {} |\n", scores.offer_score));
        md.push_str(&format!("| Reputation | {} |\n", scores.reputation_score));
        md.push_str(&format!("| Local | {} |\n\n", scores.local_score));

        md.push_str("## Root Cause Summary\n\n");
        md.push_str(&scores.root_cause_summary);
        md.push_str("\n\n");
    }

    // Crawl statistics
    if let Some(stats) = &run.crawl_stats {
        md.push_str("## Crawl Statistics\n\n");
        md.push_str(&format!("- **Pages Crawled**: {}\n", stats.pages_crawled));
        md.push_str(&format!("- **HTML Pages**: {}\n", stats.html_pages));
        md.push_str(&format!("- **Redirects**: {}\n", stats.redirects));
        md.push_str(&format!("- **Client Errors (4xx)**: {}\n", stats.client_errors));
        md.push_str(&format!("- **Server Errors (5xx)**: {}\n", stats.server_errors));
        md.push_str(&format!("- **Unreachable**: {}\n", stats.fetch_errors));
        md.push_str(&format!("- **Timed Out**: {}\n", stats.timeouts));
        md.push_str(&format!("- **Skipped by robots.txt**: {}\n", stats.robots_skipped));
        md.push_str(&format!("- **Average Response**: {}ms\n", stats.avg_response_ms));
        md.push_str(&format!(
            "- **Crawl Duration**: {:.1} seconds\n",
            stats.duration_ms as f64 / 1000.0
        ));
        md.push_str(&format!("- **Stopped Because**: {}\n\n", stats.stop_reason.describe()));
    }

    // Findings by severity
    md.push_str(&format!("## Findings ({})\n\n", findings.len()));
    if findings.is_empty() {
        md.push_str("No issues found.\n\n");
    }
    for severity in Severity::all() {
        let group: Vec<&FindingRecord> = findings
            .iter()
            .filter(|f| f.finding.severity == severity)
            .collect();
        if group.is_empty() {
            continue;
        }

        md.push_str(&format!("### {} ({})\n\n", severity, group.len()));
        md.push_str("| Issue | URL | Evidence | Fixable | Source |\n");
        md.push_str("|-------|-----|----------|---------|--------|\n");
        for record in group {
            let finding = &record.finding;
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&finding.title),
                cell(&finding.url),
                cell(&finding.evidence),
                if finding.fixable { "yes" } else { "no" },
                match record.source {
                    FindingSource::Crawl => "crawl",
                    FindingSource::Ai => "AI",
                }
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!(
        "*Generated by Site-Audit v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    md
}
