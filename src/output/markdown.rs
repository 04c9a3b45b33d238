//! Markdown report generation
//!
//! This module renders a crawl report as a human-readable markdown document:
//! an overview, the per-page score table, and the findings behind each score.

use crate::output::report::{CrawlReport, OutputResult, PageResult};
use crate::rules::Finding;
use crate::state::UrlState;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report to `output_path`
///
/// # Arguments
///
/// * `report` - The finished crawl report
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# SEO Lantern Audit Report\n\n");

    // Overview
    let count_in = |state: UrlState| report.data.iter().filter(|p| p.state == state).count();
    let evaluated: Vec<&PageResult> = report.evaluated().collect();

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Pages**: {}\n", report.pages));
    md.push_str(&format!("- **Evaluated**: {}\n", evaluated.len()));
    md.push_str(&format!("- **Failed**: {}\n", count_in(UrlState::Failed)));
    md.push_str(&format!("- **Skipped**: {}\n", count_in(UrlState::Skipped)));
    if !evaluated.is_empty() {
        let total: i64 = evaluated.iter().map(|p| i64::from(p.score_global)).sum();
        md.push_str(&format!(
            "- **Average Score**: {:.1}\n",
            total as f64 / evaluated.len() as f64
        ));
    }
    md.push('\n');

    if !report.site_recommendations.is_empty() {
        md.push_str("## Site Recommendations\n\n");
        push_findings(&mut md, &report.site_recommendations);
        md.push('\n');
    }

    // Score table
    if !report.data.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | State | Status | Global | Legacy | Rules | Findings |\n");
        md.push_str("|-----|-------|--------|--------|--------|-------|----------|\n");

        for page in &report.data {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                escape_cell(&page.url),
                page.state,
                page.status,
                page.score_global,
                page.score_legacy,
                page.score_rules,
                page.recommendations.len()
            ));
        }
        md.push('\n');
    }

    // Findings per evaluated page
    for page in evaluated.iter().filter(|p| !p.recommendations.is_empty()) {
        md.push_str(&format!("### {}\n\n", page.url));
        if !page.title.is_empty() {
            md.push_str(&format!("Title: {}\n\n", page.title));
        }
        push_findings(&mut md, &page.recommendations);
        md.push('\n');
    }

    // Pages that were never evaluated
    let unevaluated: Vec<&PageResult> = report
        .data
        .iter()
        .filter(|p| p.state != UrlState::Done)
        .collect();
    if !unevaluated.is_empty() {
        md.push_str("## Not Evaluated\n\n");
        md.push_str("| URL | State | Reason |\n");
        md.push_str("|-----|-------|--------|\n");
        for page in unevaluated {
            let reason = page.error.as_ref().map_or("", |e| e.kind.as_str());
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&page.url),
                page.state,
                reason
            ));
        }
        md.push('\n');
    }

    md
}

fn push_findings(md: &mut String, findings: &[Finding]) {
    md.push_str("| Severity | Rule | Topic | Message |\n");
    md.push_str("|----------|------|-------|---------|\n");
    for finding in findings {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            finding.severity,
            finding.rule_id,
            finding.topic,
            escape_cell(&finding.message)
        ));
    }
}

/// Keeps pipes in values from breaking table rows
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{evidence, Severity, Topic};
    use serde_json::json;
    use tempfile::TempDir;
    use url::Url;

    fn create_test_report() -> CrawlReport {
        let finding = Finding::new(
            "META_DESC_MISSING",
            Topic::Meta,
            Severity::Warning,
            "Page has no meta description",
            evidence(json!({})),
        );
        let mut page = PageResult::skipped(
            &Url::parse("https://example.com/").unwrap(),
            "robots_disallowed",
            evidence(json!({})),
        );
        page.state = UrlState::Done;
        page.error = None;
        page.status = 200;
        page.title = "Home".to_string();
        page.score_global = 94;
        page.score_legacy = 94;
        page.recommendations = vec![finding];

        let skipped = PageResult::skipped(
            &Url::parse("https://example.com/private/x").unwrap(),
            "robots_disallowed",
            evidence(json!({})),
        );

        let site = Finding::new(
            "DISCOVERY_LLMS_TXT_MISSING",
            Topic::Discovery,
            Severity::Info,
            "No /llms.txt file",
            evidence(json!({})),
        );

        CrawlReport::new(vec![page, skipped], vec![site])
    }

    #[test]
    fn test_format_markdown_report() {
        let markdown = format_markdown_report(&create_test_report());

        assert!(markdown.contains("# SEO Lantern Audit Report"));
        assert!(markdown.contains("- **Pages**: 2"));
        assert!(markdown.contains("- **Evaluated**: 1"));
        assert!(markdown.contains("- **Skipped**: 1"));
        assert!(markdown.contains("- **Average Score**: 94.0"));
        assert!(markdown.contains("| https://example.com/ | done | 200 | 94 | 94 | 0 | 1 |"));
    }

    #[test]
    fn test_markdown_lists_findings_and_reasons() {
        let markdown = format_markdown_report(&create_test_report());

        assert!(markdown.contains("## Site Recommendations"));
        assert!(markdown.contains("DISCOVERY_LLMS_TXT_MISSING"));
        assert!(markdown.contains("### https://example.com/"));
        assert!(markdown.contains("| warning | META_DESC_MISSING | meta |"));
        assert!(markdown.contains("| https://example.com/private/x | skipped | robots_disallowed |"));
    }

    #[test]
    fn test_empty_report() {
        let markdown = format_markdown_report(&CrawlReport::new(Vec::new(), Vec::new()));
        assert!(markdown.contains("- **Pages**: 0"));
        assert!(!markdown.contains("## Pages"));
        assert!(!markdown.contains("Average Score"));
    }

    #[test]
    fn test_generate_markdown_report_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.md");

        generate_markdown_report(&create_test_report(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# SEO Lantern Audit Report"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }
}
