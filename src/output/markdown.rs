//! Markdown output for validation reports

use crate::models::display::{format_difference, format_utc_minute};
use crate::validate::{Status, ValidationReport};

/// Escape characters that would break a GitHub table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Render a report as a GitHub-flavored markdown document.
pub fn render_report(report: &ValidationReport) -> String {
    let label = report.source_label();
    let mut lines = vec![
        "## Migration Validation Report".to_string(),
        String::new(),
        format!("- **{}:** `{}`", label, report.source),
        format!("- **Target:** `{}`", report.target),
        format!("- **Generated:** {}", format_utc_minute(&report.generated_at)),
        String::new(),
        format!("| Status | Metric | {} | Target | Difference |", cell(label)),
        "|---|---|---:|---:|---|".to_string(),
    ];

    lines.extend(report.results.iter().map(|result| {
        format!(
            "| {} {} | {} | {} | {} | {} |",
            result.status.symbol(),
            result.status.label(),
            cell(&result.metric),
            cell(&result.source.to_string()),
            cell(&result.target.to_string()),
            format_difference(result.difference),
        )
    }));

    let summary = report.summary();
    let counts: Vec<String> = Status::ALL
        .iter()
        .map(|s| format!("{} {}", summary.get(*s), s.label()))
        .collect();
    lines.push(String::new());
    lines.push(format!("**Summary:** {}", counts.join(", ")));

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push("### Retrieval warnings".to_string());
        lines.push(String::new());
        lines.extend(report.warnings.iter().map(|w| format!("- {}", cell(w))));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{ComparisonOptions, ComparisonResult, RepositoryIdentity};

    fn report(label: &str, warnings: Vec<String>) -> ValidationReport {
        ValidationReport::new(
            RepositoryIdentity::new("PROJ", "api"),
            RepositoryIdentity::new("octo", "api"),
            ComparisonOptions {
                source_label: label.to_string(),
                ..Default::default()
            },
            vec![
                ComparisonResult::count("Tags", 4, 4, 0),
                ComparisonResult::count("Webhooks", 1, 2, -1),
                ComparisonResult::identity("Latest Commit SHA", "abc", "abc"),
            ],
            warnings,
        )
    }

    #[test]
    fn test_markdown_table_uses_source_label() {
        let md = render_report(&report("Bitbucket", Vec::new()));

        assert!(md.contains("| Status | Metric | Bitbucket | Target | Difference |"));
        assert!(md.contains("- **Bitbucket:** `PROJ/api`"));
        assert!(md.contains("| ✓ PASS | Tags | 4 | 4 | - |"));
        assert!(md.contains("| ⚠ WARN | Webhooks | 1 | 2 | Extra: 1 |"));
        assert!(md.contains("**Summary:** 2 PASS, 0 FAIL, 1 WARN, 0 INFO"));
        assert!(!md.contains("Retrieval warnings"));
    }

    #[test]
    fn test_markdown_lists_warnings() {
        let md = render_report(&report("", vec!["tags: a|b".to_string()]));

        assert!(md.contains("| Status | Metric | Source | Target | Difference |"));
        assert!(md.contains("### Retrieval warnings"));
        assert!(md.contains("- tags: a\\|b"));
    }
}
