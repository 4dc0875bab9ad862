//! Human-oriented console output

use colored::Colorize;

use super::table::format_table;
use crate::models::display::{ResultDisplay, format_utc_minute};
use crate::validate::{Status, ValidationReport};

fn paint(status: Status, text: String) -> String {
    match status {
        Status::Pass => text.green().to_string(),
        Status::Fail => text.red().to_string(),
        Status::Warn => text.yellow().to_string(),
        Status::Info => text.cyan().to_string(),
    }
}

/// Header, result table, summary line and retrieval warnings.
pub fn render_report(report: &ValidationReport) -> String {
    let mut lines = vec![
        "Migration Validation Report".bold().to_string(),
        format!("  {}: {}", report.source_label(), report.source),
        format!("  Target: {}", report.target),
        format!("  Generated: {}", format_utc_minute(&report.generated_at).dimmed()),
        String::new(),
    ];

    let rows: Vec<ResultDisplay> = report.results.iter().map(ResultDisplay::from).collect();
    lines.push(format_table(&rows));
    lines.push(String::new());

    let summary = report.summary();
    let counts: Vec<String> = Status::ALL
        .iter()
        .map(|s| {
            let count = summary.get(*s);
            let text = format!("{} {} {}", s.symbol(), count, s.label().to_lowercase());
            if count == 0 {
                text.dimmed().to_string()
            } else {
                paint(*s, text)
            }
        })
        .collect();
    lines.push(format!("{} {}", "Summary:".bold(), counts.join("  ")));

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push("Retrieval warnings:".yellow().bold().to_string());
        for warning in &report.warnings {
            lines.push(format!("  {} {}", "⚠".yellow(), warning));
        }
    }

    lines.push(String::new());
    if report.has_failures() {
        lines.push(format!(
            "{} Validation failed: {} metric(s) did not match",
            "✗".red(),
            summary.fail
        ));
    } else {
        lines.push(format!("{} Validation passed", "✓".green()));
    }

    lines.join("\n")
}
