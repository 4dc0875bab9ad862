//! Output dispatch for validation reports

use serde::Serialize;

use super::{Formattable, csv, json, markdown, pretty, table};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::models::display::ResultDisplay;
use crate::validate::{StatusSummary, ValidationReport};

/// JSON body: the report plus derived summary fields
#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    #[serde(flatten)]
    report: &'a ValidationReport,
    source_label: &'a str,
    summary: StatusSummary,
    has_failures: bool,
}

impl Formattable for ValidationReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(pretty::render_report(self)),
            OutputFormat::Table => {
                let rows: Vec<ResultDisplay> = self.results.iter().map(ResultDisplay::from).collect();
                Ok(table::format_table(&rows))
            }
            OutputFormat::Json => {
                let body = ReportJson {
                    report: self,
                    source_label: self.source_label(),
                    summary: self.summary(),
                    has_failures: self.has_failures(),
                };
                Ok(json::format_json(&body)?)
            }
            OutputFormat::Markdown => Ok(markdown::render_report(self)),
            OutputFormat::Csv => csv::render_results(&self.results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{ComparisonOptions, ComparisonResult, RepositoryIdentity};

    fn report() -> ValidationReport {
        ValidationReport::new(
            RepositoryIdentity::new("PROJ", "repo"),
            RepositoryIdentity::new("octo", "repo"),
            ComparisonOptions {
                source_label: "Bitbucket".to_string(),
                ..Default::default()
            },
            vec![
                ComparisonResult::count("Tags", 4, 4, 0),
                ComparisonResult::count("Commits", 10, 9, 1),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_json_includes_summary() {
        let output = report().format(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["data"]["source"]["owner"], "PROJ");
        assert_eq!(value["data"]["source_label"], "Bitbucket");
        assert_eq!(value["data"]["summary"]["fail"], 1);
        assert_eq!(value["data"]["has_failures"], true);
        assert_eq!(value["data"]["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["meta"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_table_format() {
        let output = report().format(OutputFormat::Table).unwrap();
        assert!(output.contains("✗ FAIL"));
        assert!(output.contains("Missing: 1"));
    }

    #[test]
    fn test_csv_format_dispatch() {
        let output = report().format(OutputFormat::Csv).unwrap();
        assert!(output.starts_with("metric,source,target,difference,status\n"));
    }
}
