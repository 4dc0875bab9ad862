//! Validation report: everything a renderer or session store needs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::compare::{ComparisonOptions, ComparisonResult, StatusSummary, has_failures, summarize};
use super::snapshot::RepositoryIdentity;

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub source: RepositoryIdentity,
    pub target: RepositoryIdentity,
    pub generated_at: DateTime<Utc>,
    pub options: ComparisonOptions,
    pub results: Vec<ComparisonResult>,
    /// Partial retrieval failures and rate limit notices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(
        source: RepositoryIdentity,
        target: RepositoryIdentity,
        options: ComparisonOptions,
        results: Vec<ComparisonResult>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            source,
            target,
            generated_at: Utc::now(),
            options,
            results,
            warnings,
        }
    }

    pub fn source_label(&self) -> &str {
        self.options.source_label()
    }

    pub fn summary(&self) -> StatusSummary {
        summarize(&self.results)
    }

    pub fn has_failures(&self) -> bool {
        has_failures(&self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(results: Vec<ComparisonResult>) -> ValidationReport {
        ValidationReport::new(
            RepositoryIdentity::new("src", "repo"),
            RepositoryIdentity::new("tgt", "repo"),
            ComparisonOptions::default(),
            results,
            vec!["webhooks: Access denied".to_string()],
        )
    }

    #[test]
    fn test_report_summary_and_failures() {
        let report = report(vec![
            ComparisonResult::count("Tags", 3, 3, 0),
            ComparisonResult::count("Commits", 10, 8, 2),
            ComparisonResult::count("Webhooks", 0, 1, -1),
        ]);

        let summary = report.summary();
        assert_eq!(summary.pass, 1);
        assert_eq!(summary.fail, 1);
        assert_eq!(summary.warn, 1);
        assert!(report.has_failures());
        assert_eq!(report.source_label(), "Source");
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = report(vec![ComparisonResult::identity(
            "Latest Commit SHA",
            "abc",
            "abc",
        )]);
        let json = serde_json::to_string(&report).unwrap();
        let back: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
