//! CSV export of comparison results

use crate::error::{Error, Result};
use crate::validate::ComparisonResult;

const HEADER: [&str; 5] = ["metric", "source", "target", "difference", "status"];

/// Render results as CSV with a header row.
///
/// The difference column is the raw signed value; status is the uppercase label.
pub fn render_results(results: &[ComparisonResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for result in results {
        writer.write_record([
            result.metric.clone(),
            result.source.to_string(),
            result.target.to_string(),
            result.difference.to_string(),
            result.status.label().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Other(format!("Failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Other(format!("CSV output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows() {
        let results = vec![
            ComparisonResult::count("Commits", 10, 8, 2),
            ComparisonResult::identity("Latest Commit SHA", "abc", "def"),
        ];
        let output = render_results(&results).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "metric,source,target,difference,status");
        assert_eq!(lines[1], "Commits,10,8,2,FAIL");
        assert_eq!(lines[2], "Latest Commit SHA,abc,def,0,FAIL");
    }

    #[test]
    fn test_csv_quotes_labels_with_commas() {
        let results = vec![ComparisonResult::count("Pull Requests (open, merged)", 1, 1, 0)];
        let output = render_results(&results).unwrap();

        assert!(output.contains("\"Pull Requests (open, merged)\",1,1,0,PASS"));
    }

    #[test]
    fn test_csv_empty_has_header_only() {
        let output = render_results(&[]).unwrap();
        assert_eq!(output, "metric,source,target,difference,status\n");
    }
}
