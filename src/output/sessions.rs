//! Output for saved session listings

use super::{Formattable, json, table};
use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::models::display::SessionDisplay;
use crate::session::SessionSummary;

impl Formattable for Vec<SessionSummary> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        let rows: Vec<SessionDisplay> = self.iter().map(SessionDisplay::from).collect();
        match format {
            OutputFormat::Pretty | OutputFormat::Table => Ok(table::format_table(&rows)),
            OutputFormat::Json => Ok(json::format_json(self)?),
            OutputFormat::Markdown => {
                let mut lines = vec![
                    "| Session | Source | Target | Created | Pass | Fail | Warn |".to_string(),
                    "|---|---|---|---|---:|---:|---:|".to_string(),
                ];
                lines.extend(rows.iter().map(|r| {
                    format!(
                        "| `{}` | {} | {} | {} | {} | {} | {} |",
                        r.id, r.source, r.target, r.created, r.passed, r.failed, r.warned
                    )
                }));
                Ok(lines.join("\n"))
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                for session in self {
                    writer.serialize(session)?;
                }
                let bytes = writer
                    .into_inner()
                    .map_err(|e| Error::Other(format!("Failed to flush CSV output: {}", e)))?;
                String::from_utf8(bytes)
                    .map_err(|e| Error::Other(format!("CSV output is not UTF-8: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sessions() -> Vec<SessionSummary> {
        vec![SessionSummary {
            id: "a1b2c3d4e5f6".to_string(),
            source: "PROJ/api".to_string(),
            target: "octo/api".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            passed: 8,
            failed: 1,
            warned: 0,
        }]
    }

    #[test]
    fn test_session_table() {
        let output = sessions().format(OutputFormat::Table).unwrap();
        assert!(output.contains("SESSION ID"));
        assert!(output.contains("a1b2c3d4e5f6"));
        assert!(output.contains("2024-03-01 09:30 UTC"));
    }

    #[test]
    fn test_session_empty_list() {
        let output = Vec::<SessionSummary>::new().format(OutputFormat::Pretty).unwrap();
        assert_eq!(output, "No results found.");
    }

    #[test]
    fn test_session_csv() {
        let output = sessions().format(OutputFormat::Csv).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("id,source,target,created_at,passed,failed,warned")
        );
        assert!(lines.next().unwrap().starts_with("a1b2c3d4e5f6,PROJ/api,octo/api,2024-03-01T09:30:00Z,8,1,0"));
    }

    #[test]
    fn test_session_markdown() {
        let output = sessions().format(OutputFormat::Markdown).unwrap();
        assert!(output.contains("| `a1b2c3d4e5f6` | PROJ/api | octo/api | 2024-03-01 09:30 UTC | 8 | 1 | 0 |"));
    }
}
