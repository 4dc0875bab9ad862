//! Comparison result display model

use serde::Serialize;
use tabled::Tabled;

use super::common::format_difference;
use crate::validate::ComparisonResult;

/// Comparison row for table output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ResultDisplay {
    /// Symbol plus label, e.g. "✓ PASS"
    #[tabled(rename = "STATUS")]
    pub status: String,

    #[tabled(rename = "METRIC")]
    pub metric: String,

    #[tabled(rename = "SOURCE")]
    pub source: String,

    #[tabled(rename = "TARGET")]
    pub target: String,

    /// "Missing: N", "Extra: N" or "-"
    #[tabled(rename = "DIFFERENCE")]
    pub difference: String,
}

impl From<&ComparisonResult> for ResultDisplay {
    fn from(result: &ComparisonResult) -> Self {
        Self {
            status: format!("{} {}", result.status.symbol(), result.status.label()),
            metric: result.metric.clone(),
            source: result.source.to_string(),
            target: result.target.to_string(),
            difference: format_difference(result.difference),
        }
    }
}
