//! Saved session display model

use serde::Serialize;
use tabled::Tabled;

use super::common::format_utc_minute;
use crate::session::SessionSummary;

/// Session row for `session list` output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct SessionDisplay {
    #[tabled(rename = "SESSION ID")]
    pub id: String,

    #[tabled(rename = "SOURCE")]
    pub source: String,

    #[tabled(rename = "TARGET")]
    pub target: String,

    #[tabled(rename = "CREATED")]
    pub created: String,

    #[tabled(rename = "PASS")]
    pub passed: usize,

    #[tabled(rename = "FAIL")]
    pub failed: usize,

    #[tabled(rename = "WARN")]
    pub warned: usize,
}

impl From<&SessionSummary> for SessionDisplay {
    fn from(session: &SessionSummary) -> Self {
        Self {
            id: session.id.clone(),
            source: session.source.clone(),
            target: session.target.clone(),
            created: format_utc_minute(&session.created_at),
            passed: session.passed,
            failed: session.failed,
            warned: session.warned,
        }
    }
}
