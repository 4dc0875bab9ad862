//! SQLite-backed store for saved validation reports

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;

use super::key::session_id;
use crate::error::SessionError;
use crate::validate::ValidationReport;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

const DB_FILE: &str = "sessions.db";

type Result<T> = std::result::Result<T, SessionError>;

/// Saved validation sessions
pub struct SessionStore {
    conn: Connection,
    path: PathBuf,
}

/// One row of `session list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub source: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub warned: usize,
}

/// A saved report with its id
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub id: String,
    pub report: ValidationReport,
}

impl SessionStore {
    /// Open the store in `dir`, or the platform data directory when `None`.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::open_at(dir),
            None => Self::open_at(&Self::default_dir()?),
        }
    }

    /// Default location (`~/.local/share/migval` on Linux)
    pub fn default_dir() -> Result<PathBuf> {
        let data_base = dirs::data_dir().ok_or(SessionError::NoDataDir)?;
        Ok(data_base.join("migval"))
    }

    /// Open the store at a specific directory
    pub fn open_at(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| SessionError::Io(format!("Failed to create session dir: {}", e)))?;

        let path = dir.join(DB_FILE);
        let conn = Connection::open(&path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Session schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(&path)
                .map_err(|e| SessionError::Io(format!("Failed to remove session DB: {}", e)))?;
            return Self::open_at(dir);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY NOT NULL,
                source TEXT NOT NULL,
                target TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                passed INTEGER NOT NULL,
                failed INTEGER NOT NULL,
                warned INTEGER NOT NULL,
                report TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_created_at ON sessions(created_at);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self { conn, path })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save a report and return its session id.
    pub fn save(&self, report: &ValidationReport) -> Result<String> {
        let source = report.source.to_string();
        let target = report.target.to_string();
        let id = session_id(&source, &target, &report.generated_at);
        let summary = report.summary();
        let json = serde_json::to_string(report)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;

        self.conn.execute(
            "INSERT OR REPLACE INTO sessions
             (id, source, target, created_at, passed, failed, warned, report)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                source,
                target,
                report.generated_at.timestamp_millis(),
                summary.pass,
                summary.fail,
                summary.warn,
                json
            ],
        )?;
        log::debug!("Saved session {}", id);
        Ok(id)
    }

    /// Load a session by id or unique id prefix.
    pub fn load(&self, id_or_prefix: &str) -> Result<StoredSession> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, report FROM sessions WHERE substr(id, 1, length(?1)) = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map([id_or_prefix], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let (id, json) = match rows.len() {
            0 => return Err(SessionError::NotFound(id_or_prefix.to_string())),
            1 => rows.into_iter().next().ok_or_else(|| {
                SessionError::NotFound(id_or_prefix.to_string())
            })?,
            _ => match rows.into_iter().find(|(id, _)| id == id_or_prefix) {
                Some(exact) => exact,
                None => return Err(SessionError::Ambiguous(id_or_prefix.to_string())),
            },
        };

        let report = serde_json::from_str(&json)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        Ok(StoredSession { id, report })
    }

    /// All sessions, newest first.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, target, created_at, passed, failed, warned
             FROM sessions ORDER BY created_at DESC, id",
        )?;
        let sessions = stmt
            .query_map([], |row| {
                let millis: i64 = row.get(3)?;
                Ok(SessionSummary {
                    id: row.get(0)?,
                    source: row.get(1)?,
                    target: row.get(2)?,
                    created_at: DateTime::from_timestamp_millis(millis).unwrap_or_default(),
                    passed: row.get(4)?,
                    failed: row.get(5)?,
                    warned: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Delete one session by exact id. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    /// Delete every session. Returns the number removed.
    pub fn clear(&self) -> Result<usize> {
        let deleted = self.conn.execute("DELETE FROM sessions", [])?;
        Ok(deleted)
    }
}
