//! Repository snapshot data model
//!
//! A snapshot holds every metric captured for one repository at one point in
//! time. Source and target snapshots are built independently and never share
//! state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Owner/name pair identifying a repository on one side of a migration.
///
/// For GitHub the owner is the organization or user; for Bitbucket Server it
/// is the project key and the name is the repository slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    owner: String,
    name: String,
}

impl RepositoryIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Pull request counts by state.
///
/// `total` is always `open + merged + closed`; it is computed at construction
/// and has no setter. Deserialization recomputes it as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StateCounts")]
pub struct PullRequestCounts {
    open: u64,
    merged: u64,
    closed: u64,
    total: u64,
}

impl PullRequestCounts {
    pub fn new(open: u64, merged: u64, closed: u64) -> Self {
        Self {
            open,
            merged,
            closed,
            total: open + merged + closed,
        }
    }

    pub fn open(&self) -> u64 {
        self.open
    }

    pub fn merged(&self) -> u64 {
        self.merged
    }

    /// Closed without merging (declined on Bitbucket Server)
    #[cfg(test)]
    pub fn closed(&self) -> u64 {
        self.closed
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[derive(Deserialize)]
struct StateCounts {
    open: u64,
    merged: u64,
    closed: u64,
}

impl From<StateCounts> for PullRequestCounts {
    fn from(raw: StateCounts) -> Self {
        PullRequestCounts::new(raw.open, raw.merged, raw.closed)
    }
}

/// Counts derived from a migration export archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationArchiveMetrics {
    pub issue_count: u64,
    pub pull_request_count: u64,
    pub protected_branch_count: u64,
    pub release_count: u64,
}

/// All metrics for one repository at one point in time.
///
/// Fields are filled one metric at a time by the retrieval orchestrator. A
/// metric whose retrieval failed keeps its default (zero or empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub identity: RepositoryIdentity,
    pub issue_count: u64,
    pub pull_requests: PullRequestCounts,
    pub tag_count: u64,
    pub release_count: u64,
    pub commit_count: u64,
    pub latest_commit_sha: String,
    pub branch_protection_rule_count: u64,
    pub webhook_count: u64,
    pub lfs_object_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_archive: Option<MigrationArchiveMetrics>,
}

impl RepositorySnapshot {
    /// Create an empty snapshot with every metric at its default.
    pub fn new(identity: RepositoryIdentity) -> Self {
        Self {
            identity,
            issue_count: 0,
            pull_requests: PullRequestCounts::default(),
            tag_count: 0,
            release_count: 0,
            commit_count: 0,
            latest_commit_sha: String::new(),
            branch_protection_rule_count: 0,
            webhook_count: 0,
            lfs_object_count: 0,
            migration_archive: None,
        }
    }

    /// Attach archive-derived counts, enabling the archive cross-check.
    pub fn with_archive(mut self, metrics: MigrationArchiveMetrics) -> Self {
        self.migration_archive = Some(metrics);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_total_is_sum_of_states() {
        let counts = PullRequestCounts::new(3, 10, 2);
        assert_eq!(counts.total(), 15);
        assert_eq!(counts.open(), 3);
        assert_eq!(counts.merged(), 10);
        assert_eq!(counts.closed(), 2);
    }

    #[test]
    fn test_pull_request_default_is_all_zero() {
        let counts = PullRequestCounts::default();
        assert_eq!(counts, PullRequestCounts::new(0, 0, 0));
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_pull_request_total_recomputed_on_deserialize() {
        let counts: PullRequestCounts =
            serde_json::from_str(r#"{"open":1,"merged":2,"closed":3,"total":99}"#).unwrap();
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn test_new_snapshot_has_defaults() {
        let snapshot = RepositorySnapshot::new(RepositoryIdentity::new("octo", "hello"));
        assert_eq!(snapshot.identity.to_string(), "octo/hello");
        assert_eq!(snapshot.issue_count, 0);
        assert_eq!(snapshot.pull_requests.total(), 0);
        assert!(snapshot.latest_commit_sha.is_empty());
        assert!(snapshot.migration_archive.is_none());
    }

    #[test]
    fn test_with_archive_attaches_metrics() {
        let archive = MigrationArchiveMetrics {
            issue_count: 6,
            pull_request_count: 4,
            protected_branch_count: 1,
            release_count: 2,
        };
        let snapshot =
            RepositorySnapshot::new(RepositoryIdentity::new("octo", "hello")).with_archive(archive);
        assert_eq!(snapshot.migration_archive, Some(archive));
    }

    #[test]
    fn test_snapshot_json_omits_missing_archive() {
        let snapshot = RepositorySnapshot::new(RepositoryIdentity::new("octo", "hello"));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("migration_archive"));

        let back: RepositorySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
