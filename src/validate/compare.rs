//! Comparison engine
//!
//! Diffs a source snapshot against a target snapshot and classifies each
//! metric. Differences are always `expected - target`: a positive difference
//! means the target is missing items, a negative one means it has extra.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::archive::cross_check;
use super::snapshot::RepositorySnapshot;

/// Label for the issue row when the migration log offset is active
pub const ISSUES_WITH_OFFSET_LABEL: &str = "Issues (expected +1 for migration log)";

/// Options controlling which metrics are compared and how.
///
/// The default enables every comparison, applies the migration log offset
/// and treats branch protection mismatches as failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonOptions {
    /// Source system has no issues (Bitbucket Server)
    pub skip_issues: bool,
    /// Source system has no releases
    pub skip_releases: bool,
    pub skip_lfs: bool,
    /// Do not expect the extra migration log issue on the target
    pub skip_migration_log_offset: bool,
    /// Report branch protection mismatches as Info instead of Fail
    pub branch_permissions_advisory: bool,
    /// Display name for the source column
    pub source_label: String,
}

impl ComparisonOptions {
    /// Label for the source column, falling back to "Source".
    pub fn source_label(&self) -> &str {
        if self.source_label.is_empty() {
            "Source"
        } else {
            &self.source_label
        }
    }

    /// Number of issues the migration tool is expected to add on the target.
    pub fn issue_offset(&self) -> u64 {
        if self.skip_migration_log_offset { 0 } else { 1 }
    }
}

/// Outcome of a single metric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Warn,
    Info,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Pass, Status::Fail, Status::Warn, Status::Info];

    /// Uppercase display name
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Warn => "WARN",
            Status::Info => "INFO",
        }
    }

    /// Single-character marker for compact output
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Pass => "✓",
            Status::Fail => "✗",
            Status::Warn => "⚠",
            Status::Info => "ℹ",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A compared value: either a count or a string identity such as a SHA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Text(s) if s.is_empty() => f.write_str("--"),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

/// One row of a validation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Human-readable metric label, also used as the row identifier
    pub metric: String,
    pub source: MetricValue,
    pub target: MetricValue,
    pub status: Status,
    /// Positive: target is missing items. Negative: target has extra items.
    /// Always 0 for string-identity checks.
    pub difference: i64,
}

impl ComparisonResult {
    /// Build a count comparison classified by [`classify`].
    pub fn count(metric: impl Into<String>, source: u64, target: u64, difference: i64) -> Self {
        Self {
            metric: metric.into(),
            source: MetricValue::Count(source),
            target: MetricValue::Count(target),
            status: classify(difference),
            difference,
        }
    }

    /// Build an exact string-equality comparison.
    pub fn identity(metric: impl Into<String>, source: &str, target: &str) -> Self {
        Self {
            metric: metric.into(),
            source: MetricValue::Text(source.to_string()),
            target: MetricValue::Text(target.to_string()),
            status: if source == target {
                Status::Pass
            } else {
                Status::Fail
            },
            difference: 0,
        }
    }

    /// Force the status to Info regardless of the difference.
    pub fn advisory(mut self) -> Self {
        self.status = Status::Info;
        self
    }
}

/// Classify a difference: missing items fail, extra items warn.
pub fn classify(difference: i64) -> Status {
    match difference {
        d if d > 0 => Status::Fail,
        d if d < 0 => Status::Warn,
        _ => Status::Pass,
    }
}

/// Signed `expected - actual`.
pub(crate) fn diff(expected: u64, actual: u64) -> i64 {
    expected as i64 - actual as i64
}

/// Compare two snapshots and return results in rendering order.
///
/// Standard metrics come first, followed by the archive cross-check rows when
/// the source snapshot carries archive metrics. Pass
/// `&ComparisonOptions::default()` for a GitHub-to-GitHub validation.
pub fn compare(
    source: &RepositorySnapshot,
    target: &RepositorySnapshot,
    options: &ComparisonOptions,
) -> Vec<ComparisonResult> {
    let mut results = Vec::with_capacity(14);

    if !options.skip_issues {
        let expected = source.issue_count + options.issue_offset();
        let label = if options.skip_migration_log_offset {
            "Issues"
        } else {
            ISSUES_WITH_OFFSET_LABEL
        };
        results.push(ComparisonResult::count(
            label,
            source.issue_count,
            target.issue_count,
            diff(expected, target.issue_count),
        ));
    }

    let (src_prs, tgt_prs) = (&source.pull_requests, &target.pull_requests);
    results.push(ComparisonResult::count(
        "Pull Requests (Total)",
        src_prs.total(),
        tgt_prs.total(),
        diff(src_prs.total(), tgt_prs.total()),
    ));
    results.push(ComparisonResult::count(
        "Pull Requests (Open)",
        src_prs.open(),
        tgt_prs.open(),
        diff(src_prs.open(), tgt_prs.open()),
    ));
    results.push(ComparisonResult::count(
        "Pull Requests (Merged)",
        src_prs.merged(),
        tgt_prs.merged(),
        diff(src_prs.merged(), tgt_prs.merged()),
    ));

    results.push(ComparisonResult::count(
        "Tags",
        source.tag_count,
        target.tag_count,
        diff(source.tag_count, target.tag_count),
    ));

    if !options.skip_releases {
        results.push(ComparisonResult::count(
            "Releases",
            source.release_count,
            target.release_count,
            diff(source.release_count, target.release_count),
        ));
    }

    results.push(ComparisonResult::count(
        "Commits",
        source.commit_count,
        target.commit_count,
        diff(source.commit_count, target.commit_count),
    ));

    let protection_diff = diff(
        source.branch_protection_rule_count,
        target.branch_protection_rule_count,
    );
    if options.branch_permissions_advisory {
        results.push(
            ComparisonResult::count(
                "Branch Protection Rules (advisory)",
                source.branch_protection_rule_count,
                target.branch_protection_rule_count,
                protection_diff,
            )
            .advisory(),
        );
    } else {
        results.push(ComparisonResult::count(
            "Branch Protection Rules",
            source.branch_protection_rule_count,
            target.branch_protection_rule_count,
            protection_diff,
        ));
    }

    results.push(ComparisonResult::count(
        "Webhooks",
        source.webhook_count,
        target.webhook_count,
        diff(source.webhook_count, target.webhook_count),
    ));

    if !options.skip_lfs {
        results.push(ComparisonResult::count(
            "LFS Objects",
            source.lfs_object_count,
            target.lfs_object_count,
            diff(source.lfs_object_count, target.lfs_object_count),
        ));
    }

    results.push(ComparisonResult::identity(
        "Latest Commit SHA",
        &source.latest_commit_sha,
        &target.latest_commit_sha,
    ));

    if let Some(archive) = source.migration_archive.as_ref() {
        results.extend(cross_check(archive, source, target, options));
    }

    results
}

/// True iff at least one result failed. Warn and Info never count.
pub fn has_failures(results: &[ComparisonResult]) -> bool {
    results.iter().any(|r| r.status == Status::Fail)
}

/// Per-status tally of a result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub pass: usize,
    pub fail: usize,
    pub warn: usize,
    pub info: usize,
}

impl StatusSummary {
    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.pass + self.fail + self.warn + self.info
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Pass => self.pass,
            Status::Fail => self.fail,
            Status::Warn => self.warn,
            Status::Info => self.info,
        }
    }
}

/// Count results by status.
pub fn summarize(results: &[ComparisonResult]) -> StatusSummary {
    results
        .iter()
        .fold(StatusSummary::default(), |mut acc, r| {
            match r.status {
                Status::Pass => acc.pass += 1,
                Status::Fail => acc.fail += 1,
                Status::Warn => acc.warn += 1,
                Status::Info => acc.info += 1,
            }
            acc
        })
}
