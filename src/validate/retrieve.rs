//! Retrieval orchestrator
//!
//! Fills a [`RepositorySnapshot`] from a [`MetricProvider`], one metric per
//! call. A failed call leaves the metric at its default and records a
//! labeled message; only a side where every attempted call failed is fatal.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};

use super::compare::ComparisonOptions;
use super::snapshot::{RepositoryIdentity, RepositorySnapshot};
use crate::client::MetricProvider;
use crate::error::{Result, ValidationError};

/// One provider call made while building a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Issues,
    PullRequests,
    Tags,
    Releases,
    Commits,
    LatestCommitSha,
    BranchProtectionRules,
    Webhooks,
    LfsObjects,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Issues,
        Metric::PullRequests,
        Metric::Tags,
        Metric::Releases,
        Metric::Commits,
        Metric::LatestCommitSha,
        Metric::BranchProtectionRules,
        Metric::Webhooks,
        Metric::LfsObjects,
    ];

    /// Prefix used in retrieval error messages
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Issues => "issues",
            Metric::PullRequests => "pull requests",
            Metric::Tags => "tags",
            Metric::Releases => "releases",
            Metric::Commits => "commits",
            Metric::LatestCommitSha => "latest commit sha",
            Metric::BranchProtectionRules => "branch protection rules",
            Metric::Webhooks => "webhooks",
            Metric::LfsObjects => "lfs objects",
        }
    }
}

/// Which optional metrics to request.
///
/// Pull requests, tags, commits, latest SHA, branch protection rules and
/// webhooks are always requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalOptions {
    pub include_issues: bool,
    pub include_releases: bool,
    pub include_lfs: bool,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            include_issues: true,
            include_releases: true,
            include_lfs: false,
        }
    }
}

impl From<&ComparisonOptions> for RetrievalOptions {
    /// Request exactly the metrics the comparison will use.
    fn from(options: &ComparisonOptions) -> Self {
        Self {
            include_issues: !options.skip_issues,
            include_releases: !options.skip_releases,
            include_lfs: !options.skip_lfs,
        }
    }
}

/// A populated snapshot plus the messages of any metric calls that failed.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub snapshot: RepositorySnapshot,
    pub errors: Vec<String>,
}

#[derive(Default)]
struct Tally {
    attempted: usize,
    succeeded: usize,
    errors: Vec<String>,
}

impl Tally {
    /// Fold one call result; `None` input means the call was not attempted.
    fn record<T>(&mut self, metric: Metric, result: Option<Result<T>>) -> Option<T> {
        let result = result?;
        self.attempted += 1;
        match result {
            Ok(value) => {
                self.succeeded += 1;
                Some(value)
            }
            Err(e) => {
                let message = format!("{}: {}", metric.label(), e);
                warn!("{}", message);
                self.errors.push(message);
                None
            }
        }
    }
}

async fn attempt<T>(enabled: bool, call: impl Future<Output = Result<T>>) -> Option<Result<T>> {
    if enabled { Some(call.await) } else { None }
}

/// Retrieve every requested metric for one repository.
///
/// Calls run concurrently. Fails with
/// [`ValidationError::TotalRetrievalFailure`] only when none of the attempted
/// calls succeeded; otherwise partial failures are returned in
/// [`RetrievalOutcome::errors`].
pub async fn retrieve_snapshot(
    provider: &dyn MetricProvider,
    identity: RepositoryIdentity,
    side: &'static str,
    options: &RetrievalOptions,
) -> Result<RetrievalOutcome> {
    info!(
        "Retrieving {} metrics for {} from {}",
        side,
        identity,
        provider.name()
    );
    let repo = &identity;

    let (issues, pull_requests, tags, releases, commits, sha, rules, webhooks, lfs) = futures::join!(
        attempt(options.include_issues, provider.issue_count(repo)),
        attempt(true, provider.pull_request_counts(repo)),
        attempt(true, provider.tag_count(repo)),
        attempt(options.include_releases, provider.release_count(repo)),
        attempt(true, provider.commit_count(repo)),
        attempt(true, provider.latest_commit_sha(repo)),
        attempt(true, provider.branch_protection_rule_count(repo)),
        attempt(true, provider.webhook_count(repo)),
        attempt(options.include_lfs, provider.lfs_object_count(repo)),
    );

    let mut tally = Tally::default();
    let mut snapshot = RepositorySnapshot::new(identity.clone());

    if let Some(v) = tally.record(Metric::Issues, issues) {
        snapshot.issue_count = v;
    }
    if let Some(v) = tally.record(Metric::PullRequests, pull_requests) {
        snapshot.pull_requests = v;
    }
    if let Some(v) = tally.record(Metric::Tags, tags) {
        snapshot.tag_count = v;
    }
    if let Some(v) = tally.record(Metric::Releases, releases) {
        snapshot.release_count = v;
    }
    if let Some(v) = tally.record(Metric::Commits, commits) {
        snapshot.commit_count = v;
    }
    if let Some(v) = tally.record(Metric::LatestCommitSha, sha) {
        snapshot.latest_commit_sha = v;
    }
    if let Some(v) = tally.record(Metric::BranchProtectionRules, rules) {
        snapshot.branch_protection_rule_count = v;
    }
    if let Some(v) = tally.record(Metric::Webhooks, webhooks) {
        snapshot.webhook_count = v;
    }
    if let Some(v) = tally.record(Metric::LfsObjects, lfs) {
        snapshot.lfs_object_count = v;
    }

    debug!(
        "{} retrieval: {}/{} calls succeeded",
        side, tally.succeeded, tally.attempted
    );

    if tally.succeeded == 0 {
        return Err(ValidationError::TotalRetrievalFailure {
            side,
            repo: identity.to_string(),
            errors: tally.errors,
        }
        .into());
    }

    Ok(RetrievalOutcome {
        snapshot,
        errors: tally.errors,
    })
}

/// Check that both repositories are reachable before any metric call.
pub async fn validate_access_pair(
    source: &dyn MetricProvider,
    source_id: &RepositoryIdentity,
    target: &dyn MetricProvider,
    target_id: &RepositoryIdentity,
) -> Result<()> {
    let (source_access, target_access) = tokio::join!(
        source.validate_access(source_id),
        target.validate_access(target_id),
    );

    source_access.map_err(|e| ValidationError::AccessDenied {
        side: "source",
        repo: source_id.to_string(),
        source: Box::new(e),
    })?;
    target_access.map_err(|e| ValidationError::AccessDenied {
        side: "target",
        repo: target_id.to_string(),
        source: Box::new(e),
    })?;
    Ok(())
}

/// Retrieve source and target snapshots in two independent tasks.
///
/// Both tasks run to completion. If either side is fatal the run fails,
/// with the source error reported first.
pub async fn retrieve_pair(
    source: Arc<dyn MetricProvider>,
    source_id: RepositoryIdentity,
    target: Arc<dyn MetricProvider>,
    target_id: RepositoryIdentity,
    options: RetrievalOptions,
) -> Result<(RetrievalOutcome, RetrievalOutcome)> {
    let source_task = tokio::spawn(async move {
        retrieve_snapshot(source.as_ref(), source_id, "source", &options).await
    });
    let target_task = tokio::spawn(async move {
        retrieve_snapshot(target.as_ref(), target_id, "target", &options).await
    });

    let (source_result, target_result) = tokio::join!(source_task, target_task);
    let source_result =
        source_result.map_err(|e| ValidationError::TaskFailed("source", e.to_string()))?;
    let target_result =
        target_result.map_err(|e| ValidationError::TaskFailed("target", e.to_string()))?;

    match (source_result, target_result) {
        (Ok(source), Ok(target)) => Ok((source, target)),
        (Err(source_err), Err(target_err)) => {
            warn!("Target retrieval also failed: {}", target_err);
            Err(source_err)
        }
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
    }
}

/// Warn about providers whose remaining request budget is below `threshold`.
///
/// A threshold of 0 disables the check. Providers that do not report a
/// budget, or whose status query fails, are skipped.
pub async fn check_rate_limits(
    providers: &[(&'static str, &dyn MetricProvider)],
    threshold: u64,
) -> Vec<String> {
    if threshold == 0 {
        return Vec::new();
    }

    let mut warnings = Vec::new();
    for (side, provider) in providers {
        match provider.rate_limit_status().await {
            Ok(Some(status)) if status.remaining < threshold => {
                let reset = status
                    .reset_at
                    .map(|t| t.format("%H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let message = format!(
                    "{} {} API rate limit is low: {} of {} requests remaining (resets at {})",
                    side,
                    provider.name(),
                    status.remaining,
                    status.limit,
                    reset
                );
                warn!("{}", message);
                warnings.push(message);
            }
            Ok(_) => {}
            Err(e) => debug!("Could not read {} rate limit status: {}", side, e),
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockMetricProvider, RateLimitStatus};
    use crate::error::{ApiError, Error};
    use crate::validate::PullRequestCounts;

    fn values() -> RepositorySnapshot {
        let mut s = RepositorySnapshot::new(RepositoryIdentity::new("octo", "hello"));
        s.issue_count = 10;
        s.pull_requests = PullRequestCounts::new(2, 5, 1);
        s.tag_count = 4;
        s.release_count = 3;
        s.commit_count = 120;
        s.latest_commit_sha = "abc123".to_string();
        s.branch_protection_rule_count = 2;
        s.webhook_count = 1;
        s.lfs_object_count = 9;
        s
    }

    fn identity() -> RepositoryIdentity {
        RepositoryIdentity::new("octo", "hello")
    }

    #[tokio::test]
    async fn test_all_metrics_succeed() {
        let mock = MockMetricProvider::new(values());
        let outcome = retrieve_snapshot(&mock, identity(), "source", &RetrievalOptions::default())
            .await
            .unwrap();

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.snapshot.issue_count, 10);
        assert_eq!(outcome.snapshot.pull_requests.total(), 8);
        assert_eq!(outcome.snapshot.latest_commit_sha, "abc123");
        // LFS is not requested by default
        assert_eq!(outcome.snapshot.lfs_object_count, 0);
        assert_eq!(mock.call_counts().await.lfs_objects, 0);
        assert_eq!(mock.call_counts().await.metric_calls(), 8);
    }

    #[tokio::test]
    async fn test_single_failure_defaults_field() {
        let mock = MockMetricProvider::new(values())
            .with_failure(Metric::Webhooks)
            .await;
        let outcome = retrieve_snapshot(&mock, identity(), "source", &RetrievalOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("webhooks: "));
        assert_eq!(outcome.snapshot.webhook_count, 0);
        assert_eq!(outcome.snapshot.tag_count, 4);
    }

    #[tokio::test]
    async fn test_failed_pull_requests_default_to_zero() {
        let mock = MockMetricProvider::new(values())
            .with_failure(Metric::PullRequests)
            .await;
        let outcome = retrieve_snapshot(&mock, identity(), "target", &RetrievalOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.snapshot.pull_requests, PullRequestCounts::default());
        assert!(outcome.errors[0].starts_with("pull requests: "));
    }

    #[tokio::test]
    async fn test_total_failure_is_fatal() {
        let mock = MockMetricProvider::new(values()).failing_all().await;
        let err = retrieve_snapshot(&mock, identity(), "target", &RetrievalOptions::default())
            .await
            .unwrap_err();

        match err {
            Error::Validation(ValidationError::TotalRetrievalFailure { side, errors, .. }) => {
                assert_eq!(side, "target");
                assert_eq!(errors.len(), 8);
            }
            other => panic!("Expected TotalRetrievalFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_one_success_is_enough() {
        let mut mock = MockMetricProvider::new(values());
        for metric in Metric::ALL {
            if metric != Metric::Commits {
                mock = mock.with_failure(metric).await;
            }
        }
        let outcome = retrieve_snapshot(&mock, identity(), "source", &RetrievalOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.errors.len(), 7);
        assert_eq!(outcome.snapshot.commit_count, 120);
    }

    #[tokio::test]
    async fn test_skipped_metrics_not_requested() {
        let mock = MockMetricProvider::new(values())
            .with_failure(Metric::Issues)
            .await
            .with_failure(Metric::Releases)
            .await;
        let options = RetrievalOptions::from(&ComparisonOptions {
            skip_issues: true,
            skip_releases: true,
            skip_lfs: true,
            ..Default::default()
        });
        let outcome = retrieve_snapshot(&mock, identity(), "source", &options)
            .await
            .unwrap();

        assert!(outcome.errors.is_empty());
        let counts = mock.call_counts().await;
        assert_eq!(counts.issues, 0);
        assert_eq!(counts.releases, 0);
        assert_eq!(counts.lfs_objects, 0);
    }

    #[tokio::test]
    async fn test_lfs_requested_when_included() {
        let mock = MockMetricProvider::new(values());
        let options = RetrievalOptions {
            include_lfs: true,
            ..Default::default()
        };
        let outcome = retrieve_snapshot(&mock, identity(), "source", &options)
            .await
            .unwrap();
        assert_eq!(outcome.snapshot.lfs_object_count, 9);
    }

    #[tokio::test]
    async fn test_retrieve_pair() {
        let source: Arc<dyn MetricProvider> = Arc::new(MockMetricProvider::new(values()));
        let mut target_values = values();
        target_values.issue_count = 11;
        let target: Arc<dyn MetricProvider> = Arc::new(MockMetricProvider::new(target_values));

        let (src, tgt) = retrieve_pair(
            source,
            identity(),
            target,
            RepositoryIdentity::new("new-org", "hello"),
            RetrievalOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(src.snapshot.issue_count, 10);
        assert_eq!(tgt.snapshot.issue_count, 11);
        assert_eq!(tgt.snapshot.identity.to_string(), "new-org/hello");
    }

    #[tokio::test]
    async fn test_retrieve_pair_fails_if_either_side_fatal() {
        let source: Arc<dyn MetricProvider> = Arc::new(MockMetricProvider::new(values()));
        let target: Arc<dyn MetricProvider> =
            Arc::new(MockMetricProvider::new(values()).failing_all().await);

        let err = retrieve_pair(
            source,
            identity(),
            target,
            identity(),
            RetrievalOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("target repository"));
    }

    #[tokio::test]
    async fn test_validate_access_pair_reports_side() {
        let source = MockMetricProvider::new(values());
        let target = MockMetricProvider::new(values())
            .with_access_error(ApiError::Unauthorized)
            .await;

        let err = validate_access_pair(&source, &identity(), &target, &identity())
            .await
            .unwrap_err();
        match err {
            Error::Validation(ValidationError::AccessDenied { side, .. }) => {
                assert_eq!(side, "target")
            }
            other => panic!("Expected AccessDenied, got {:?}", other),
        }
        assert_eq!(source.call_counts().await.metric_calls(), 0);
    }

    #[tokio::test]
    async fn test_check_rate_limits() {
        let low = MockMetricProvider::new(values())
            .with_rate_limit(RateLimitStatus {
                remaining: 10,
                limit: 5000,
                reset_at: None,
            })
            .await;
        let plenty = MockMetricProvider::new(values())
            .with_rate_limit(RateLimitStatus {
                remaining: 4000,
                limit: 5000,
                reset_at: None,
            })
            .await;
        let silent = MockMetricProvider::new(values());

        let providers: [(&'static str, &dyn MetricProvider); 3] =
            [("source", &low), ("target", &plenty), ("archive", &silent)];
        let warnings = check_rate_limits(&providers, 50).await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("source"));
        assert!(warnings[0].contains("10 of 5000"));
    }

    #[tokio::test]
    async fn test_check_rate_limits_disabled() {
        let low = MockMetricProvider::new(values());
        let providers: [(&'static str, &dyn MetricProvider); 1] = [("source", &low)];
        let warnings = check_rate_limits(&providers, 0).await;
        assert!(warnings.is_empty());
        assert_eq!(low.call_counts().await.rate_limit_status, 0);
    }
}
