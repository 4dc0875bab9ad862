//! Mock metric provider for testing
//!
//! Serves metric values from a snapshot and fails selected metrics on demand,
//! without making network calls.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{MetricProvider, RateLimitStatus};
use crate::error::{ApiError, Result};
use crate::validate::retrieve::Metric;
use crate::validate::snapshot::RepositorySnapshot;
use crate::validate::{PullRequestCounts, RepositoryIdentity};

/// Mock provider for testing.
///
/// # Example
/// ```ignore
/// let mock = MockMetricProvider::new(snapshot)
///     .with_failure(Metric::Tags)
///     .await;
/// assert!(mock.tag_count(&repo).await.is_err());
/// ```
pub struct MockMetricProvider {
    /// Values to serve; the identity is ignored
    values: Arc<Mutex<RepositorySnapshot>>,
    /// Metrics that always fail
    failures: Arc<Mutex<HashSet<Metric>>>,
    /// Error returned by validate_access, consumed on first use
    access_error: Arc<Mutex<Option<ApiError>>>,
    rate_limit: Arc<Mutex<Option<RateLimitStatus>>>,
    call_count: Arc<Mutex<CallCounts>>,
}

/// Tracks provider call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub validate_access: usize,
    pub issues: usize,
    pub pull_requests: usize,
    pub tags: usize,
    pub releases: usize,
    pub commits: usize,
    pub latest_commit_sha: usize,
    pub branch_protection_rules: usize,
    pub webhooks: usize,
    pub lfs_objects: usize,
    pub rate_limit_status: usize,
}

impl CallCounts {
    /// Metric calls, excluding access checks and rate limit queries.
    pub fn metric_calls(&self) -> usize {
        self.issues
            + self.pull_requests
            + self.tags
            + self.releases
            + self.commits
            + self.latest_commit_sha
            + self.branch_protection_rules
            + self.webhooks
            + self.lfs_objects
    }
}

impl MockMetricProvider {
    pub fn new(values: RepositorySnapshot) -> Self {
        Self {
            values: Arc::new(Mutex::new(values)),
            failures: Arc::new(Mutex::new(HashSet::new())),
            access_error: Arc::new(Mutex::new(None)),
            rate_limit: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(CallCounts::default())),
        }
    }

    /// Make one metric fail on every call.
    pub async fn with_failure(self, metric: Metric) -> Self {
        self.failures.lock().await.insert(metric);
        self
    }

    /// Make every metric fail.
    pub async fn failing_all(self) -> Self {
        self.failures.lock().await.extend(Metric::ALL);
        self
    }

    pub async fn with_access_error(self, error: ApiError) -> Self {
        *self.access_error.lock().await = Some(error);
        self
    }

    pub async fn with_rate_limit(self, status: RateLimitStatus) -> Self {
        *self.rate_limit.lock().await = Some(status);
        self
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    async fn check_failure(&self, metric: Metric) -> Result<()> {
        if self.failures.lock().await.contains(&metric) {
            return Err(ApiError::ServerError(format!("{} unavailable", metric.label())).into());
        }
        Ok(())
    }
}

#[async_trait]
impl MetricProvider for MockMetricProvider {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn validate_access(&self, _repo: &RepositoryIdentity) -> Result<()> {
        self.call_count.lock().await.validate_access += 1;
        match self.access_error.lock().await.take() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    async fn issue_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        self.call_count.lock().await.issues += 1;
        self.check_failure(Metric::Issues).await?;
        Ok(self.values.lock().await.issue_count)
    }

    async fn pull_request_counts(&self, _repo: &RepositoryIdentity) -> Result<PullRequestCounts> {
        self.call_count.lock().await.pull_requests += 1;
        self.check_failure(Metric::PullRequests).await?;
        Ok(self.values.lock().await.pull_requests)
    }

    async fn tag_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        self.call_count.lock().await.tags += 1;
        self.check_failure(Metric::Tags).await?;
        Ok(self.values.lock().await.tag_count)
    }

    async fn release_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        self.call_count.lock().await.releases += 1;
        self.check_failure(Metric::Releases).await?;
        Ok(self.values.lock().await.release_count)
    }

    async fn commit_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        self.call_count.lock().await.commits += 1;
        self.check_failure(Metric::Commits).await?;
        Ok(self.values.lock().await.commit_count)
    }

    async fn latest_commit_sha(&self, _repo: &RepositoryIdentity) -> Result<String> {
        self.call_count.lock().await.latest_commit_sha += 1;
        self.check_failure(Metric::LatestCommitSha).await?;
        Ok(self.values.lock().await.latest_commit_sha.clone())
    }

    async fn branch_protection_rule_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        self.call_count.lock().await.branch_protection_rules += 1;
        self.check_failure(Metric::BranchProtectionRules).await?;
        Ok(self.values.lock().await.branch_protection_rule_count)
    }

    async fn webhook_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        self.call_count.lock().await.webhooks += 1;
        self.check_failure(Metric::Webhooks).await?;
        Ok(self.values.lock().await.webhook_count)
    }

    async fn lfs_object_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        self.call_count.lock().await.lfs_objects += 1;
        self.check_failure(Metric::LfsObjects).await?;
        Ok(self.values.lock().await.lfs_object_count)
    }

    async fn rate_limit_status(&self) -> Result<Option<RateLimitStatus>> {
        self.call_count.lock().await.rate_limit_status += 1;
        Ok(self.rate_limit.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> RepositorySnapshot {
        let mut s = RepositorySnapshot::new(RepositoryIdentity::new("octo", "hello"));
        s.tag_count = 4;
        s.latest_commit_sha = "abc123".to_string();
        s
    }

    #[tokio::test]
    async fn test_mock_serves_values() {
        let mock = MockMetricProvider::new(values());
        let repo = RepositoryIdentity::new("any", "repo");

        assert_eq!(mock.tag_count(&repo).await.unwrap(), 4);
        assert_eq!(mock.latest_commit_sha(&repo).await.unwrap(), "abc123");
        assert_eq!(mock.call_counts().await.metric_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mock = MockMetricProvider::new(values())
            .with_failure(Metric::Tags)
            .await;
        let repo = RepositoryIdentity::new("any", "repo");

        assert!(mock.tag_count(&repo).await.is_err());
        assert!(mock.commit_count(&repo).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_access_error_consumed() {
        let mock = MockMetricProvider::new(values())
            .with_access_error(ApiError::Forbidden)
            .await;
        let repo = RepositoryIdentity::new("any", "repo");

        assert!(mock.validate_access(&repo).await.is_err());
        assert!(mock.validate_access(&repo).await.is_ok());
    }
}
