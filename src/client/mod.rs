//! Metric provider clients for GitHub and Bitbucket Server

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validate::{PullRequestCounts, RepositoryIdentity};

pub mod bitbucket;
pub mod github;
mod http;
#[cfg(test)]
pub mod mock;
pub mod pagination;
pub mod rate_limit;

pub use bitbucket::{BitbucketAuth, BitbucketClient};
pub use github::GitHubClient;
#[cfg(test)]
pub use mock::MockMetricProvider;

/// Shared HTTP client settings
#[derive(Debug, Clone, Copy)]
pub struct ClientSettings {
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Retries after a rate-limit response before giving up
    pub max_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Remaining request budget reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub remaining: u64,
    pub limit: u64,
    pub reset_at: Option<DateTime<Utc>>,
}

/// One repository hosting system, queried one metric at a time.
///
/// Every call is independent: a failure in one says nothing about the others.
/// Implementations own their retry and backoff policy.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Short provider name for log and error messages
    fn name(&self) -> &'static str;

    /// Confirm the repository exists and the credentials can read it.
    async fn validate_access(&self, repo: &RepositoryIdentity) -> Result<()>;

    async fn issue_count(&self, repo: &RepositoryIdentity) -> Result<u64>;

    async fn pull_request_counts(&self, repo: &RepositoryIdentity) -> Result<PullRequestCounts>;

    async fn tag_count(&self, repo: &RepositoryIdentity) -> Result<u64>;

    async fn release_count(&self, repo: &RepositoryIdentity) -> Result<u64>;

    async fn commit_count(&self, repo: &RepositoryIdentity) -> Result<u64>;

    /// SHA of the newest commit on the default branch, empty for an empty repository.
    async fn latest_commit_sha(&self, repo: &RepositoryIdentity) -> Result<String>;

    async fn branch_protection_rule_count(&self, repo: &RepositoryIdentity) -> Result<u64>;

    async fn webhook_count(&self, repo: &RepositoryIdentity) -> Result<u64>;

    async fn lfs_object_count(&self, repo: &RepositoryIdentity) -> Result<u64>;

    /// Remaining request budget, if the provider reports one.
    async fn rate_limit_status(&self) -> Result<Option<RateLimitStatus>> {
        Ok(None)
    }
}
