//! Bitbucket Server (Data Center) metric provider
//!
//! Repository identity is the project key plus repository slug. Collections
//! are paged; counts walk every page with the largest accepted page size.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::http::{build_http_client, check_status, parse_json, send_with_retry};
use super::pagination::{BITBUCKET_PAGE_LIMIT, PagedResponse};
use super::rate_limit::RateLimiterSet;
use super::{ClientSettings, MetricProvider};
use crate::error::{ApiError, Result};
use crate::validate::{PullRequestCounts, RepositoryIdentity};

/// Credentials for a Bitbucket Server instance.
#[derive(Debug, Clone)]
pub enum BitbucketAuth {
    /// HTTP access token, sent as a bearer token
    Token(String),
    Basic { username: String, password: String },
}

/// Bitbucket Server REST client for one instance.
pub struct BitbucketClient {
    http: HttpClient,
    base_url: String,
    auth: BitbucketAuth,
    limiters: RateLimiterSet,
    max_retries: u32,
}

impl BitbucketClient {
    /// Create a client for `base_url` (for example `https://bitbucket.example.com`).
    pub fn new(base_url: &str, auth: BitbucketAuth, settings: ClientSettings) -> Result<Self> {
        Ok(Self {
            http: build_http_client(&settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            limiters: RateLimiterSet::new(),
            max_retries: settings.max_retries,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            BitbucketAuth::Token(token) => builder.bearer_auth(token),
            BitbucketAuth::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }

    fn repo_path(repo: &RepositoryIdentity, suffix: &str) -> String {
        format!(
            "/rest/api/1.0/projects/{}/repos/{}{}",
            repo.owner(),
            repo.name(),
            suffix
        )
    }

    async fn get_raw(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        send_with_retry(&self.limiters, path, self.max_retries, || {
            self.authorized(self.http.request(Method::GET, &url).query(query))
        })
        .await
    }

    async fn get_page<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<PagedResponse<T>> {
        let response = check_status(self.get_raw(path, query).await?).await?;
        parse_json(response).await
    }

    /// Count every item of a paged collection.
    async fn count_paged(&self, path: &str, filters: &[(&str, &str)]) -> Result<u64> {
        let mut total = 0;
        let mut start = 0;

        loop {
            let mut query: Vec<(&str, String)> = filters
                .iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect();
            query.push(("limit", BITBUCKET_PAGE_LIMIT.to_string()));
            query.push(("start", start.to_string()));

            let page: PagedResponse<serde_json::Value> = self.get_page(path, &query).await?;
            total += page.page_len();

            match page.next_start() {
                Some(next) if next > start => start = next,
                _ => break,
            }
        }

        debug!("{} -> {} items", path, total);
        Ok(total)
    }

    async fn pull_requests_in_state(&self, repo: &RepositoryIdentity, state: &str) -> Result<u64> {
        self.count_paged(&Self::repo_path(repo, "/pull-requests"), &[("state", state)])
            .await
    }
}

#[async_trait]
impl MetricProvider for BitbucketClient {
    fn name(&self) -> &'static str {
        "Bitbucket Server"
    }

    async fn validate_access(&self, repo: &RepositoryIdentity) -> Result<()> {
        let response = self.get_raw(&Self::repo_path(repo, ""), &[]).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(repo.to_string()).into());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn issue_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        Err(ApiError::Unsupported("Issues".to_string()).into())
    }

    async fn pull_request_counts(&self, repo: &RepositoryIdentity) -> Result<PullRequestCounts> {
        let (open, merged, declined) = tokio::try_join!(
            self.pull_requests_in_state(repo, "OPEN"),
            self.pull_requests_in_state(repo, "MERGED"),
            self.pull_requests_in_state(repo, "DECLINED"),
        )?;
        Ok(PullRequestCounts::new(open, merged, declined))
    }

    async fn tag_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        self.count_paged(&Self::repo_path(repo, "/tags"), &[]).await
    }

    async fn release_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        Err(ApiError::Unsupported("Releases".to_string()).into())
    }

    async fn commit_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        self.count_paged(&Self::repo_path(repo, "/commits"), &[])
            .await
    }

    async fn latest_commit_sha(&self, repo: &RepositoryIdentity) -> Result<String> {
        #[derive(Deserialize)]
        struct Commit {
            id: String,
        }

        let page: PagedResponse<Commit> = self
            .get_page(
                &Self::repo_path(repo, "/commits"),
                &[("limit", "1".to_string())],
            )
            .await?;
        Ok(page
            .values
            .into_iter()
            .next()
            .map(|c| c.id)
            .unwrap_or_default())
    }

    async fn branch_protection_rule_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        let path = format!(
            "/rest/branch-permissions/2.0/projects/{}/repos/{}/restrictions",
            repo.owner(),
            repo.name()
        );
        self.count_paged(&path, &[]).await
    }

    async fn webhook_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        self.count_paged(&Self::repo_path(repo, "/webhooks"), &[])
            .await
    }

    async fn lfs_object_count(&self, _repo: &RepositoryIdentity) -> Result<u64> {
        Err(ApiError::Unsupported("LFS object counting".to_string()).into())
    }
}
