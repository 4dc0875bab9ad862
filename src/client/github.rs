//! GitHub metric provider (REST v3 + GraphQL)
//!
//! Works against github.com and GitHub Enterprise Server. Counts come from
//! cheap `per_page=1` requests and the `Link` header, or from the search API
//! where a state filter is needed.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose;
use chrono::DateTime;
use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::http::{build_http_client, check_status, parse_json, send_with_retry};
use super::pagination::last_page_from_link;
use super::rate_limit::RateLimiterSet;
use super::{ClientSettings, MetricProvider, RateLimitStatus};
use crate::error::{ApiError, Result};
use crate::validate::{PullRequestCounts, RepositoryIdentity};

/// Public GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

const BRANCH_PROTECTION_QUERY: &str = r#"query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    branchProtectionRules { totalCount }
  }
}"#;

/// GitHub API client for one host and one token.
pub struct GitHubClient {
    http: HttpClient,
    api_url: String,
    graphql_url: String,
    token: String,
    limiters: RateLimiterSet,
    max_retries: u32,
}

impl GitHubClient {
    /// Create a client. `api_url` defaults to github.com; for GHES pass
    /// `https://host/api/v3`.
    pub fn new(
        token: impl Into<String>,
        api_url: Option<&str>,
        settings: ClientSettings,
    ) -> Result<Self> {
        let api_url = api_url
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http: build_http_client(&settings)?,
            graphql_url: graphql_url(&api_url),
            api_url,
            token: token.into(),
            limiters: RateLimiterSet::new(),
            max_retries: settings.max_retries,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// GET `path` with query parameters, retrying on rate limits. The
    /// response is returned unchecked.
    async fn get_raw(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = format!("{}{}", self.api_url, path);
        send_with_retry(&self.limiters, path, self.max_retries, || {
            self.authorized(self.http.request(Method::GET, &url).query(query))
        })
        .await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = check_status(self.get_raw(path, query).await?).await?;
        parse_json(response).await
    }

    /// Count a list endpoint by requesting one item per page.
    ///
    /// `Ok(None)` means the endpoint answered 409 (empty repository).
    async fn count_list(&self, path: &str) -> Result<Option<u64>> {
        let response = self.get_raw(path, &[("per_page", "1")]).await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(None);
        }
        let response = check_status(response).await?;

        let last_page = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(last_page_from_link);
        if let Some(count) = last_page {
            return Ok(Some(count));
        }

        let items: Vec<serde_json::Value> = parse_json(response).await?;
        Ok(Some(items.len() as u64))
    }

    async fn search_count(&self, query: &str) -> Result<u64> {
        #[derive(Deserialize)]
        struct SearchResponse {
            total_count: u64,
        }

        debug!("Searching issues: {}", query);
        let response: SearchResponse = self
            .get_json("/search/issues", &[("q", query), ("per_page", "1")])
            .await?;
        Ok(response.total_count)
    }

    fn repo_path(repo: &RepositoryIdentity, suffix: &str) -> String {
        format!("/repos/{}/{}{}", repo.owner(), repo.name(), suffix)
    }

    async fn default_branch(&self, repo: &RepositoryIdentity) -> Result<String> {
        #[derive(Deserialize)]
        struct RepoInfo {
            default_branch: Option<String>,
        }

        let info: RepoInfo = self.get_json(&Self::repo_path(repo, ""), &[]).await?;
        Ok(info.default_branch.unwrap_or_else(|| "main".to_string()))
    }

    /// Decoded root `.gitattributes`, or `None` if the file does not exist.
    async fn gitattributes(&self, repo: &RepositoryIdentity) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct FileContents {
            content: String,
        }

        let response = self
            .get_raw(&Self::repo_path(repo, "/contents/.gitattributes"), &[])
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let file: FileContents = parse_json(check_status(response).await?).await?;

        let encoded: String = file.content.split_whitespace().collect();
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid .gitattributes: {}", e)))?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// GraphQL endpoint for a REST base URL.
fn graphql_url(api_url: &str) -> String {
    match api_url.strip_suffix("/api/v3") {
        Some(host) => format!("{}/api/graphql", host),
        None => format!("{}/graphql", api_url),
    }
}

/// Path patterns routed through the LFS filter by a `.gitattributes` file.
fn lfs_patterns(gitattributes: &str) -> Vec<Pattern> {
    gitattributes
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let pattern = parts.next()?;
            if !parts.any(|attr| attr == "filter=lfs") {
                return None;
            }
            let pattern = match pattern.strip_prefix('/') {
                Some(anchored) => anchored.to_string(),
                None if pattern.contains('/') => pattern.to_string(),
                None => format!("**/{}", pattern),
            };
            Pattern::new(&pattern).ok()
        })
        .collect()
}

/// Count paths matching any LFS pattern.
fn count_lfs_paths<'a>(patterns: &[Pattern], paths: impl IntoIterator<Item = &'a str>) -> u64 {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    paths
        .into_iter()
        .filter(|path| patterns.iter().any(|p| p.matches_with(path, options)))
        .count() as u64
}

#[async_trait]
impl MetricProvider for GitHubClient {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn validate_access(&self, repo: &RepositoryIdentity) -> Result<()> {
        let response = check_status(self.get_raw(&Self::repo_path(repo, ""), &[]).await?).await;
        match response {
            Ok(_) => Ok(()),
            Err(crate::error::Error::Api(ApiError::NotFound(_))) => {
                Err(ApiError::NotFound(repo.to_string()).into())
            }
            Err(e) => Err(e),
        }
    }

    async fn issue_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        self.search_count(&format!("repo:{} type:issue", repo)).await
    }

    async fn pull_request_counts(&self, repo: &RepositoryIdentity) -> Result<PullRequestCounts> {
        let open_q = format!("repo:{} type:pr state:open", repo);
        let merged_q = format!("repo:{} type:pr is:merged", repo);
        let closed_q = format!("repo:{} type:pr is:unmerged state:closed", repo);

        let (open, merged, closed) = tokio::try_join!(
            self.search_count(&open_q),
            self.search_count(&merged_q),
            self.search_count(&closed_q),
        )?;
        Ok(PullRequestCounts::new(open, merged, closed))
    }

    async fn tag_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        Ok(self
            .count_list(&Self::repo_path(repo, "/tags"))
            .await?
            .unwrap_or(0))
    }

    async fn release_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        Ok(self
            .count_list(&Self::repo_path(repo, "/releases"))
            .await?
            .unwrap_or(0))
    }

    async fn commit_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        Ok(self
            .count_list(&Self::repo_path(repo, "/commits"))
            .await?
            .unwrap_or(0))
    }

    async fn latest_commit_sha(&self, repo: &RepositoryIdentity) -> Result<String> {
        #[derive(Deserialize)]
        struct Commit {
            sha: String,
        }

        let response = self
            .get_raw(&Self::repo_path(repo, "/commits"), &[("per_page", "1")])
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(String::new());
        }
        let commits: Vec<Commit> = parse_json(check_status(response).await?).await?;
        Ok(commits.into_iter().next().map(|c| c.sha).unwrap_or_default())
    }

    async fn branch_protection_rule_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Rules {
            total_count: u64,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Repository {
            branch_protection_rules: Rules,
        }
        #[derive(Deserialize)]
        struct Data {
            repository: Option<Repository>,
        }
        #[derive(Deserialize)]
        struct GraphQlError {
            message: String,
        }
        #[derive(Deserialize)]
        struct GraphQlResponse {
            data: Option<Data>,
            #[serde(default)]
            errors: Vec<GraphQlError>,
        }

        let body = json!({
            "query": BRANCH_PROTECTION_QUERY,
            "variables": { "owner": repo.owner(), "name": repo.name() },
        });
        let response = send_with_retry(&self.limiters, "/graphql", self.max_retries, || {
            self.authorized(self.http.post(&self.graphql_url).json(&body))
        })
        .await?;
        let response: GraphQlResponse = parse_json(check_status(response).await?).await?;

        if let Some(err) = response.errors.first() {
            return Err(ApiError::InvalidResponse(format!("GraphQL error: {}", err.message)).into());
        }
        response
            .data
            .and_then(|d| d.repository)
            .map(|r| r.branch_protection_rules.total_count)
            .ok_or_else(|| ApiError::NotFound(repo.to_string()).into())
    }

    async fn webhook_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        Ok(self
            .count_list(&Self::repo_path(repo, "/hooks"))
            .await?
            .unwrap_or(0))
    }

    async fn lfs_object_count(&self, repo: &RepositoryIdentity) -> Result<u64> {
        #[derive(Deserialize)]
        struct TreeEntry {
            path: String,
            #[serde(rename = "type")]
            kind: String,
        }
        #[derive(Deserialize)]
        struct Tree {
            tree: Vec<TreeEntry>,
            #[serde(default)]
            truncated: bool,
        }

        let Some(attributes) = self.gitattributes(repo).await? else {
            return Ok(0);
        };
        let patterns = lfs_patterns(&attributes);
        if patterns.is_empty() {
            return Ok(0);
        }

        let branch = self.default_branch(repo).await?;
        let tree: Tree = self
            .get_json(
                &Self::repo_path(repo, &format!("/git/trees/{}", branch)),
                &[("recursive", "1")],
            )
            .await?;
        if tree.truncated {
            warn!(
                "Tree listing for {} was truncated; LFS object count may be low",
                repo
            );
        }

        let blobs = tree
            .tree
            .iter()
            .filter(|e| e.kind == "blob")
            .map(|e| e.path.as_str());
        Ok(count_lfs_paths(&patterns, blobs))
    }

    async fn rate_limit_status(&self) -> Result<Option<RateLimitStatus>> {
        #[derive(Deserialize)]
        struct Core {
            limit: u64,
            remaining: u64,
            reset: i64,
        }
        #[derive(Deserialize)]
        struct Resources {
            core: Core,
        }
        #[derive(Deserialize)]
        struct RateLimitResponse {
            resources: Resources,
        }

        let response: RateLimitResponse = self.get_json("/rate_limit", &[]).await?;
        let core = response.resources.core;
        Ok(Some(RateLimitStatus {
            remaining: core.remaining,
            limit: core.limit,
            reset_at: DateTime::from_timestamp(core.reset, 0),
        }))
    }
}
