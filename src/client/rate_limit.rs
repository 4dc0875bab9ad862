//! Reactive rate limiting and retry backoff for provider requests
//!
//! Limiters stay dormant until a provider answers with a rate-limit response.
//! From then on, requests in the same category are paced by a `governor`
//! quota. Different endpoint families have different budgets.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tokio::sync::RwLock;

/// Upper bound on a single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Endpoint families with separate request budgets.
///
/// GitHub documents 30 search requests per minute and 5000 core requests per
/// hour for authenticated users. GraphQL is point-based; a rule count query
/// is cheap, so it is paced like core REST. Bitbucket Server has no published
/// limit and uses `Core`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    /// /search/*
    Search,
    /// /graphql
    GraphQl,
    /// Everything else
    Core,
}

impl EndpointCategory {
    pub const ALL: [EndpointCategory; 3] = [
        EndpointCategory::Search,
        EndpointCategory::GraphQl,
        EndpointCategory::Core,
    ];

    /// Categorize a request by its API path (without the base URL).
    pub fn from_path(path: &str) -> Self {
        let path = path.split('?').next().unwrap_or(path);
        if path.starts_with("/search/") {
            EndpointCategory::Search
        } else if path.ends_with("/graphql") {
            EndpointCategory::GraphQl
        } else {
            EndpointCategory::Core
        }
    }

    /// Requests per minute once limiting is active.
    pub fn per_minute(&self) -> u32 {
        match self {
            EndpointCategory::Search => 30,
            EndpointCategory::GraphQl => 60,
            EndpointCategory::Core => 80,
        }
    }
}

/// Rate limiter state for a single endpoint category.
pub struct EndpointRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
    category: EndpointCategory,
}

impl EndpointRateLimiter {
    pub fn new(category: EndpointCategory) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(category.per_minute()).unwrap_or(NonZeroU32::MIN),
        );

        Self {
            limiter: RateLimiter::direct(quota),
            active: AtomicBool::new(false),
            category,
        }
    }

    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!("Rate limiting activated for {:?}", self.category);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if rate limiting is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            debug!("Waiting for rate limiter {:?}", self.category);
            self.limiter.until_ready().await;
        }
    }
}

/// One limiter per endpoint category, owned by a provider client.
pub struct RateLimiterSet {
    limiters: RwLock<HashMap<EndpointCategory, EndpointRateLimiter>>,
}

impl Default for RateLimiterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterSet {
    pub fn new() -> Self {
        let map = EndpointCategory::ALL
            .into_iter()
            .map(|category| (category, EndpointRateLimiter::new(category)))
            .collect();

        Self {
            limiters: RwLock::new(map),
        }
    }

    pub async fn wait_for(&self, category: EndpointCategory) {
        let limiters = self.limiters.read().await;
        if let Some(limiter) = limiters.get(&category) {
            limiter.wait_if_active().await;
        }
    }

    /// Activate pacing for a category (called on a rate-limit response).
    pub async fn activate(&self, category: EndpointCategory) {
        let limiters = self.limiters.read().await;
        if let Some(limiter) = limiters.get(&category) {
            limiter.activate();
        }
    }

    #[cfg(test)]
    pub async fn is_active(&self, category: EndpointCategory) -> bool {
        let limiters = self.limiters.read().await;
        limiters.get(&category).is_some_and(|l| l.is_active())
    }
}

/// Whether a response means "slow down" rather than a real failure.
///
/// GitHub signals an exhausted primary quota with 403 and
/// `x-ratelimit-remaining: 0`, and a secondary limit with 403 or 429 plus
/// `retry-after`. Bitbucket uses 429.
pub fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    if status != StatusCode::FORBIDDEN {
        return false;
    }
    if headers.contains_key("retry-after") {
        return true;
    }
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// `retry-after` header in seconds, if present and numeric.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Sleep before retry number `attempt` (0-based).
///
/// Honors the server's `retry-after` when given, otherwise `2^attempt`
/// seconds. Never exceeds [`MAX_BACKOFF`].
pub fn backoff_delay(attempt: u32, retry_after: Option<Duration>) -> Duration {
    let delay = retry_after.unwrap_or_else(|| Duration::from_secs(1u64 << attempt.min(6)));
    delay.min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_search_endpoints() {
        assert_eq!(
            EndpointCategory::from_path("/search/issues?q=repo:o/r"),
            EndpointCategory::Search
        );
    }

    #[test]
    fn test_graphql_endpoints() {
        assert_eq!(
            EndpointCategory::from_path("/graphql"),
            EndpointCategory::GraphQl
        );
        assert_eq!(
            EndpointCategory::from_path("/api/graphql"),
            EndpointCategory::GraphQl
        );
    }

    #[test]
    fn test_core_endpoints() {
        assert_eq!(
            EndpointCategory::from_path("/repos/octo/repo/tags?per_page=1"),
            EndpointCategory::Core
        );
        assert_eq!(
            EndpointCategory::from_path("/rest/api/1.0/projects/P/repos/r/tags"),
            EndpointCategory::Core
        );
    }

    #[test]
    fn test_endpoint_rate_limiter_activation() {
        let limiter = EndpointRateLimiter::new(EndpointCategory::Search);
        assert!(!limiter.is_active());

        limiter.activate();
        assert!(limiter.is_active());

        limiter.activate();
        assert!(limiter.is_active());
    }

    #[tokio::test]
    async fn test_rate_limiter_set_activates_one_category() {
        let set = RateLimiterSet::new();
        set.activate(EndpointCategory::Search).await;

        assert!(set.is_active(EndpointCategory::Search).await);
        assert!(!set.is_active(EndpointCategory::Core).await);

        // Dormant categories never block
        set.wait_for(EndpointCategory::Core).await;
    }

    #[test]
    fn test_is_rate_limited() {
        let empty = HeaderMap::new();
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS, &empty));
        assert!(!is_rate_limited(StatusCode::FORBIDDEN, &empty));
        assert!(!is_rate_limited(StatusCode::OK, &empty));

        let mut exhausted = HeaderMap::new();
        exhausted.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        assert!(is_rate_limited(StatusCode::FORBIDDEN, &exhausted));

        let mut remaining = HeaderMap::new();
        remaining.insert("x-ratelimit-remaining", HeaderValue::from_static("12"));
        assert!(!is_rate_limited(StatusCode::FORBIDDEN, &remaining));
    }

    #[test]
    fn test_secondary_limit_403_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("60"));
        assert!(is_rate_limited(StatusCode::FORBIDDEN, &headers));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(60)));

        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
        assert!(is_rate_limited(StatusCode::FORBIDDEN, &headers));

        assert!(!is_rate_limited(StatusCode::NOT_FOUND, &headers));
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert("retry-after", HeaderValue::from_static("17"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(17)));

        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(0, None), Duration::from_secs(1));
        assert_eq!(backoff_delay(1, None), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, None), Duration::from_secs(8));
        assert_eq!(backoff_delay(10, None), MAX_BACKOFF);
        assert_eq!(
            backoff_delay(0, Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(
            backoff_delay(0, Some(Duration::from_secs(3600))),
            MAX_BACKOFF
        );
    }
}
