//! Request execution shared by the provider clients

use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::ClientSettings;
use super::rate_limit::{
    EndpointCategory, RateLimiterSet, backoff_delay, is_rate_limited, retry_after,
};
use crate::error::{ApiError, Result};

/// Build the underlying HTTP client with the configured timeout.
pub(crate) fn build_http_client(settings: &ClientSettings) -> Result<HttpClient> {
    let http = HttpClient::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .user_agent(concat!("migval/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ApiError::Network(e.to_string()))?;
    Ok(http)
}

/// Send a request, sleeping and retrying on rate-limit responses.
///
/// `build` is called once per attempt. Non-rate-limit responses are returned
/// as-is, whatever their status; pass them through [`check_status`].
pub(crate) async fn send_with_retry<F>(
    limiters: &RateLimiterSet,
    path: &str,
    max_retries: u32,
    build: F,
) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let category = EndpointCategory::from_path(path);
    let mut attempt = 0;

    loop {
        limiters.wait_for(category).await;
        debug!("Requesting {}", path);
        let response = build().send().await.map_err(ApiError::from)?;

        if !is_rate_limited(response.status(), response.headers()) {
            return Ok(response);
        }

        limiters.activate(category).await;
        let delay = backoff_delay(attempt, retry_after(response.headers()));
        if attempt >= max_retries {
            return Err(ApiError::RateLimit(delay).into());
        }

        warn!(
            "Rate limited on {} (attempt {}/{}), retrying in {:?}",
            path,
            attempt + 1,
            max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Map a non-success response to an [`ApiError`].
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let err = match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => ApiError::NotFound(path),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Bad request".to_string());
            ApiError::BadRequest(body)
        }
        status if status.is_server_error() => {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| format!("Server error: {}", status));
            ApiError::ServerError(body)
        }
        _ => ApiError::InvalidResponse(format!("Unexpected status code: {}", status)),
    };
    Err(err.into())
}

/// Decode a JSON body.
pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let data = response
        .json::<T>()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    Ok(data)
}
