//! Hosting API client
//!
//! Thin wrapper over `reqwest` that attaches the platform credential, classifies responses, and
//! routes every API call through the rate-limit governor.

use super::ClientSettings;
use crate::scan::descriptor::Platform;
use crate::scan::governor::{RateLimitGovernor, RateLimitSignal};
use crate::scan::request_tracker::{RequestTracker, TrackedTopic};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "    client";
const NEXT_PAGE: &str = "x-next-page";
const USER_AGENT: &str = concat!("repo-hound/", env!("CARGO_PKG_VERSION"));

/// Result of a hosting API call
#[derive(Debug)]
pub enum ApiResult<T> {
    /// Request succeeded
    Success(T),

    /// The platform signalled throttling (HTTP 403)
    RateLimited,

    /// The requested resource was not found (404)
    NotFound,

    /// Any other failure, including transport errors and undecodable bodies
    Failed(ohno::AppError),
}

impl<T> RateLimitSignal for ApiResult<T> {
    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Hosting API client (GitHub, GitLab, Codeberg, SourceForge)
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    governor: RateLimitGovernor,
    tracker: RequestTracker,
}

impl ApiClient {
    /// Create a new client with an optional authentication token.
    ///
    /// GitHub and Codeberg take `Authorization: token <t>`; GitLab takes `PRIVATE-TOKEN: <t>`.
    /// SourceForge has no credential and ignores `token`.
    pub fn new(
        platform: Platform,
        token: Option<&str>,
        base_url: impl Into<String>,
        settings: &ClientSettings,
    ) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        if platform == Platform::GitHub {
            let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        }

        if let Some((name, value)) = token.map(|t| auth_header(platform, t)).transpose()?.flatten() {
            let _ = headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            governor: RateLimitGovernor::new(settings.tracker.clone()).with_cool_down(settings.rate_limit_cool_down),
            tracker: settings.tracker.clone(),
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, url: &str) -> ApiResult<reqwest::Response> {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return ApiResult::Failed(e.into()),
        };

        match resp.status() {
            StatusCode::OK => ApiResult::Success(resp),
            StatusCode::FORBIDDEN => ApiResult::RateLimited,
            StatusCode::NOT_FOUND => ApiResult::NotFound,
            status => ApiResult::Failed(ohno::app_err!("unexpected HTTP status {status}")),
        }
    }

    /// Fetch and decode a JSON document, retrying once after a cool-down if rate limited.
    ///
    /// Every attempt is counted under `topic`; anything other than a decoded body counts as a
    /// failure and yields `None`.
    pub async fn get_json<T: DeserializeOwned>(&self, topic: TrackedTopic, url: &str) -> Option<T> {
        self.get_json_page(topic, url).await.map(|(value, _)| value)
    }

    /// Like [`get_json`](Self::get_json), also returning the page number announced in the
    /// `x-next-page` header of a paginated resource.
    pub async fn get_json_page<T: DeserializeOwned>(&self, topic: TrackedTopic, url: &str) -> Option<(T, Option<u32>)> {
        let result = self.governor.call(url, || self.try_get_json::<T>(topic, url)).await;

        match result {
            ApiResult::Success(page) => Some(page),
            ApiResult::RateLimited => {
                self.tracker.fail_request(topic);
                log::warn!(target: LOG_TARGET, "Giving up on '{url}' after rate limiting persisted");
                None
            }
            ApiResult::NotFound => {
                self.tracker.fail_request(topic);
                log::debug!(target: LOG_TARGET, "Not found: '{url}'");
                None
            }
            ApiResult::Failed(e) => {
                self.tracker.fail_request(topic);
                log::debug!(target: LOG_TARGET, "Request to '{url}' failed: {e:#}");
                None
            }
        }
    }

    async fn try_get_json<T: DeserializeOwned>(&self, topic: TrackedTopic, url: &str) -> ApiResult<(T, Option<u32>)> {
        self.tracker.add_request(topic);
        match self.api_call(url).await {
            ApiResult::Success(resp) => {
                let next = next_page(resp.headers());
                match resp.json::<T>().await {
                    Ok(value) => ApiResult::Success((value, next)),
                    Err(e) => ApiResult::Failed(e.into()),
                }
            }
            ApiResult::RateLimited => ApiResult::RateLimited,
            ApiResult::NotFound => ApiResult::NotFound,
            ApiResult::Failed(e) => ApiResult::Failed(e),
        }
    }
}

/// GitLab leaves `x-next-page` empty on the last page.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers.get(NEXT_PAGE)?.to_str().ok()?.trim().parse().ok()
}

fn auth_header(platform: Platform, token: &str) -> crate::Result<Option<(HeaderName, HeaderValue)>> {
    let (name, value) = match platform {
        Platform::GitHub | Platform::Codeberg => (AUTHORIZATION, format!("token {token}")),
        Platform::GitLab => (HeaderName::from_static("private-token"), token.to_string()),
        Platform::SourceForge => return Ok(None),
    };

    let mut value = HeaderValue::from_str(&value)?;
    value.set_sensitive(true);
    Ok(Some((name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn settings() -> ClientSettings {
        ClientSettings::new(Duration::from_secs(10), RequestTracker::new())
    }

    #[test]
    fn test_client_new_without_token() {
        let client = ApiClient::new(Platform::GitHub, None, "https://api.github.com", &settings()).unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn test_client_new_with_token() {
        let client = ApiClient::new(
            Platform::Codeberg,
            Some("test_token"),
            "https://codeberg.org/api/v1",
            &settings(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://codeberg.org/api/v1");
    }

    #[test]
    fn test_auth_header_github_and_codeberg() {
        for platform in [Platform::GitHub, Platform::Codeberg] {
            let (name, value) = auth_header(platform, "abc").unwrap().unwrap();
            assert_eq!(name, AUTHORIZATION);
            assert_eq!(value.to_str().unwrap(), "token abc");
            assert!(value.is_sensitive());
        }
    }

    #[test]
    fn test_auth_header_gitlab() {
        let (name, value) = auth_header(Platform::GitLab, "glpat-xyz").unwrap().unwrap();
        assert_eq!(name.as_str(), "private-token");
        assert_eq!(value.to_str().unwrap(), "glpat-xyz");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_auth_header_sourceforge_has_none() {
        assert!(auth_header(Platform::SourceForge, "ignored").unwrap().is_none());
    }

    #[test]
    fn test_auth_header_rejects_invalid_token() {
        let _ = auth_header(Platform::GitHub, "bad\ntoken").unwrap_err();
    }

    #[test]
    fn test_api_result_rate_limit_signal() {
        assert!(ApiResult::<()>::RateLimited.is_rate_limited());
        assert!(!ApiResult::Success(()).is_rate_limited());
        assert!(!ApiResult::<()>::NotFound.is_rate_limited());
        assert!(!ApiResult::<()>::Failed(ohno::app_err!("boom")).is_rate_limited());
    }

    #[test]
    fn test_next_page_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page(&headers), None);

        let _ = headers.insert(NEXT_PAGE, HeaderValue::from_static("2"));
        assert_eq!(next_page(&headers), Some(2));

        let _ = headers.insert(NEXT_PAGE, HeaderValue::from_static(""));
        assert_eq!(next_page(&headers), None);
    }
}
