//! Concrete providers for the supported hosting platforms.

mod client;
mod forge;
mod gitlab;
mod sourceforge;

pub use client::{ApiClient, ApiResult};
pub use forge::{ForgeHost, ForgeProvider};
pub use gitlab::GitLabProvider;
pub use sourceforge::SourceForgeProvider;

use super::descriptor::Platform;
use super::governor::RATE_LIMIT_COOL_DOWN;
use super::provider::Provider;
use super::request_tracker::RequestTracker;
use core::time::Duration;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::sync::Arc;

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Percent-encode a single path segment or query value.
pub(crate) fn encode(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Default API base URL of a platform.
#[must_use]
pub fn default_base_url(platform: Platform) -> &'static str {
    match platform {
        Platform::GitHub | Platform::Codeberg => ForgeHost::for_platform(platform).map_or("", |h| h.base_url),
        Platform::GitLab => gitlab::DEFAULT_BASE_URL,
        Platform::SourceForge => sourceforge::DEFAULT_BASE_URL,
    }
}

/// Connection settings shared by every provider of a run.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub request_timeout: Duration,

    /// Wait before the single retry of a rate-limited call; always [`RATE_LIMIT_COOL_DOWN`] outside tests
    pub rate_limit_cool_down: Duration,

    pub tracker: RequestTracker,
}

impl ClientSettings {
    #[must_use]
    pub const fn new(request_timeout: Duration, tracker: RequestTracker) -> Self {
        Self {
            request_timeout,
            rate_limit_cool_down: RATE_LIMIT_COOL_DOWN,
            tracker,
        }
    }
}

/// Build the provider for `platform`.
///
/// `base_url` overrides the platform's public API endpoint, e.g. for a self-hosted instance.
pub fn create_provider(
    platform: Platform,
    token: Option<&str>,
    base_url: Option<&str>,
    settings: &ClientSettings,
) -> crate::Result<Arc<dyn Provider>> {
    let base_url = base_url.unwrap_or_else(|| default_base_url(platform)).trim_end_matches('/');
    let client = ApiClient::new(platform, token, base_url, settings)?;

    Ok(match platform {
        Platform::GitHub | Platform::Codeberg => {
            let host = *ForgeHost::for_platform(platform).ok_or_else(|| ohno::app_err!("no forge host for {platform}"))?;
            Arc::new(ForgeProvider::new(host, client))
        }
        Platform::GitLab => Arc::new(GitLabProvider::new(client)),
        Platform::SourceForge => Arc::new(SourceForgeProvider::new(client)),
    })
}
