//! SourceForge provider.
//!
//! Search only: SourceForge projects have no contents or releases resources, so the default
//! (empty) tree and release operations apply. Hits are keyed by their canonical URL.

use super::client::ApiClient;
use super::encode;
use crate::scan::descriptor::{Platform, RepoIdentity, RepositoryDescriptor};
use crate::scan::provider::Provider;
use crate::scan::request_tracker::TrackedTopic;
use async_trait::async_trait;
use serde::Deserialize;

const LOG_TARGET: &str = "    search";

pub const DEFAULT_BASE_URL: &str = "https://sourceforge.net";

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    url: String,
    #[serde(default)]
    name: Option<String>,
}

impl SearchItem {
    fn into_descriptor(self) -> Option<RepositoryDescriptor> {
        if self.url.is_empty() {
            return None;
        }

        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| self.url.trim_end_matches('/').rsplit('/').next().map(str::to_string))
            .unwrap_or_default();

        Some(RepositoryDescriptor::new(
            RepoIdentity::new(Platform::SourceForge, self.url.as_str()),
            self.url.as_str(),
            "",
            name,
        ))
    }
}

#[derive(Debug)]
pub struct SourceForgeProvider {
    client: ApiClient,
}

impl SourceForgeProvider {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for SourceForgeProvider {
    fn platform(&self) -> Platform {
        Platform::SourceForge
    }

    async fn search(&self, term: &str, max_results: u8) -> Vec<RepositoryDescriptor> {
        let url = format!(
            "{}/api/search?q={}&format=json&limit={max_results}",
            self.client.base_url(),
            encode(term)
        );

        let Some(results) = self.client.get_json::<SearchResults>(TrackedTopic::Search, &url).await else {
            return Vec::new();
        };

        let hits: Vec<_> = results
            .items
            .into_iter()
            .filter_map(SearchItem::into_descriptor)
            .take(usize::from(max_results))
            .collect();

        log::debug!(target: LOG_TARGET, "SourceForge search for '{term}' returned {} repositories", hits.len());
        hits
    }
}
