//! GitHub and Codeberg (Gitea) provider.
//!
//! Both platforms expose the same repository, contents, and releases resources; they differ only
//! in the search endpoint, its paging parameter, and the envelope around search hits.

use super::client::ApiClient;
use super::encode;
use crate::scan::descriptor::{Platform, RepoIdentity, RepositoryDescriptor};
use crate::scan::provider::Provider;
use crate::scan::request_tracker::TrackedTopic;
use crate::scan::tree::{FileSource, Release, ReleaseAsset, TreeEntry};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const LOG_TARGET: &str = "    search";

/// Configuration for a specific forge
#[derive(Debug, Clone, Copy)]
pub struct ForgeHost {
    pub platform: Platform,
    /// Base API URL
    pub base_url: &'static str,
    /// Path of the repository search resource
    search_path: &'static str,
    /// Query parameters selecting the ranking order
    sort_params: &'static str,
    /// Name of the page-size parameter
    limit_param: &'static str,
}

/// Supported forges
static SUPPORTED_HOSTS: &[ForgeHost] = &[
    ForgeHost {
        platform: Platform::GitHub,
        base_url: "https://api.github.com",
        search_path: "/search/repositories",
        sort_params: "sort=stars",
        limit_param: "per_page",
    },
    ForgeHost {
        platform: Platform::Codeberg,
        base_url: "https://codeberg.org/api/v1",
        search_path: "/repos/search",
        sort_params: "sort=stars&order=desc",
        limit_param: "limit",
    },
];

impl ForgeHost {
    #[must_use]
    pub fn for_platform(platform: Platform) -> Option<&'static Self> {
        SUPPORTED_HOSTS.iter().find(|h| h.platform == platform)
    }
}

/// Search results; GitHub wraps hits in `items`, Gitea in `data`.
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(alias = "data", default)]
    items: Vec<ForgeRepo>,
}

#[derive(Debug, Deserialize)]
struct ForgeRepo {
    id: u64,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    full_name: String,
    owner: Option<ForgeOwner>,
}

#[derive(Debug, Deserialize)]
struct ForgeOwner {
    login: String,
}

/// The contents resource answers with a listing for directories and a single object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentEntry>),
    File(ContentFile),
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForgeRelease {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    assets: Vec<ForgeAsset>,
}

#[derive(Debug, Deserialize)]
struct ForgeAsset {
    name: String,
    #[serde(default)]
    size: u64,
    browser_download_url: String,
}

impl ForgeRepo {
    fn into_descriptor(self, platform: Platform) -> Option<RepositoryDescriptor> {
        if self.html_url.is_empty() {
            return None;
        }

        let owner = match self.owner {
            Some(owner) => owner.login,
            None => self.full_name.split_once('/').map(|(o, _)| o.to_string()).unwrap_or_default(),
        };

        Some(RepositoryDescriptor::new(
            RepoIdentity::new(platform, self.id.to_string()),
            self.html_url,
            owner,
            self.name,
        ))
    }
}

/// Provider for GitHub-style forges
#[derive(Debug)]
pub struct ForgeProvider {
    host: ForgeHost,
    client: ApiClient,
}

impl ForgeProvider {
    #[must_use]
    pub const fn new(host: ForgeHost, client: ApiClient) -> Self {
        Self { host, client }
    }

    fn repo_url(&self, repo: &RepositoryDescriptor) -> String {
        format!("{}/repos/{}/{}", self.client.base_url(), encode(repo.owner()), encode(repo.name()))
    }

    fn contents_url(&self, repo: &RepositoryDescriptor, path: &str) -> String {
        let mut url = format!("{}/contents", self.repo_url(repo));
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(&encode(segment));
        }
        url
    }
}

#[async_trait]
impl Provider for ForgeProvider {
    fn platform(&self) -> Platform {
        self.host.platform
    }

    async fn search(&self, term: &str, max_results: u8) -> Vec<RepositoryDescriptor> {
        let url = format!(
            "{}{}?q={}&{}&{}={max_results}",
            self.client.base_url(),
            self.host.search_path,
            encode(term),
            self.host.sort_params,
            self.host.limit_param,
        );

        let Some(envelope) = self.client.get_json::<SearchEnvelope>(TrackedTopic::Search, &url).await else {
            return Vec::new();
        };

        let hits: Vec<_> = envelope
            .items
            .into_iter()
            .filter_map(|repo| repo.into_descriptor(self.host.platform))
            .take(usize::from(max_results))
            .collect();

        log::debug!(target: LOG_TARGET, "{} search for '{term}' returned {} repositories", self.host.platform.display_name(), hits.len());
        hits
    }

    async fn fetch_tree(&self, repo: &RepositoryDescriptor, path: &str) -> Vec<TreeEntry> {
        let url = self.contents_url(repo, path);
        match self.client.get_json::<ContentsResponse>(TrackedTopic::Listing, &url).await {
            Some(ContentsResponse::Listing(entries)) => entries
                .into_iter()
                .filter_map(|entry| match entry.kind.as_str() {
                    "file" => Some(TreeEntry::file(entry.path, entry.size)),
                    "dir" => Some(TreeEntry::directory(entry.path)),
                    _ => None,
                })
                .collect(),
            Some(ContentsResponse::File(_)) => {
                log::debug!(target: LOG_TARGET, "Expected a directory listing at '{path}' in {repo}, got a file");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    async fn fetch_releases(&self, repo: &RepositoryDescriptor) -> Vec<Release> {
        let url = format!("{}/releases", self.repo_url(repo));
        let Some(releases) = self.client.get_json::<Vec<ForgeRelease>>(TrackedTopic::Release, &url).await else {
            return Vec::new();
        };

        releases
            .into_iter()
            .map(|release| Release {
                tag: release.tag_name,
                assets: release
                    .assets
                    .into_iter()
                    .filter_map(|asset| {
                        let download_url = Url::parse(&asset.browser_download_url).ok()?;
                        Some(ReleaseAsset {
                            name: asset.name,
                            size_bytes: asset.size,
                            download_url,
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    async fn describe_file(&self, repo: &RepositoryDescriptor, path: &str) -> Option<FileSource> {
        let url = self.contents_url(repo, path);
        match self.client.get_json::<ContentsResponse>(TrackedTopic::File, &url).await? {
            ContentsResponse::File(file) => {
                let inline_base64 = file
                    .content
                    .filter(|c| !c.is_empty() && file.encoding.as_deref().is_none_or(|e| e == "base64"));
                let download_url = file.download_url.and_then(|u| Url::parse(&u).ok());
                Some(FileSource {
                    inline_base64,
                    download_url,
                })
            }
            ContentsResponse::Listing(_) => {
                log::debug!(target: LOG_TARGET, "Expected a file at '{path}' in {repo}, got a directory listing");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_envelope_github() {
        let json = r#"{
            "total_count": 1,
            "items": [
                { "id": 7, "html_url": "https://github.com/alice/jiggle", "name": "jiggle",
                  "full_name": "alice/jiggle", "owner": { "login": "alice" } }
            ]
        }"#;

        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        let repo = envelope.items.into_iter().next().unwrap().into_descriptor(Platform::GitHub).unwrap();
        assert_eq!(repo.identity(), &RepoIdentity::new(Platform::GitHub, "7"));
        assert_eq!(repo.label(), "alice/jiggle");
    }

    #[test]
    fn test_search_envelope_codeberg() {
        let json = r#"{
            "ok": true,
            "data": [
                { "id": 99, "html_url": "https://codeberg.org/bob/mover", "name": "mover", "full_name": "bob/mover" }
            ]
        }"#;

        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        let repo = envelope.items.into_iter().next().unwrap().into_descriptor(Platform::Codeberg).unwrap();
        assert_eq!(repo.owner(), "bob");
        assert_eq!(repo.display_url(), "https://codeberg.org/bob/mover");
    }

    #[test]
    fn test_search_hit_without_url_is_dropped() {
        let json = r#"{ "items": [ { "id": 1, "name": "x" } ] }"#;
        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.items.into_iter().next().unwrap().into_descriptor(Platform::GitHub).is_none());
    }

    #[test]
    fn test_contents_listing_vs_file() {
        let listing: ContentsResponse = serde_json::from_str(r#"[{ "type": "dir", "name": "src", "path": "src" }]"#).unwrap();
        assert!(matches!(listing, ContentsResponse::Listing(ref v) if v.len() == 1));

        let file: ContentsResponse =
            serde_json::from_str(r#"{ "type": "file", "content": "aGk=\n", "encoding": "base64", "download_url": null }"#).unwrap();
        assert!(matches!(file, ContentsResponse::File(ContentFile { content: Some(_), .. })));
    }

    #[test]
    fn test_host_table() {
        assert_eq!(ForgeHost::for_platform(Platform::GitHub).unwrap().base_url, "https://api.github.com");
        assert_eq!(ForgeHost::for_platform(Platform::Codeberg).unwrap().base_url, "https://codeberg.org/api/v1");
        assert!(ForgeHost::for_platform(Platform::GitLab).is_none());
    }
}
