//! GitLab provider.
//!
//! Projects are addressed by numeric id. Tree listings and release links carry no sizes, so their
//! entries report zero bytes and the download ceiling is left to the content fetcher.

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

pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4";

/// Upper bound on the tree pages requested for one directory.
const MAX_TREE_PAGES: u32 = 50;

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
    #[serde(default)]
    web_url: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    path_with_namespace: String,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    #[serde(rename = "type")]
    kind: String,
    path: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabRelease {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    assets: ReleaseAssets,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseAssets {
    #[serde(default)]
    links: Vec<AssetLink>,
}

#[derive(Debug, Deserialize)]
struct AssetLink {
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    direct_asset_url: Option<String>,
}

impl Project {
    fn into_descriptor(self) -> Option<RepositoryDescriptor> {
        if self.web_url.is_empty() {
            return None;
        }

        let (owner, name) = match self.path_with_namespace.rsplit_once('/') {
            Some((owner, name)) => (owner.to_string(), name.to_string()),
            None => (String::new(), self.path),
        };

        Some(RepositoryDescriptor::new(
            RepoIdentity::new(Platform::GitLab, self.id.to_string()),
            self.web_url,
            owner,
            name,
        ))
    }
}

/// Provider for GitLab instances
#[derive(Debug)]
pub struct GitLabProvider {
    client: ApiClient,
}

impl GitLabProvider {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn project_url(&self, repo: &RepositoryDescriptor) -> String {
        format!("{}/projects/{}", self.client.base_url(), encode(repo.identity().key()))
    }
}

#[async_trait]
impl Provider for GitLabProvider {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    async fn search(&self, term: &str, max_results: u8) -> Vec<RepositoryDescriptor> {
        let url = format!(
            "{}/projects?search={}&order_by=star_count&per_page={max_results}",
            self.client.base_url(),
            encode(term)
        );

        let Some(projects) = self.client.get_json::<Vec<Project>>(TrackedTopic::Search, &url).await else {
            return Vec::new();
        };

        let hits: Vec<_> = projects
            .into_iter()
            .filter_map(Project::into_descriptor)
            .take(usize::from(max_results))
            .collect();

        log::debug!(target: LOG_TARGET, "GitLab search for '{term}' returned {} repositories", hits.len());
        hits
    }

    async fn fetch_tree(&self, repo: &RepositoryDescriptor, path: &str) -> Vec<TreeEntry> {
        let mut base = format!("{}/repository/tree?per_page=100", self.project_url(repo));
        if !path.is_empty() {
            base.push_str("&path=");
            base.push_str(&encode(path));
        }

        let mut entries = Vec::new();
        let mut page = 1;
        loop {
            let url = format!("{base}&page={page}");
            let Some((items, next)) = self.client.get_json_page::<Vec<TreeItem>>(TrackedTopic::Listing, &url).await else {
                break;
            };

            entries.extend(items.into_iter().filter_map(|item| match item.kind.as_str() {
                "blob" => Some(TreeEntry::file(item.path, 0)),
                "tree" => Some(TreeEntry::directory(item.path)),
                _ => None,
            }));

            match next {
                Some(next) if next > page && next <= MAX_TREE_PAGES => page = next,
                Some(next) if next > MAX_TREE_PAGES => {
                    log::debug!(target: LOG_TARGET, "Stopping the listing of '{path}' in {repo} after {MAX_TREE_PAGES} pages");
                    break;
                }
                _ => break,
            }
        }

        entries
    }

    async fn fetch_releases(&self, repo: &RepositoryDescriptor) -> Vec<Release> {
        let url = format!("{}/releases", self.project_url(repo));
        let Some(releases) = self.client.get_json::<Vec<GitLabRelease>>(TrackedTopic::Release, &url).await else {
            return Vec::new();
        };

        releases
            .into_iter()
            .map(|release| Release {
                tag: release.tag_name,
                assets: release
                    .assets
                    .links
                    .into_iter()
                    .filter_map(|link| {
                        let target = link.direct_asset_url.or(link.url)?;
                        Some(ReleaseAsset {
                            name: link.name,
                            size_bytes: 0,
                            download_url: Url::parse(&target).ok()?,
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    async fn describe_file(&self, repo: &RepositoryDescriptor, path: &str) -> Option<FileSource> {
        let url = format!("{}/repository/files/{}?ref=HEAD", self.project_url(repo), encode(path));
        let file = self.client.get_json::<RepositoryFile>(TrackedTopic::File, &url).await?;

        let inline_base64 = file
            .content
            .filter(|c| !c.is_empty() && file.encoding.as_deref().is_none_or(|e| e == "base64"));

        let download_url = Url::parse(&format!("{}/repository/files/{}/raw?ref=HEAD", self.project_url(repo), encode(path))).ok();

        Some(FileSource {
            inline_base64,
            download_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_descriptor() {
        let json = r#"{ "id": 278964, "web_url": "https://gitlab.com/group/sub/jiggle", "path": "jiggle",
                        "path_with_namespace": "group/sub/jiggle" }"#;
        let repo = serde_json::from_str::<Project>(json).unwrap().into_descriptor().unwrap();
        assert_eq!(repo.identity(), &RepoIdentity::new(Platform::GitLab, "278964"));
        assert_eq!(repo.owner(), "group/sub");
        assert_eq!(repo.name(), "jiggle");
        assert_eq!(repo.label(), "group/sub/jiggle");
    }

    #[test]
    fn test_project_without_url_is_dropped() {
        let json = r#"{ "id": 1 }"#;
        assert!(serde_json::from_str::<Project>(json).unwrap().into_descriptor().is_none());
    }

    #[test]
    fn test_release_links() {
        let json = r#"[{ "tag_name": "v1", "assets": { "links": [
            { "name": "mover.exe", "url": "https://gitlab.com/x/-/releases/v1/downloads/mover.exe" },
            { "name": "bad", "url": "not a url" }
        ] } }]"#;
        let releases: Vec<GitLabRelease> = serde_json::from_str(json).unwrap();
        assert_eq!(releases[0].assets.links.len(), 2);
        assert_eq!(releases[0].tag_name, "v1");
    }
}
