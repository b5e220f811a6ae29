//! Bounded traversal of repository trees and release listings.
//!
//! The walk starts at the repository root (depth 0) and descends into at most [`MAX_DEPTH`]
//! levels of sub-directories, so a file three directories deep is reachable and one four
//! directories deep is not. Skipped directory names are never listed. The depth bound is the
//! only guard against cyclic listings and is not configurable.

use super::descriptor::RepositoryDescriptor;
use super::provider::Provider;
use super::tree::{EntryKind, ReleaseAsset, TreeEntry};

const LOG_TARGET: &str = "     crawl";

/// Maximum number of directory levels below the repository root that are listed.
pub const MAX_DEPTH: u32 = 3;

/// Filters applied to tree entries and release assets.
#[derive(Debug, Clone)]
pub struct CrawlRules {
    /// Allowed file extensions, lower-case with the leading dot (e.g. `.exe`).
    pub extensions: Box<[String]>,

    /// Directory names that are never entered.
    pub skip_dirs: Box<[String]>,

    /// Largest repository file that is a candidate.
    pub max_file_size: u64,

    /// Largest release asset that is a candidate.
    pub max_asset_size: u64,

    /// How many of the most recent releases are inspected.
    pub max_releases: usize,
}

impl CrawlRules {
    /// Whether `name` ends with one of the allowed extensions, ignoring case.
    #[must_use]
    pub fn has_allowed_extension(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    #[must_use]
    pub fn accepts_file(&self, entry: &TreeEntry) -> bool {
        entry.kind == EntryKind::File && entry.size_bytes <= self.max_file_size && self.has_allowed_extension(&entry.name)
    }

    #[must_use]
    pub fn accepts_asset(&self, asset: &ReleaseAsset) -> bool {
        asset.size_bytes <= self.max_asset_size && self.has_allowed_extension(&asset.name)
    }

    #[must_use]
    pub fn enters_directory(&self, entry: &TreeEntry, depth: u32) -> bool {
        entry.kind == EntryKind::Directory && depth < MAX_DEPTH && !self.skip_dirs.iter().any(|d| *d == entry.name)
    }
}

/// Produces candidate files and assets for a repository.
#[derive(Debug, Clone)]
pub struct TreeCrawler {
    rules: CrawlRules,
}

impl TreeCrawler {
    #[must_use]
    pub const fn new(rules: CrawlRules) -> Self {
        Self { rules }
    }

    /// Start a lazy walk over the repository tree.
    ///
    /// Directory listings are requested only as the walk reaches them, so callers can process
    /// each candidate before the next listing call is made.
    #[must_use]
    pub fn walk<'a>(&'a self, provider: &'a dyn Provider, repo: &'a RepositoryDescriptor) -> TreeWalk<'a> {
        TreeWalk {
            rules: &self.rules,
            provider,
            repo,
            stack: Vec::new(),
            started: false,
        }
    }

    /// Walk the whole tree and collect every candidate file.
    pub async fn candidate_files(&self, provider: &dyn Provider, repo: &RepositoryDescriptor) -> Vec<TreeEntry> {
        let mut walk = self.walk(provider, repo);
        let mut candidates = Vec::new();
        while let Some(entry) = walk.next_candidate().await {
            candidates.push(entry);
        }
        candidates
    }

    /// Release assets of the most recent releases that pass the asset filters.
    pub async fn candidate_assets(&self, provider: &dyn Provider, repo: &RepositoryDescriptor) -> Vec<ReleaseAsset> {
        provider
            .fetch_releases(repo)
            .await
            .into_iter()
            .take(self.rules.max_releases)
            .flat_map(|release| release.assets)
            .filter(|asset| {
                let accepted = self.rules.accepts_asset(asset);
                if !accepted {
                    log::trace!(target: LOG_TARGET, "Ignoring release asset '{}' of {repo}", asset.name);
                }
                accepted
            })
            .collect()
    }
}

/// Deterministic pre-order walk over a repository tree, in listing order.
#[derive(Debug)]
pub struct TreeWalk<'a> {
    rules: &'a CrawlRules,
    provider: &'a dyn Provider,
    repo: &'a RepositoryDescriptor,
    stack: Vec<(std::vec::IntoIter<TreeEntry>, u32)>,
    started: bool,
}

impl TreeWalk<'_> {
    /// Advance to the next candidate file, listing directories as they are reached.
    pub async fn next_candidate(&mut self) -> Option<TreeEntry> {
        if !self.started {
            self.started = true;
            let root = self.provider.fetch_tree(self.repo, "").await;
            self.stack.push((root.into_iter(), 0));
        }

        loop {
            let (entries, depth) = self.stack.last_mut()?;
            let depth = *depth;

            let Some(entry) = entries.next() else {
                let _ = self.stack.pop();
                continue;
            };

            match entry.kind {
                EntryKind::Directory => {
                    if self.rules.enters_directory(&entry, depth) {
                        log::debug!(target: LOG_TARGET, "Listing '{}' in {}", entry.path, self.repo);
                        let listing = self.provider.fetch_tree(self.repo, &entry.path).await;
                        self.stack.push((listing.into_iter(), depth + 1));
                    }
                }
                EntryKind::File => {
                    if self.rules.accepts_file(&entry) {
                        return Some(entry);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::descriptor::{Platform, RepoIdentity};
    use crate::scan::tree::Release;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use url::Url;

    /// Provider serving a fixed tree and recording which paths were listed.
    #[derive(Debug, Default)]
    struct FixtureProvider {
        entries: Vec<TreeEntry>,
        releases: Vec<Release>,
        listed: Mutex<Vec<String>>,
    }

    impl FixtureProvider {
        fn with_files(paths: &[(&str, u64)]) -> Self {
            let mut entries: Vec<TreeEntry> = Vec::new();
            for (path, size) in paths {
                let mut prefix = String::new();
                let parts: Vec<&str> = path.split('/').collect();
                for dir in &parts[..parts.len() - 1] {
                    if !prefix.is_empty() {
                        prefix.push('/');
                    }
                    prefix.push_str(dir);
                    if !entries.iter().any(|e| e.path == prefix) {
                        entries.push(TreeEntry::directory(prefix.clone()));
                    }
                }
                entries.push(TreeEntry::file(*path, *size));
            }
            Self {
                entries,
                ..Self::default()
            }
        }

        fn listed(&self) -> Vec<String> {
            self.listed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for FixtureProvider {
        fn platform(&self) -> Platform {
            Platform::GitHub
        }

        async fn search(&self, _term: &str, _max_results: u8) -> Vec<RepositoryDescriptor> {
            Vec::new()
        }

        async fn fetch_tree(&self, _repo: &RepositoryDescriptor, path: &str) -> Vec<TreeEntry> {
            self.listed.lock().unwrap().push(path.to_string());
            self.entries
                .iter()
                .filter(|e| {
                    let parent = e.path.rsplit_once('/').map_or("", |(parent, _)| parent);
                    parent == path
                })
                .cloned()
                .collect()
        }

        async fn fetch_releases(&self, _repo: &RepositoryDescriptor) -> Vec<Release> {
            self.releases.clone()
        }
    }

    fn rules() -> CrawlRules {
        CrawlRules {
            extensions: [".exe", ".msi", ".py", ".ps1", ".bat", ".ahk", ".jar"].map(String::from).into(),
            skip_dirs: [".git", "node_modules"].map(String::from).into(),
            max_file_size: 10_000_000,
            max_asset_size: 50_000_000,
            max_releases: 3,
        }
    }

    fn repo() -> RepositoryDescriptor {
        RepositoryDescriptor::new(RepoIdentity::new(Platform::GitHub, "1"), "https://github.com/o/r", "o", "r")
    }

    fn asset(name: &str, size_bytes: u64) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            size_bytes,
            download_url: Url::parse(&format!("https://example.com/{name}")).unwrap(),
        }
    }

    async fn paths(provider: &FixtureProvider) -> Vec<String> {
        let crawler = TreeCrawler::new(rules());
        crawler.candidate_files(provider, &repo()).await.into_iter().map(|e| e.path).collect()
    }

    #[tokio::test]
    async fn test_filters_by_extension_case_insensitively() {
        let provider = FixtureProvider::with_files(&[("jiggler.py", 500), ("readme.md", 100), ("Mover.EXE", 2000)]);
        assert_eq!(paths(&provider).await, ["jiggler.py", "Mover.EXE"]);
    }

    #[tokio::test]
    async fn test_filters_by_size_ceiling() {
        let provider = FixtureProvider::with_files(&[("ok.exe", 10_000_000), ("huge.exe", 10_000_001)]);
        assert_eq!(paths(&provider).await, ["ok.exe"]);
    }

    #[tokio::test]
    async fn test_depth_three_reachable_depth_four_not() {
        let provider = FixtureProvider::with_files(&[("a/b/c/three.py", 1), ("a/b/c/d/four.py", 1)]);
        assert_eq!(paths(&provider).await, ["a/b/c/three.py"]);
        assert!(!provider.listed().contains(&"a/b/c/d".to_string()));
    }

    #[tokio::test]
    async fn test_never_enters_skipped_directories() {
        let provider = FixtureProvider::with_files(&[
            (".git/hooks/pre-commit.py", 1),
            ("node_modules/x/run.bat", 1),
            ("src/node_modules.py", 1),
        ]);
        assert_eq!(paths(&provider).await, ["src/node_modules.py"]);

        let listed = provider.listed();
        assert!(!listed.iter().any(|p| p.starts_with(".git")));
        assert!(!listed.iter().any(|p| p.starts_with("node_modules")));
    }

    #[tokio::test]
    async fn test_walk_is_pre_order_and_deterministic() {
        let provider = FixtureProvider::with_files(&[("a/one.py", 1), ("two.py", 1), ("a/b/three.py", 1), ("four.py", 1)]);
        let first = paths(&provider).await;
        let second = paths(&provider).await;
        assert_eq!(first, ["a/one.py", "a/b/three.py", "two.py", "four.py"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_walk_is_lazy() {
        let provider = FixtureProvider::with_files(&[("first.py", 1), ("later/second.py", 1)]);
        let crawler = TreeCrawler::new(rules());
        let repo = repo();
        let mut walk = crawler.walk(&provider, &repo);

        assert_eq!(walk.next_candidate().await.unwrap().path, "first.py");
        assert_eq!(provider.listed(), [""]);

        assert_eq!(walk.next_candidate().await.unwrap().path, "later/second.py");
        assert_eq!(provider.listed(), ["", "later"]);
        assert!(walk.next_candidate().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_listing_yields_nothing() {
        let provider = FixtureProvider::default();
        assert!(paths(&provider).await.is_empty());
    }

    #[tokio::test]
    async fn test_assets_from_three_most_recent_releases() {
        let provider = FixtureProvider {
            releases: vec![
                Release { tag: "v4".into(), assets: vec![asset("v4.exe", 1), asset("notes.txt", 1)] },
                Release { tag: "v3".into(), assets: vec![asset("v3.msi", 1)] },
                Release { tag: "v2".into(), assets: vec![asset("big.exe", 50_000_001), asset("v2.jar", 50_000_000)] },
                Release { tag: "v1".into(), assets: vec![asset("v1.exe", 1)] },
            ],
            ..FixtureProvider::default()
        };

        let crawler = TreeCrawler::new(rules());
        let names: Vec<_> = crawler
            .candidate_assets(&provider, &repo())
            .await
            .into_iter()
            .map(|a| a.name)
            .collect();

        assert_eq!(names, ["v4.exe", "v3.msi", "v2.jar"]);
    }

    #[test]
    fn test_enters_directory_respects_depth() {
        let rules = rules();
        let dir = TreeEntry::directory("x");
        assert!(rules.enters_directory(&dir, 0));
        assert!(rules.enters_directory(&dir, MAX_DEPTH - 1));
        assert!(!rules.enters_directory(&dir, MAX_DEPTH));
        assert!(!rules.enters_directory(&TreeEntry::file("x.py", 1), 0));
    }
}
