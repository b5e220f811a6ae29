use super::descriptor::{Platform, RepositoryDescriptor};
use super::tree::{FileSource, Release, TreeEntry};
use async_trait::async_trait;
use core::fmt::Debug;

/// Search and content capabilities of one hosting platform.
///
/// None of these operations fail: a non-success response, a malformed body, or an unexpected
/// response shape yields an empty result (or `None`), and the run moves on.
#[async_trait]
pub trait Provider: Debug + Send + Sync {
    fn platform(&self) -> Platform;

    /// Search repositories matching `term`, in the platform's own ranking order.
    ///
    /// `max_results` is a soft cap; fewer results may be returned, never more.
    async fn search(&self, term: &str, max_results: u8) -> Vec<RepositoryDescriptor>;

    /// List the entries of the directory at `path` (empty string for the root).
    async fn fetch_tree(&self, _repo: &RepositoryDescriptor, _path: &str) -> Vec<TreeEntry> {
        Vec::new()
    }

    /// List releases, most recent first, each with its downloadable assets.
    async fn fetch_releases(&self, _repo: &RepositoryDescriptor) -> Vec<Release> {
        Vec::new()
    }

    /// Describe how to obtain the bytes of the file at `path`.
    async fn describe_file(&self, _repo: &RepositoryDescriptor, _path: &str) -> Option<FileSource> {
        None
    }
}
