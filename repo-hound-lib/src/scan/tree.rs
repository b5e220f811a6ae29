//! Transient records produced while walking a repository.

use url::Url;

/// Kind of a directory-listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a repository directory listing.
///
/// `size_bytes` is zero when the platform does not report sizes in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
}

impl TreeEntry {
    #[must_use]
    pub fn file(path: impl Into<String>, size_bytes: u64) -> Self {
        let path = path.into();
        Self {
            kind: EntryKind::File,
            name: leaf_name(&path).to_string(),
            path,
            size_bytes,
        }
    }

    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            kind: EntryKind::Directory,
            name: leaf_name(&path).to_string(),
            path,
            size_bytes: 0,
        }
    }
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub size_bytes: u64,
    pub download_url: Url,
}

/// A published release, with its assets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Release {
    pub tag: String,
    pub assets: Vec<ReleaseAsset>,
}

/// Where the bytes of a single repository file can be obtained from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSource {
    /// Base64 text embedded in the file description, if the platform inlined it.
    pub inline_base64: Option<String>,

    /// Direct download link for the raw file.
    pub download_url: Option<Url>,
}

/// A file or release asset that passed extension and size filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    File(TreeEntry),
    Asset(ReleaseAsset),
}

impl Candidate {
    /// Path of the candidate relative to its repository, used in source labels.
    #[must_use]
    pub fn relative_label(&self) -> String {
        match self {
            Self::File(entry) => entry.path.clone(),
            Self::Asset(asset) => format!("releases/{}", asset.name),
        }
    }
}
