use core::fmt::{Display, Formatter};
use std::sync::Arc;
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// A code-hosting platform that can be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, StrumDisplay, EnumIter, EnumString, IntoStaticStr, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
#[value(rename_all = "lower")]
pub enum Platform {
    GitHub,
    GitLab,
    Codeberg,
    SourceForge,
}

impl Platform {
    /// Human-readable platform name for log and progress messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
            Self::Codeberg => "Codeberg",
            Self::SourceForge => "SourceForge",
        }
    }
}

/// Identity of a repository, scoped to the platform that reported it.
///
/// Two platforms can host unrelated repositories with the same key, so the platform is part of
/// the identity and mirrors are never unified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoIdentity {
    platform: Platform,
    key: Arc<str>,
}

impl RepoIdentity {
    #[must_use]
    pub fn new(platform: Platform, key: impl Into<Arc<str>>) -> Self {
        Self { platform, key: key.into() }
    }

    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for RepoIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.platform, self.key)
    }
}

/// The minimal identifying record for a repository returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    identity: RepoIdentity,
    display_url: Arc<str>,
    owner: Arc<str>,
    name: Arc<str>,
}

impl RepositoryDescriptor {
    #[must_use]
    pub fn new(identity: RepoIdentity, display_url: impl Into<Arc<str>>, owner: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            identity,
            display_url: display_url.into(),
            owner: owner.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub const fn identity(&self) -> &RepoIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.identity.platform
    }

    #[must_use]
    pub fn display_url(&self) -> &str {
        &self.display_url
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source label prefix for content found in this repository (`owner/repo`).
    #[must_use]
    pub fn label(&self) -> String {
        if self.owner.is_empty() {
            self.name.to_string()
        } else {
            format!("{}/{}", self.owner, self.name)
        }
    }
}

impl Display for RepositoryDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.display_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn test_identity_is_platform_scoped() {
        let github = RepoIdentity::new(Platform::GitHub, "42");
        let gitlab = RepoIdentity::new(Platform::GitLab, "42");
        assert_ne!(github, gitlab);
        assert_eq!(github, RepoIdentity::new(Platform::GitHub, "42"));
    }

    #[test]
    fn test_identity_display() {
        let id = RepoIdentity::new(Platform::Codeberg, "1234");
        assert_eq!(id.to_string(), "codeberg:1234");
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(Platform::from_str("github").unwrap(), Platform::GitHub);
        assert_eq!(Platform::from_str("sourceforge").unwrap(), Platform::SourceForge);
        assert!(Platform::from_str("bitbucket").is_err());
    }

    #[test]
    fn test_descriptor_label() {
        let repo = RepositoryDescriptor::new(
            RepoIdentity::new(Platform::GitHub, "1"),
            "https://github.com/alice/jiggle",
            "alice",
            "jiggle",
        );
        assert_eq!(repo.label(), "alice/jiggle");
        assert_eq!(repo.to_string(), "https://github.com/alice/jiggle");
    }

    #[test]
    fn test_descriptor_label_without_owner() {
        let repo = RepositoryDescriptor::new(
            RepoIdentity::new(Platform::SourceForge, "https://sourceforge.net/projects/mover/"),
            "https://sourceforge.net/projects/mover/",
            "",
            "mover",
        );
        assert_eq!(repo.label(), "mover");
    }
}
