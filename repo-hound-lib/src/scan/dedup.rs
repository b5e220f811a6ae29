//! Run-scoped de-duplication of repositories and fetched content.
//!
//! Both sets only ever grow. Admission is a single test-and-set under a lock, so each identity or
//! digest is admitted at most once even if callers race.

use super::descriptor::RepoIdentity;
use super::digest::Digest;
use crate::HashSet;
use core::hash::Hash;
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
struct SeenSet<T> {
    items: Mutex<HashSet<T>>,
}

impl<T: Eq + Hash> SeenSet<T> {
    fn new() -> Self {
        Self {
            items: Mutex::new(HashSet::default()),
        }
    }

    fn insert(&self, item: T) -> bool {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).insert(item)
    }

    fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Repositories already admitted for processing in this run.
#[derive(Debug)]
pub struct SeenRepositories(SeenSet<RepoIdentity>);

impl SeenRepositories {
    #[must_use]
    pub fn new() -> Self {
        Self(SeenSet::new())
    }

    /// Returns `true` the first time `identity` is seen, `false` on every later call.
    pub fn admit(&self, identity: &RepoIdentity) -> bool {
        self.0.insert(identity.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenRepositories {
    fn default() -> Self {
        Self::new()
    }
}

/// Content digests already reported in this run.
#[derive(Debug)]
pub struct SeenDigests(SeenSet<Digest>);

impl SeenDigests {
    #[must_use]
    pub fn new() -> Self {
        Self(SeenSet::new())
    }

    /// Digest `bytes`; returns the digest if it was not seen before, `None` if it is suppressed.
    pub fn admit_digest(&self, bytes: &[u8]) -> Option<Digest> {
        let digest = Digest::of(bytes);
        self.0.insert(digest).then_some(digest)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenDigests {
    fn default() -> Self {
        Self::new()
    }
}
