//! Search, crawl, and de-duplication engine.
//!
//! # Implementation Model
//!
//! Every hosting platform sits behind the [`Provider`] capability trait, with concrete
//! implementations in [`hosting`]. All provider API calls go through a [`RateLimitGovernor`], which
//! answers a throttling response with one fixed cool-down and exactly one retry.
//!
//! The [`Scanner`] drives a run: each search term is sent to every provider in turn, hits are
//! screened by the [`ExclusionFilter`] and [`SeenRepositories`], and admitted repositories are
//! walked by the [`TreeCrawler`] to a fixed depth. Candidate files and release assets are fetched by
//! the [`ContentFetcher`], digested, and screened by [`SeenDigests`] before being reported to a
//! [`RecordSink`].
//!
//! A run never fails because of a provider: errors and unexpected response shapes turn into empty
//! results and are counted by the [`RequestTracker`].

mod crawler;
mod dedup;
mod descriptor;
mod digest;
mod exclusion;
mod fetcher;
mod governor;
pub mod hosting;
mod orchestrator;
mod progress;
mod provider;
mod request_tracker;
mod tree;

pub use crawler::{CrawlRules, MAX_DEPTH, TreeCrawler, TreeWalk};
pub use dedup::{SeenDigests, SeenRepositories};
pub use descriptor::{Platform, RepoIdentity, RepositoryDescriptor};
pub use digest::Digest;
pub use exclusion::ExclusionFilter;
pub use fetcher::{ContentFetcher, FetchSettings, FetchedContent};
pub use governor::{RATE_LIMIT_COOL_DOWN, RateLimitGovernor, RateLimitSignal};
pub use orchestrator::{RecordSink, ScanMode, ScanPlan, ScanSummary, Scanner};
pub use progress::{NoProgress, Progress};
pub use provider::Provider;
pub use request_tracker::{RequestTracker, TopicCount, TrackedTopic};
pub use tree::{Candidate, EntryKind, FileSource, Release, ReleaseAsset, TreeEntry};
