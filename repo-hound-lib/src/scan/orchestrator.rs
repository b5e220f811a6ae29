//! Drives a whole run: every term against every provider, in sequence.
//!
//! Search hits are screened by the exclusion filter and then by the repository deduplicator.
//! Admitted repositories are reported and, depending on the mode, crawled; each candidate is
//! fetched, digested, and reported as soon as its digest is admitted. Nothing inside a run is
//! fatal except a failure to write output.

use super::crawler::TreeCrawler;
use super::dedup::{SeenDigests, SeenRepositories};
use super::descriptor::RepositoryDescriptor;
use super::digest::Digest;
use super::exclusion::ExclusionFilter;
use super::fetcher::ContentFetcher;
use super::progress::Progress;
use super::provider::Provider;
use super::request_tracker::{RequestTracker, TopicCount, TrackedTopic};
use super::tree::Candidate;
use crate::Result;
use core::time::Duration;
use std::sync::Arc;

const LOG_TARGET: &str = "      scan";

/// What a run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Repository URLs only; nothing is crawled.
    Repos,

    /// Content digests only.
    Hashes,

    /// Each repository URL followed by the digests found in it.
    Full,
}

impl ScanMode {
    #[must_use]
    pub const fn reports_repositories(self) -> bool {
        matches!(self, Self::Repos | Self::Full)
    }

    #[must_use]
    pub const fn crawls(self) -> bool {
        matches!(self, Self::Hashes | Self::Full)
    }
}

/// Destination of the records a run produces, in discovery order.
pub trait RecordSink {
    fn repository(&mut self, repo: &RepositoryDescriptor) -> Result<()>;

    fn digest(&mut self, digest: Digest, source_label: &str) -> Result<()>;

    /// A progress or summary line that is never data.
    fn comment(&mut self, text: &str) -> Result<()>;
}

/// Term list and pacing of a run.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub terms: Vec<String>,
    pub max_results: u8,
    pub repository_pause: Duration,
    pub term_pause: Duration,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub terms: u64,
    pub repositories: u64,
    pub excluded: u64,
    pub duplicate_repositories: u64,
    pub candidates: u64,
    pub fetched: u64,
    pub digests: u64,
    pub suppressed_digests: u64,
    pub cool_downs: u64,
    pub requests: Vec<(TrackedTopic, TopicCount)>,
}

/// Wires providers, filters, crawler, fetcher, and deduplicators together for one run.
pub struct Scanner {
    providers: Vec<Arc<dyn Provider>>,
    exclusion: ExclusionFilter,
    crawler: TreeCrawler,
    fetcher: ContentFetcher,
    plan: ScanPlan,
    tracker: RequestTracker,
    seen_repositories: SeenRepositories,
    seen_digests: SeenDigests,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scanner")
            .field("providers", &self.providers)
            .field("plan", &self.plan)
            .field("seen_repositories", &self.seen_repositories.len())
            .field("seen_digests", &self.seen_digests.len())
            .finish_non_exhaustive()
    }
}

impl Scanner {
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        exclusion: ExclusionFilter,
        crawler: TreeCrawler,
        fetcher: ContentFetcher,
        plan: ScanPlan,
        tracker: RequestTracker,
        progress: Arc<dyn Progress>,
    ) -> Self {
        Self {
            providers,
            exclusion,
            crawler,
            fetcher,
            plan,
            tracker,
            seen_repositories: SeenRepositories::new(),
            seen_digests: SeenDigests::new(),
            progress,
        }
    }

    /// Run every term against every provider and stream records into `sink`.
    pub async fn run(&self, mode: ScanMode, sink: &mut dyn RecordSink) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();

        self.tracker.begin_terms(self.plan.terms.len() as u64);
        self.tracker.attach(&self.progress);

        write_header(mode, sink)?;

        for term in &self.plan.terms {
            self.progress.set_phase("Searching");
            self.tracker.start_term(term);
            sink.comment(&format!("Searching: {term}"))?;
            log::info!(target: LOG_TARGET, "Searching '{term}' on {} providers", self.providers.len());

            for provider in &self.providers {
                let hits = provider.search(term, self.plan.max_results).await;
                self.note_cool_downs(sink, &mut summary)?;
                for repo in hits {
                    self.process_repository(mode, provider.as_ref(), &repo, sink, &mut summary).await?;
                }
            }

            summary.terms += 1;
            self.tracker.complete_term();
            tokio::time::sleep(self.plan.term_pause).await;
        }

        self.note_cool_downs(sink, &mut summary)?;
        summary.requests = TrackedTopic::all().into_iter().map(|t| (t, self.tracker.count(t))).collect();

        write_summary(mode, &summary, sink)?;
        self.progress.done();

        Ok(summary)
    }

    async fn process_repository(
        &self,
        mode: ScanMode,
        provider: &dyn Provider,
        repo: &RepositoryDescriptor,
        sink: &mut dyn RecordSink,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        if self.exclusion.is_excluded(repo.display_url()) {
            log::debug!(target: LOG_TARGET, "Excluding {repo}");
            summary.excluded += 1;
            return Ok(());
        }

        if !self.seen_repositories.admit(repo.identity()) {
            log::trace!(target: LOG_TARGET, "Already processed {}", repo.identity());
            summary.duplicate_repositories += 1;
            return Ok(());
        }

        summary.repositories += 1;
        if mode.reports_repositories() {
            sink.repository(repo)?;
        }

        if mode.crawls() {
            self.progress.set_phase("Crawling");
            self.crawl(provider, repo, sink, summary).await?;
            tokio::time::sleep(self.plan.repository_pause).await;
            self.progress.set_phase("Searching");
        }

        Ok(())
    }

    async fn crawl(&self, provider: &dyn Provider, repo: &RepositoryDescriptor, sink: &mut dyn RecordSink, summary: &mut ScanSummary) -> Result<()> {
        let mut walk = self.crawler.walk(provider, repo);
        while let Some(entry) = walk.next_candidate().await {
            self.note_cool_downs(sink, summary)?;
            self.process_candidate(provider, repo, &Candidate::File(entry), sink, summary).await?;
        }

        let assets = self.crawler.candidate_assets(provider, repo).await;
        self.note_cool_downs(sink, summary)?;
        for asset in assets {
            self.process_candidate(provider, repo, &Candidate::Asset(asset), sink, summary).await?;
        }

        Ok(())
    }

    async fn process_candidate(
        &self,
        provider: &dyn Provider,
        repo: &RepositoryDescriptor,
        candidate: &Candidate,
        sink: &mut dyn RecordSink,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        summary.candidates += 1;
        let fetched = self.fetcher.fetch(provider, repo, candidate).await;
        self.note_cool_downs(sink, summary)?;
        let Some(content) = fetched else {
            return Ok(());
        };

        summary.fetched += 1;
        match self.seen_digests.admit_digest(&content.bytes) {
            Some(digest) => {
                summary.digests += 1;
                sink.digest(digest, &content.source_label)
            }
            None => {
                log::debug!(target: LOG_TARGET, "Suppressing duplicate content at '{}'", content.source_label);
                summary.suppressed_digests += 1;
                Ok(())
            }
        }
    }

    /// Emit one comment line per cool-down taken since the last check.
    fn note_cool_downs(&self, sink: &mut dyn RecordSink, summary: &mut ScanSummary) -> Result<()> {
        let total = self.tracker.cool_downs();
        if total > summary.cool_downs {
            for _ in summary.cool_downs..total {
                sink.comment("Rate limited; cooled down and retried once")?;
            }
            summary.cool_downs = total;
        }
        Ok(())
    }
}

fn write_header(mode: ScanMode, sink: &mut dyn RecordSink) -> Result<()> {
    match mode {
        ScanMode::Repos => sink.comment("Mouse jiggler repositories")?,
        ScanMode::Hashes => {
            sink.comment("Mouse jiggler MD5 hashes")?;
            sink.comment("Format: MD5  source")?;
        }
        ScanMode::Full => {
            sink.comment("Mouse jiggler repositories and MD5 hashes")?;
            sink.comment("Format: repository URL, or MD5  source")?;
        }
    }
    sink.comment(&"=".repeat(50))
}

fn write_summary(mode: ScanMode, summary: &ScanSummary, sink: &mut dyn RecordSink) -> Result<()> {
    sink.comment("")?;
    if mode.reports_repositories() {
        sink.comment(&format!("Total unique repos: {}", summary.repositories))?;
    }
    if mode.crawls() {
        sink.comment(&format!("Total unique hashes: {}", summary.digests))?;
    }

    sink.comment(&format!(
        "Excluded repos: {}, duplicate repos: {}, duplicate contents: {}",
        summary.excluded, summary.duplicate_repositories, summary.suppressed_digests
    ))?;

    let requests = summary
        .requests
        .iter()
        .filter(|(_, count)| count.issued > 0)
        .map(|(topic, count)| format!("{} {}/{} failed", topic.name(), count.failed, count.issued))
        .collect::<Vec<_>>();
    if !requests.is_empty() {
        sink.comment(&format!("Requests: {}", requests.join(", ")))?;
    }
    if summary.cool_downs > 0 {
        sink.comment(&format!("Rate-limit cool-downs: {}", summary.cool_downs))?;
    }

    log::debug!(target: LOG_TARGET, "Run summary: {summary:?}");
    Ok(())
}
