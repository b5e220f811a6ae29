//! Request tracking for outbound calls and the diagnostic counters of a run.

use super::progress::Progress;
use core::sync::atomic::{AtomicU64, Ordering};
use owo_colors::OwoColorize;
use std::sync::{Arc, Mutex, PoisonError};

/// Kinds of outbound calls that are counted separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackedTopic {
    Search,
    Listing,
    Release,
    File,
    Download,
}

impl TrackedTopic {
    /// Get the display name for this topic.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Listing => "listing",
            Self::Release => "release",
            Self::File => "file",
            Self::Download => "download",
        }
    }

    /// Get all tracked topics in a consistent order.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::Search, Self::Listing, Self::Release, Self::File, Self::Download]
    }

    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
struct RequestCounter {
    issued: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Default)]
struct Counters {
    topics: [RequestCounter; 5],
    cool_downs: AtomicU64,
    terms_total: AtomicU64,
    terms_done: AtomicU64,
    current_term: Mutex<String>,
}

/// Snapshot of the counters of one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopicCount {
    pub issued: u64,
    pub failed: u64,
}

/// Counts issued and failed calls per topic, plus rate-limit cool-downs.
///
/// Failed calls are never fatal to a run; these counters are the only way to tell a clean run
/// apart from one that silently skipped work. Clones share the same counters.
#[derive(Clone, Default)]
pub struct RequestTracker {
    counters: Arc<Counters>,
}

impl core::fmt::Debug for RequestTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestTracker").field("counters", &self.counters).finish()
    }
}

impl RequestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the given progress display from these counters.
    pub fn attach(&self, progress: &Arc<dyn Progress>) {
        let counters = Arc::clone(&self.counters);
        let use_colors = progress.use_colors();
        progress.set_determinate(Box::new(move || Self::progress_reporter_callback(&counters, use_colors)));
    }

    /// Mark that a request has been issued for the given topic.
    pub fn add_request(&self, topic: TrackedTopic) {
        let _ = self.counters.topics[topic.index()].issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark that a previously issued request produced nothing usable.
    pub fn fail_request(&self, topic: TrackedTopic) {
        let _ = self.counters.topics[topic.index()].failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one rate-limit cool-down.
    pub fn record_cool_down(&self) {
        let _ = self.counters.cool_downs.fetch_add(1, Ordering::Relaxed);
    }

    /// Set the number of search terms the run will process.
    pub fn begin_terms(&self, total: u64) {
        self.counters.terms_total.store(total, Ordering::Relaxed);
        self.counters.terms_done.store(0, Ordering::Relaxed);
    }

    /// Record the search term now being processed.
    pub fn start_term(&self, term: &str) {
        term.clone_into(&mut self.counters.current_term.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Mark one search term as fully processed.
    pub fn complete_term(&self) {
        let _ = self.counters.terms_done.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self, topic: TrackedTopic) -> TopicCount {
        let counter = &self.counters.topics[topic.index()];
        TopicCount {
            issued: counter.issued.load(Ordering::Relaxed),
            failed: counter.failed.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn cool_downs(&self) -> u64 {
        self.counters.cool_downs.load(Ordering::Relaxed)
    }

    /// Compute current progress state from counters.
    ///
    /// Returns (`total_terms`, `terms_done`, `message_string`).
    fn progress_reporter_callback(counters: &Counters, use_colors: bool) -> (u64, u64, String) {
        let mut parts = Vec::with_capacity(TrackedTopic::all().len() + 1);

        for topic in TrackedTopic::all() {
            let counter = &counters.topics[topic.index()];
            let issued = counter.issued.load(Ordering::Relaxed);
            if issued == 0 {
                continue;
            }

            let failed = counter.failed.load(Ordering::Relaxed);
            let text = if failed > 0 {
                format!("{issued} {} ({failed} failed)", topic.name())
            } else {
                format!("{issued} {}", topic.name())
            };

            if use_colors && failed > 0 {
                parts.push(format!("{}", text.yellow()));
            } else {
                parts.push(text);
            }
        }

        let cool_downs = counters.cool_downs.load(Ordering::Relaxed);
        if cool_downs > 0 {
            parts.push(format!("{cool_downs} cool-down(s)"));
        }

        let requests = if parts.is_empty() {
            "No requests".to_string()
        } else {
            parts.join(", ")
        };

        let term = counters.current_term.lock().unwrap_or_else(PoisonError::into_inner);
        let message = if term.is_empty() {
            requests
        } else {
            format!("'{term}': {requests}")
        };

        (
            counters.terms_total.load(Ordering::Relaxed),
            counters.terms_done.load(Ordering::Relaxed),
            message,
        )
    }
}
