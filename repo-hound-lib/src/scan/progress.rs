/// A trait for reporting progress of a long-running scan.
pub trait Progress: Send + Sync {
    /// Set the phase label for the current operation (e.g., "Searching", "Crawling").
    fn set_phase(&self, phase: &str);

    /// Configure determinate progress reporting.
    ///
    /// The callback should return (total, current, message) to show progress
    /// as a percentage or fraction.
    fn set_determinate(&self, callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>);

    /// Finish and clear the progress indicator.
    fn done(&self);

    /// Whether the progress display renders ANSI colors.
    fn use_colors(&self) -> bool {
        false
    }
}

/// Progress sink that discards everything; used when no terminal display is wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_phase(&self, _phase: &str) {}
    fn set_determinate(&self, _callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>) {}
    fn done(&self) {}
}
