//! Rate-limit handling for outbound provider calls.
//!
//! Every call is attempted once. If the platform answers with its throttling signal, the caller
//! is suspended for a fixed cool-down and the call is repeated exactly once; whatever the second
//! attempt yields is handed back, rate-limited or not. There is no exponential backoff and no
//! third attempt, so the worst-case stall per call is one cool-down.

use super::request_tracker::RequestTracker;
use core::time::Duration;

const LOG_TARGET: &str = "  governor";

/// Fixed cool-down applied after a throttling signal.
pub const RATE_LIMIT_COOL_DOWN: Duration = Duration::from_secs(60);

/// Outcome of a call that may carry a throttling signal.
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

/// Wraps one outbound call with a single cool-down-and-retry.
#[derive(Debug, Clone)]
pub struct RateLimitGovernor {
    cool_down: Duration,
    tracker: RequestTracker,
}

impl RateLimitGovernor {
    #[must_use]
    pub const fn new(tracker: RequestTracker) -> Self {
        Self {
            cool_down: RATE_LIMIT_COOL_DOWN,
            tracker,
        }
    }

    /// Use a different cool-down than [`RATE_LIMIT_COOL_DOWN`].
    #[must_use]
    pub const fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    /// Invoke `call`, retrying exactly once after the cool-down if it signals rate limiting.
    ///
    /// `what` describes the call for log output.
    pub async fn call<T, F, Fut>(&self, what: &str, mut call: F) -> T
    where
        T: RateLimitSignal,
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
    {
        let first = call().await;
        if !first.is_rate_limited() {
            return first;
        }

        self.tracker.record_cool_down();
        log::warn!(
            target: LOG_TARGET,
            "Rate limited on {what}, waiting {}s before retrying once",
            self.cool_down.as_secs()
        );
        tokio::time::sleep(self.cool_down).await;

        let second = call().await;
        if second.is_rate_limited() {
            log::warn!(target: LOG_TARGET, "Still rate limited on {what}, giving up on this call");
        }

        second
    }
}
