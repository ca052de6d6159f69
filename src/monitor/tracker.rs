//! Session-scoped rate limit bookkeeping.
//!
//! The tracker remembers the last quota GitHub reported, counts consecutive
//! exhaustion signals, and turns each signal into a bounded back-off.

use std::time::Duration;

use crate::github::rate_limit::RateLimitInfo;

/// Consecutive exhaustion signals tolerated before a session gives up.
pub const DEFAULT_MAX_CONSECUTIVE_RATE_LIMITS: u32 = 3;

/// Back-off used when GitHub gives no reset time at all.
pub const FALLBACK_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Snapshot of what the tracker knows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Remaining requests last reported, if any were.
    pub remaining: Option<u32>,
    /// Reset time (Unix seconds) last reported, if any was.
    pub reset_at: Option<u64>,
    /// Exhaustion signals seen since the last successful fetch.
    pub consecutive_exhaustions: u32,
}

/// Tracks rate limit signals for one monitoring session.
#[derive(Debug, Clone)]
pub struct RateLimitTracker {
    state: RateLimitState,
    max_consecutive: u32,
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONSECUTIVE_RATE_LIMITS)
    }
}

impl RateLimitTracker {
    /// Creates a tracker that aborts after `max_consecutive` signals in a row.
    ///
    /// A bound of zero is treated as one.
    #[must_use]
    pub const fn new(max_consecutive: u32) -> Self {
        Self {
            state: RateLimitState {
                remaining: None,
                reset_at: None,
                consecutive_exhaustions: 0,
            },
            max_consecutive: if max_consecutive == 0 {
                1
            } else {
                max_consecutive
            },
        }
    }

    /// Current tracker state.
    #[must_use]
    pub const fn state(&self) -> RateLimitState {
        self.state
    }

    /// Records a successful fetch and resets the consecutive counter.
    pub const fn record_success(&mut self, observed: Option<RateLimitInfo>) {
        self.remember(observed);
        self.state.consecutive_exhaustions = 0;
    }

    /// Records an exhaustion signal and returns how long to wait.
    ///
    /// The wait runs until the reported reset time (at least one second),
    /// falls back to the last known reset time and then to
    /// [`FALLBACK_RATE_LIMIT_WAIT`], and never exceeds `remaining_budget`.
    pub fn record_exhaustion(
        &mut self,
        observed: Option<RateLimitInfo>,
        now_unix: u64,
        remaining_budget: Duration,
    ) -> Duration {
        self.remember(observed);
        self.state.consecutive_exhaustions = self.state.consecutive_exhaustions.saturating_add(1);

        self.wait_from(now_unix).min(remaining_budget)
    }

    /// Whether the consecutive signal count has reached the bound.
    #[must_use]
    pub const fn should_abort(&self) -> bool {
        self.state.consecutive_exhaustions >= self.max_consecutive
    }

    /// Seconds until the last known reset time, or the fallback wait.
    #[must_use]
    pub fn retry_after_seconds(&self, now_unix: u64) -> u64 {
        self.wait_from(now_unix).as_secs()
    }

    fn wait_from(&self, now_unix: u64) -> Duration {
        self.state.reset_at.map_or(FALLBACK_RATE_LIMIT_WAIT, |reset_at| {
            Duration::from_secs(reset_at.saturating_sub(now_unix).max(1))
        })
    }

    const fn remember(&mut self, observed: Option<RateLimitInfo>) {
        if let Some(info) = observed {
            self.state.remaining = Some(info.remaining());
            self.state.reset_at = Some(info.reset_at());
        }
    }
}
