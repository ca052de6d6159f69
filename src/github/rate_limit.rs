//! Rate limit information from GitHub API responses.
//!
//! GitHub includes rate limit headers (`X-RateLimit-Limit`,
//! `X-RateLimit-Remaining`, `X-RateLimit-Reset`) in every REST response,
//! successful or not. The gateway parses them into [`RateLimitInfo`] so the
//! monitor can decide how long to back off when the quota runs out.

use std::time::{SystemTime, UNIX_EPOCH};

use http::HeaderMap;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate limit information extracted from GitHub API response headers.
///
/// # Example
///
/// ```
/// use prwatch::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 4999, 1700000000);
/// assert!(!info.is_exhausted());
/// assert_eq!(info.remaining(), 4999);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the current window.
    limit: u32,
    /// Remaining requests in the current window.
    remaining: u32,
    /// Unix timestamp when the rate limit resets.
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new rate limit info instance.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Parses the `x-ratelimit-*` headers of a response.
    ///
    /// Returns `None` unless both the remaining count and the reset time are
    /// present and numeric. A missing limit header is recorded as zero.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number::<u32>(headers, REMAINING_HEADER)?;
        let reset_at = header_number::<u64>(headers, RESET_HEADER)?;
        let limit = header_number::<u32>(headers, LIMIT_HEADER).unwrap_or(0);
        Some(Self::new(limit, remaining, reset_at))
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the Unix timestamp when the rate limit resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns true if the rate limit has been exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Calculates seconds until the rate limit resets relative to `now_unix`.
    #[must_use]
    pub const fn seconds_until_reset_from(&self, now_unix: u64) -> u64 {
        self.reset_at.saturating_sub(now_unix)
    }

    /// Calculates seconds until the rate limit resets.
    ///
    /// Returns 0 if the reset time has already passed or if the system time
    /// cannot be determined.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        self.seconds_until_reset_from(unix_now())
    }
}

/// Current wall-clock time as Unix seconds, or 0 if the clock is unusable.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<T>().ok())
}
