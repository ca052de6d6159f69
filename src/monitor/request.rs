//! Validated parameters for one monitoring session.

use std::time::Duration;

use crate::github::locator::PullRequestLocator;

use super::error::MonitorError;

/// Smallest accepted poll interval, in seconds.
pub const MIN_POLL_INTERVAL_SECONDS: f64 = 5.0;
/// Largest accepted poll interval, in seconds.
pub const MAX_POLL_INTERVAL_SECONDS: f64 = 300.0;
/// Largest accepted session timeout, in seconds (24 hours).
pub const MAX_TIMEOUT_SECONDS: f64 = 86_400.0;
/// Poll interval used when the caller does not choose one.
pub const DEFAULT_POLL_INTERVAL_SECONDS: f64 = 30.0;
/// Session timeout used when the caller does not choose one (1 hour).
pub const DEFAULT_MAX_TIMEOUT_SECONDS: f64 = 3_600.0;

/// What to monitor and for how long.
///
/// Construction validates the timing parameters, so a `MonitorRequest` in
/// hand always satisfies `5s <= poll_interval < max_timeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorRequest {
    locator: PullRequestLocator,
    poll_interval: Duration,
    max_timeout: Duration,
}

impl MonitorRequest {
    /// Validates timing parameters for an already-parsed pull request.
    ///
    /// Values below the minimum interval are rejected rather than clamped.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] when either value is not finite,
    /// the interval is outside `5..=300` seconds, the timeout exceeds 24
    /// hours, or the timeout does not exceed the interval.
    pub fn new(
        locator: PullRequestLocator,
        poll_interval_seconds: f64,
        max_timeout_seconds: f64,
    ) -> Result<Self, MonitorError> {
        let poll_interval = seconds("poll interval", poll_interval_seconds)?;
        let max_timeout = seconds("max timeout", max_timeout_seconds)?;

        if poll_interval_seconds < MIN_POLL_INTERVAL_SECONDS {
            return Err(MonitorError::validation(format!(
                "poll interval must be at least {MIN_POLL_INTERVAL_SECONDS} seconds, got {poll_interval_seconds}"
            )));
        }
        if poll_interval_seconds > MAX_POLL_INTERVAL_SECONDS {
            return Err(MonitorError::validation(format!(
                "poll interval must not exceed {MAX_POLL_INTERVAL_SECONDS} seconds, got {poll_interval_seconds}"
            )));
        }
        if max_timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(MonitorError::validation(format!(
                "max timeout must not exceed {MAX_TIMEOUT_SECONDS} seconds, got {max_timeout_seconds}"
            )));
        }
        if max_timeout <= poll_interval {
            return Err(MonitorError::validation(format!(
                "max timeout ({max_timeout_seconds}s) must exceed the poll interval ({poll_interval_seconds}s)"
            )));
        }

        Ok(Self {
            locator,
            poll_interval,
            max_timeout,
        })
    }

    /// Parses the pull request URL and validates timing parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] when the URL is not a pull request
    /// URL or the timing parameters are invalid.
    pub fn from_url(
        pr_url: &str,
        poll_interval_seconds: f64,
        max_timeout_seconds: f64,
    ) -> Result<Self, MonitorError> {
        let locator = PullRequestLocator::parse(pr_url)
            .map_err(|error| MonitorError::validation(error.to_string()))?;
        Self::new(locator, poll_interval_seconds, max_timeout_seconds)
    }

    /// The monitored pull request.
    #[must_use]
    pub const fn locator(&self) -> &PullRequestLocator {
        &self.locator
    }

    /// Delay between the end of one poll and the start of the next.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wall-clock budget for the whole session.
    #[must_use]
    pub const fn max_timeout(&self) -> Duration {
        self.max_timeout
    }

    /// Upper estimate of how many polls fit in the timeout.
    #[must_use]
    pub fn estimated_polls(&self) -> u64 {
        self.max_timeout
            .as_millis()
            .checked_div(self.poll_interval.as_millis())
            .and_then(|polls| u64::try_from(polls).ok())
            .unwrap_or(0)
    }
}

fn seconds(label: &str, value: f64) -> Result<Duration, MonitorError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        MonitorError::validation(format!(
            "{label} must be a finite, non-negative number of seconds, got {value}"
        ))
    })
}
