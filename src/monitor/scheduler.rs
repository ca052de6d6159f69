//! The polling loop.
//!
//! A session alternates between polling and waiting until the pull request
//! reaches a terminal state, the time budget runs out, a fatal error occurs,
//! or the caller cancels:
//!
//! ```text
//! Polling --terminal snapshot--> Done
//! Polling --budget spent-------> TimedOut
//! Polling --rate limited-------> Waiting (back-off) | Failed (bound reached)
//! Polling --other error--------> Failed
//! Polling --otherwise----------> Waiting (interval)
//! Waiting --sleep elapsed------> Polling
//! any     --cancelled----------> Cancelled
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::github::error::GitHubError;
use crate::github::gateway::{FetchedSnapshot, PullRequestGateway};
use crate::github::models::PullRequestSnapshot;
use crate::github::rate_limit::unix_now;

use super::error::MonitorError;
use super::evaluator::evaluate;
use super::outcome::MonitorOutcome;
use super::progress::ProgressReporter;
use super::request::MonitorRequest;
use super::tracker::{DEFAULT_MAX_CONSECUTIVE_RATE_LIMITS, RateLimitTracker};

/// Drives one monitoring session against a gateway.
pub struct PollScheduler<'gateway, G: PullRequestGateway + ?Sized> {
    gateway: &'gateway G,
    max_consecutive_rate_limits: u32,
}

impl<'gateway, G: PullRequestGateway + ?Sized> PollScheduler<'gateway, G> {
    /// Creates a scheduler that tolerates the default number of consecutive
    /// rate limit signals.
    #[must_use]
    pub const fn new(gateway: &'gateway G) -> Self {
        Self {
            gateway,
            max_consecutive_rate_limits: DEFAULT_MAX_CONSECUTIVE_RATE_LIMITS,
        }
    }

    /// Overrides how many consecutive rate limit signals end the session.
    #[must_use]
    pub const fn with_max_consecutive_rate_limits(mut self, bound: u32) -> Self {
        self.max_consecutive_rate_limits = bound;
        self
    }

    /// Runs the session to completion.
    ///
    /// Returns `Ok` for terminal states and for a timeout (with
    /// `success: false`); fatal conditions are returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::RateLimited`] when the rate limit stays
    /// exhausted for too many consecutive polls, [`MonitorError::Api`] for
    /// any other gateway failure, and [`MonitorError::Cancelled`] when
    /// `cancellation` fires.
    #[instrument(skip_all, fields(pull_request = %request.locator()))]
    pub async fn run(
        &self,
        request: &MonitorRequest,
        progress: &ProgressReporter<'_>,
        cancellation: &CancellationToken,
    ) -> Result<MonitorOutcome, MonitorError> {
        let mut session = Session::start(self.max_consecutive_rate_limits);
        let authenticated = self.gateway.is_authenticated();
        info!(
            authenticated,
            poll_interval_secs = request.poll_interval().as_secs_f64(),
            max_timeout_secs = request.max_timeout().as_secs_f64(),
            "monitoring started"
        );
        progress.started(request.locator(), request.estimated_polls(), authenticated);

        loop {
            if cancellation.is_cancelled() {
                return Err(session.cancelled());
            }
            let elapsed = session.elapsed();
            if elapsed >= request.max_timeout() {
                return Ok(session.timed_out(elapsed));
            }

            let fetched = tokio::select! {
                biased;
                () = cancellation.cancelled() => return Err(session.cancelled()),
                result = self.gateway.fetch_snapshot(request.locator()) => result,
            };

            let wait = match fetched {
                Ok(FetchedSnapshot {
                    snapshot,
                    rate_limit,
                }) => {
                    session.poll_count = session.poll_count.saturating_add(1);
                    session.tracker.record_success(rate_limit);
                    let polled_at = session.elapsed();

                    if let Some(decision) = evaluate(&snapshot) {
                        info!(
                            reason = %decision.reason(),
                            poll_count = session.poll_count,
                            "pull request reached a terminal state"
                        );
                        return Ok(MonitorOutcome::terminal(
                            decision,
                            polled_at,
                            session.poll_count,
                            snapshot,
                        ));
                    }

                    debug!(poll_count = session.poll_count, status = %snapshot.status_line(), "polled");
                    progress.report(polled_at, session.poll_count, &snapshot);
                    session.last_snapshot = Some(snapshot);

                    if polled_at >= request.max_timeout() {
                        return Ok(session.timed_out(polled_at));
                    }
                    request.poll_interval()
                }
                Err(error) if error.is_rate_limited() => {
                    self.back_off(&mut session, request, progress, &error)?
                }
                Err(error) => {
                    warn!(%error, poll_count = session.poll_count, "GitHub request failed");
                    return Err(session.api_error(error));
                }
            };

            let remaining = request.max_timeout().saturating_sub(session.elapsed());
            tokio::select! {
                biased;
                () = cancellation.cancelled() => return Err(session.cancelled()),
                () = tokio::time::sleep(wait.min(remaining)) => {}
            }
        }
    }

    fn back_off(
        &self,
        session: &mut Session,
        request: &MonitorRequest,
        progress: &ProgressReporter<'_>,
        error: &GitHubError,
    ) -> Result<Duration, MonitorError> {
        let elapsed = session.elapsed();
        let remaining = request.max_timeout().saturating_sub(elapsed);
        let now_unix = session.now_unix();
        let wait = session
            .tracker
            .record_exhaustion(error.rate_limit(), now_unix, remaining);
        let consecutive = session.tracker.state().consecutive_exhaustions;

        if session.tracker.should_abort() {
            warn!(
                consecutive,
                bound = self.max_consecutive_rate_limits,
                "rate limit still exhausted; giving up"
            );
            return Err(session.rate_limited(now_unix));
        }

        warn!(consecutive, wait_secs = wait.as_secs_f64(), %error, "rate limited; backing off");
        progress.rate_limited(elapsed, wait, consecutive);
        Ok(wait)
    }
}

/// Mutable state owned by one `run` invocation.
struct Session {
    started: Instant,
    started_unix: u64,
    poll_count: u32,
    last_snapshot: Option<PullRequestSnapshot>,
    tracker: RateLimitTracker,
}

impl Session {
    fn start(max_consecutive_rate_limits: u32) -> Self {
        Self {
            started: Instant::now(),
            started_unix: unix_now(),
            poll_count: 0,
            last_snapshot: None,
            tracker: RateLimitTracker::new(max_consecutive_rate_limits),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock seconds derived from the session's monotonic clock.
    fn now_unix(&self) -> u64 {
        self.started_unix.saturating_add(self.elapsed().as_secs())
    }

    fn timed_out(&mut self, elapsed: Duration) -> MonitorOutcome {
        info!(poll_count = self.poll_count, "monitoring timed out");
        MonitorOutcome::timed_out(elapsed, self.poll_count, self.last_snapshot.take())
    }

    fn cancelled(&self) -> MonitorError {
        info!(poll_count = self.poll_count, "monitoring cancelled");
        MonitorError::Cancelled {
            elapsed: self.elapsed(),
            poll_count: self.poll_count,
        }
    }

    fn rate_limited(&mut self, now_unix: u64) -> MonitorError {
        MonitorError::RateLimited {
            consecutive: self.tracker.state().consecutive_exhaustions,
            retry_after_seconds: self.tracker.retry_after_seconds(now_unix),
            poll_count: self.poll_count,
            last_snapshot: self.last_snapshot.take().map(Box::new),
        }
    }

    fn api_error(&mut self, source: GitHubError) -> MonitorError {
        MonitorError::Api {
            source,
            poll_count: self.poll_count,
            last_snapshot: self.last_snapshot.take().map(Box::new),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
