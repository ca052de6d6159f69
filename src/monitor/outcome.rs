//! Successful end states of a monitoring session.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::github::models::PullRequestSnapshot;

use super::evaluator::TerminalDecision;

/// Why a session stopped without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// The pull request was merged.
    Merged,
    /// The pull request was closed without merging.
    Closed,
    /// Every reported check run completed.
    ChecksComplete,
    /// The session budget ran out first.
    Timeout,
}

impl TerminalReason {
    /// Returns the wire name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::Closed => "closed",
            Self::ChecksComplete => "checks_complete",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result of a session that ended in a terminal state or timed out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorOutcome {
    /// `true` for terminal states, `false` for a timeout.
    pub success: bool,
    /// Why the session stopped.
    pub reason: TerminalReason,
    /// Whether every completed check passed; only set for `checks_complete`.
    pub checks_passed: Option<bool>,
    /// Seconds between session start and the end.
    pub elapsed_seconds: f64,
    /// Number of successful fetches performed.
    pub poll_count: u32,
    /// The most recent snapshot, when one was fetched.
    pub final_status: Option<PullRequestSnapshot>,
}

impl MonitorOutcome {
    pub(crate) const fn terminal(
        decision: TerminalDecision,
        elapsed: Duration,
        poll_count: u32,
        snapshot: PullRequestSnapshot,
    ) -> Self {
        Self {
            success: true,
            reason: decision.reason(),
            checks_passed: decision.checks_passed(),
            elapsed_seconds: elapsed.as_secs_f64(),
            poll_count,
            final_status: Some(snapshot),
        }
    }

    pub(crate) const fn timed_out(
        elapsed: Duration,
        poll_count: u32,
        last_snapshot: Option<PullRequestSnapshot>,
    ) -> Self {
        Self {
            success: false,
            reason: TerminalReason::Timeout,
            checks_passed: None,
            elapsed_seconds: elapsed.as_secs_f64(),
            poll_count,
            final_status: last_snapshot,
        }
    }
}
