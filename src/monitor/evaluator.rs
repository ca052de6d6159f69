//! Decides whether a snapshot ends the monitoring session.

use crate::github::models::{PullRequestSnapshot, PullRequestState};

use super::outcome::TerminalReason;

/// A terminal verdict for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalDecision {
    /// The pull request was merged.
    Merged,
    /// The pull request was closed without merging.
    Closed,
    /// All reported checks have completed.
    ChecksComplete {
        /// Whether every check concluded success, neutral or skipped.
        checks_passed: bool,
    },
}

impl TerminalDecision {
    /// The reason reported in the session outcome.
    #[must_use]
    pub const fn reason(self) -> TerminalReason {
        match self {
            Self::Merged => TerminalReason::Merged,
            Self::Closed => TerminalReason::Closed,
            Self::ChecksComplete { .. } => TerminalReason::ChecksComplete,
        }
    }

    /// The pass flag, present only for completed checks.
    #[must_use]
    pub const fn checks_passed(self) -> Option<bool> {
        match self {
            Self::ChecksComplete { checks_passed } => Some(checks_passed),
            Self::Merged | Self::Closed => None,
        }
    }
}

/// Evaluates a snapshot in priority order: merged, closed, checks complete.
///
/// A pull request with no check runs never reaches `ChecksComplete`; it keeps
/// polling until it is merged, closed or the session times out.
#[must_use]
pub fn evaluate(snapshot: &PullRequestSnapshot) -> Option<TerminalDecision> {
    if snapshot.merged {
        return Some(TerminalDecision::Merged);
    }
    if snapshot.state == PullRequestState::Closed {
        return Some(TerminalDecision::Closed);
    }
    if snapshot.check_runs.is_empty() || !snapshot.check_runs.iter().all(|run| run.is_completed())
    {
        return None;
    }

    let checks_passed = snapshot
        .check_runs
        .iter()
        .all(|run| run.conclusion().is_some_and(|conclusion| conclusion.is_passing()));
    Some(TerminalDecision::ChecksComplete { checks_passed })
}
