//! Test helpers for constructing `PullRequestSnapshot` fixtures.
//!
//! # Examples
//!
//! ```
//! use prwatch::github::models::test_support::{completed_check, open_snapshot};
//! use prwatch::github::models::CheckConclusion;
//!
//! let snapshot = open_snapshot(7).with_check_runs(vec![completed_check(
//!     "build",
//!     CheckConclusion::Success,
//! )]);
//! assert_eq!(snapshot.number, 7);
//! assert_eq!(snapshot.check_runs.len(), 1);
//! ```

use std::collections::BTreeSet;

use chrono::Utc;

use super::{
    CheckConclusion, CheckRun, CheckStatus, CombinedStatus, PullRequestSnapshot, PullRequestState,
    Review, ReviewDecision,
};

/// Constructs an open, unmerged snapshot with no checks or reviews.
#[must_use]
pub fn open_snapshot(number: u64) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number,
        title: format!("Pull request {number}"),
        author: Some("octocat".to_owned()),
        state: PullRequestState::Open,
        merged: false,
        is_draft: false,
        head_sha: "0123456789abcdef".to_owned(),
        combined_commit_status: CombinedStatus::Pending,
        check_runs: Vec::new(),
        reviews: Vec::new(),
        review_decision: None,
        labels: BTreeSet::new(),
        assignees: BTreeSet::new(),
        comment_count: 0,
        updated_at: None,
        fetched_at: Utc::now(),
    }
}

/// Constructs a merged (and therefore closed) snapshot.
#[must_use]
pub fn merged_snapshot(number: u64) -> PullRequestSnapshot {
    PullRequestSnapshot {
        state: PullRequestState::Closed,
        merged: true,
        ..open_snapshot(number)
    }
}

/// Constructs a closed, unmerged snapshot.
#[must_use]
pub fn closed_snapshot(number: u64) -> PullRequestSnapshot {
    PullRequestSnapshot {
        state: PullRequestState::Closed,
        ..open_snapshot(number)
    }
}

/// Builds a completed check run with the given conclusion.
#[must_use]
pub fn completed_check(name: &str, conclusion: CheckConclusion) -> CheckRun {
    CheckRun::new(name, CheckStatus::Completed, Some(conclusion))
}

/// Builds a check run that is still running.
#[must_use]
pub fn running_check(name: &str) -> CheckRun {
    CheckRun::new(name, CheckStatus::InProgress, None)
}

impl PullRequestSnapshot {
    /// Returns a copy of the snapshot with the given check runs.
    #[must_use]
    pub fn with_check_runs(self, check_runs: Vec<CheckRun>) -> Self {
        Self { check_runs, ..self }
    }

    /// Returns a copy of the snapshot with the given reviews and the
    /// matching review decision.
    #[must_use]
    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        let review_decision = ReviewDecision::from_reviews(&reviews);
        Self {
            reviews,
            review_decision,
            ..self
        }
    }
}
