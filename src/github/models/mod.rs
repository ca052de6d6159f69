//! Data models representing one observation of a pull request.
//!
//! This module contains domain models for pull request data returned by the
//! GitHub API. Types prefixed with `Api` are internal deserialisation targets
//! that convert into public domain types.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Open/closed state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    /// The pull request is open.
    Open,
    /// The pull request is closed (merged or not).
    Closed,
}

impl PullRequestState {
    /// Lower-case API spelling of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Lifecycle status of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Waiting for a runner.
    Queued,
    /// Currently running.
    InProgress,
    /// Finished; a conclusion is available.
    Completed,
    /// Waiting on a deployment protection rule.
    Waiting,
    /// Pending start.
    Pending,
    /// Requested but not yet queued.
    Requested,
    /// A status GitHub added after this client was written.
    #[serde(other)]
    Unknown,
}

/// Final result of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// The check passed.
    Success,
    /// The check failed.
    Failure,
    /// The check finished without a pass/fail verdict.
    Neutral,
    /// The check was cancelled.
    Cancelled,
    /// The check was skipped.
    Skipped,
    /// The check exceeded its time limit.
    TimedOut,
    /// The check needs manual action.
    ActionRequired,
    /// The check went stale.
    Stale,
    /// A conclusion GitHub added after this client was written, or a
    /// completed run that reported none.
    #[serde(other)]
    Unknown,
}

impl CheckConclusion {
    /// Whether the conclusion counts as green for the aggregate verdict.
    #[must_use]
    pub const fn is_passing(self) -> bool {
        matches!(self, Self::Success | Self::Neutral | Self::Skipped)
    }
}

/// One CI job's reported status for the head commit.
///
/// The conclusion is present exactly when the status is
/// [`CheckStatus::Completed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRun {
    name: String,
    status: CheckStatus,
    conclusion: Option<CheckConclusion>,
}

impl CheckRun {
    /// Creates a check run, normalising the conclusion to match the status.
    ///
    /// A conclusion reported for an unfinished run is dropped; a completed run
    /// without a conclusion is recorded as [`CheckConclusion::Unknown`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        status: CheckStatus,
        conclusion: Option<CheckConclusion>,
    ) -> Self {
        let normalised = match status {
            CheckStatus::Completed => Some(conclusion.unwrap_or(CheckConclusion::Unknown)),
            _ => None,
        };
        Self {
            name: name.into(),
            status,
            conclusion: normalised,
        }
    }

    /// Check name as shown on GitHub.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> CheckStatus {
        self.status
    }

    /// Conclusion, present only for completed runs.
    #[must_use]
    pub const fn conclusion(&self) -> Option<CheckConclusion> {
        self.conclusion
    }

    /// Whether the run has finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, CheckStatus::Completed)
    }
}

/// State of a submitted review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// The reviewer approved the changes.
    Approved,
    /// The reviewer requested changes.
    ChangesRequested,
    /// The reviewer left comments only.
    Commented,
    /// The review was dismissed.
    Dismissed,
    /// The review has not been submitted yet.
    Pending,
}

impl ReviewState {
    /// Parses the upper-case spelling used by the REST API.
    #[must_use]
    pub fn from_api(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "APPROVED" => Some(Self::Approved),
            "CHANGES_REQUESTED" => Some(Self::ChangesRequested),
            "COMMENTED" => Some(Self::Commented),
            "DISMISSED" => Some(Self::Dismissed),
            "PENDING" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// A pull request review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    /// Reviewer login.
    pub reviewer: String,
    /// Review state.
    pub state: ReviewState,
    /// Submission time; absent for pending reviews.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Overall verdict derived from each reviewer's latest decisive review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Every decisive reviewer approved.
    Approved,
    /// At least one reviewer requested changes.
    ChangesRequested,
}

impl ReviewDecision {
    /// Computes the decision from a review history.
    ///
    /// Only `approved` and `changes_requested` reviews count, and only the
    /// most recent one per reviewer. Any outstanding change request wins.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Option<Self> {
        let mut latest: HashMap<&str, &Review> = HashMap::new();
        for review in reviews.iter().filter(|review| {
            matches!(
                review.state,
                ReviewState::Approved | ReviewState::ChangesRequested
            )
        }) {
            let replace = latest.get(review.reviewer.as_str()).is_none_or(|existing| {
                matches!(
                    (review.submitted_at, existing.submitted_at),
                    (Some(new), Some(old)) if new > old
                )
            });
            if replace {
                latest.insert(review.reviewer.as_str(), review);
            }
        }

        if latest.is_empty() {
            return None;
        }

        if latest
            .values()
            .any(|review| review.state == ReviewState::ChangesRequested)
        {
            Some(Self::ChangesRequested)
        } else {
            Some(Self::Approved)
        }
    }

    /// Lower-case label used in status lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::ChangesRequested => "changes_requested",
        }
    }
}

/// Combined verdict of the legacy commit statuses API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinedStatus {
    /// All statuses succeeded.
    Success,
    /// Some statuses are pending, or none were reported.
    #[default]
    Pending,
    /// At least one status failed.
    Failure,
    /// At least one status errored.
    Error,
    /// A state GitHub added after this client was written.
    #[serde(other)]
    Unknown,
}

/// The full pull request state captured at one poll.
///
/// Snapshots are created once per successful fetch and never mutated; a
/// later poll produces a new value that supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestSnapshot {
    /// Pull request number.
    pub number: u64,
    /// Title of the pull request.
    pub title: String,
    /// Author login if present.
    pub author: Option<String>,
    /// Open or closed.
    pub state: PullRequestState,
    /// Whether the pull request has been merged.
    #[serde(rename = "is_merged")]
    pub merged: bool,
    /// Whether the pull request is a draft.
    pub is_draft: bool,
    /// SHA of the head commit the checks ran against.
    pub head_sha: String,
    /// Legacy combined commit status for the head commit.
    pub combined_commit_status: CombinedStatus,
    /// Check runs for the head commit, in API order.
    pub check_runs: Vec<CheckRun>,
    /// Reviews, in submission order.
    pub reviews: Vec<Review>,
    /// Review decision derived from `reviews`.
    pub review_decision: Option<ReviewDecision>,
    /// Label names.
    pub labels: BTreeSet<String>,
    /// Assignee logins.
    pub assignees: BTreeSet<String>,
    /// Number of issue comments.
    pub comment_count: u64,
    /// Last time GitHub recorded a change to the pull request.
    pub updated_at: Option<DateTime<Utc>>,
    /// When this snapshot was captured.
    pub fetched_at: DateTime<Utc>,
}

impl PullRequestSnapshot {
    /// Counts completed check runs.
    #[must_use]
    pub fn completed_checks(&self) -> usize {
        self.check_runs
            .iter()
            .filter(|run| run.is_completed())
            .count()
    }

    /// Short human-readable summary used for progress messages.
    #[must_use]
    pub fn status_line(&self) -> String {
        let checks = if self.check_runs.is_empty() {
            "none reported".to_owned()
        } else {
            format!(
                "{}/{} complete",
                self.completed_checks(),
                self.check_runs.len()
            )
        };
        let reviews = self
            .review_decision
            .map_or("none", ReviewDecision::as_str);
        format!(
            "{state} | Checks: {checks} | Reviews: {reviews}",
            state = self.state
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequest {
    pub(crate) number: u64,
    #[serde(default)]
    pub(crate) title: String,
    pub(crate) state: PullRequestState,
    #[serde(default)]
    pub(crate) merged: bool,
    #[serde(default)]
    pub(crate) draft: bool,
    pub(crate) user: Option<ApiUser>,
    pub(crate) head: ApiCommitRef,
    #[serde(default)]
    pub(crate) labels: Vec<ApiLabel>,
    #[serde(default)]
    pub(crate) assignees: Vec<ApiUser>,
    #[serde(default)]
    pub(crate) comments: u64,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommitRef {
    pub(crate) sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiLabel {
    pub(crate) name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiReview {
    pub(crate) user: Option<ApiUser>,
    pub(crate) state: String,
    pub(crate) submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCheckRunPage {
    #[serde(default)]
    pub(crate) check_runs: Vec<ApiCheckRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCheckRun {
    pub(crate) name: String,
    pub(crate) status: CheckStatus,
    pub(crate) conclusion: Option<CheckConclusion>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCombinedStatus {
    #[serde(default)]
    pub(crate) state: CombinedStatus,
}

impl From<ApiCheckRun> for CheckRun {
    fn from(value: ApiCheckRun) -> Self {
        Self::new(value.name, value.status, value.conclusion)
    }
}

impl ApiReview {
    fn into_review(self) -> Option<Review> {
        let state = ReviewState::from_api(&self.state)?;
        Some(Review {
            reviewer: self
                .user
                .and_then(|user| user.login)
                .unwrap_or_else(|| "ghost".to_owned()),
            state,
            submitted_at: self.submitted_at,
        })
    }
}

/// Raw API payloads gathered by one fetch.
pub(crate) struct ApiSnapshotParts {
    pub(crate) pull_request: ApiPullRequest,
    pub(crate) reviews: Vec<ApiReview>,
    pub(crate) check_runs: Vec<ApiCheckRun>,
    pub(crate) combined_status: ApiCombinedStatus,
}

impl ApiSnapshotParts {
    pub(crate) fn into_snapshot(self, fetched_at: DateTime<Utc>) -> PullRequestSnapshot {
        let Self {
            pull_request,
            reviews: api_reviews,
            check_runs,
            combined_status,
        } = self;

        let reviews: Vec<Review> = api_reviews
            .into_iter()
            .filter_map(ApiReview::into_review)
            .collect();
        let review_decision = ReviewDecision::from_reviews(&reviews);

        PullRequestSnapshot {
            number: pull_request.number,
            title: pull_request.title,
            author: pull_request.user.and_then(|user| user.login),
            state: pull_request.state,
            merged: pull_request.merged,
            is_draft: pull_request.draft,
            head_sha: pull_request.head.sha,
            combined_commit_status: combined_status.state,
            check_runs: check_runs.into_iter().map(CheckRun::from).collect(),
            reviews,
            review_decision,
            labels: pull_request
                .labels
                .into_iter()
                .map(|label| label.name)
                .collect(),
            assignees: pull_request
                .assignees
                .into_iter()
                .filter_map(|user| user.login)
                .collect(),
            comment_count: pull_request.comments,
            updated_at: pull_request.updated_at,
            fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::{
        ApiCheckRun, ApiCombinedStatus, ApiPullRequest, ApiReview, ApiSnapshotParts, CheckConclusion,
        CheckRun, CheckStatus, CombinedStatus, PullRequestState, Review, ReviewDecision,
        ReviewState,
    };

    fn review(reviewer: &str, state: ReviewState, minute: u32) -> Review {
        Review {
            reviewer: reviewer.to_owned(),
            state,
            submitted_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).single(),
        }
    }

    #[fixture]
    fn api_pull_request() -> ApiPullRequest {
        serde_json::from_value(json!({
            "number": 42,
            "title": "Ship the monitor",
            "state": "open",
            "merged": false,
            "draft": true,
            "user": { "login": "octocat" },
            "head": { "sha": "abc123" },
            "labels": [{ "name": "ci" }, { "name": "backend" }, { "name": "ci" }],
            "assignees": [{ "login": "alice" }, { "login": null }],
            "comments": 7,
            "updated_at": "2025-01-02T00:00:00Z"
        }))
        .expect("ApiPullRequest should deserialise")
    }

    #[rstest]
    #[case::unfinished_drops_conclusion(
        CheckStatus::InProgress,
        Some(CheckConclusion::Success),
        None
    )]
    #[case::completed_keeps_conclusion(
        CheckStatus::Completed,
        Some(CheckConclusion::Failure),
        Some(CheckConclusion::Failure)
    )]
    #[case::completed_without_conclusion(
        CheckStatus::Completed,
        None,
        Some(CheckConclusion::Unknown)
    )]
    fn check_run_conclusion_follows_status(
        #[case] status: CheckStatus,
        #[case] reported: Option<CheckConclusion>,
        #[case] expected: Option<CheckConclusion>,
    ) {
        let run = CheckRun::new("build", status, reported);
        assert_eq!(run.conclusion(), expected);
        assert_eq!(run.is_completed(), status == CheckStatus::Completed);
    }

    #[test]
    fn api_check_run_tolerates_unknown_values() {
        let run: ApiCheckRun = serde_json::from_value(json!({
            "name": "lint",
            "status": "brand_new_status",
            "conclusion": null
        }))
        .expect("unknown status should deserialise");

        assert_eq!(run.status, CheckStatus::Unknown);
        assert!(CheckRun::from(run).conclusion().is_none());
    }

    #[rstest]
    #[case::success(CheckConclusion::Success, true)]
    #[case::neutral(CheckConclusion::Neutral, true)]
    #[case::skipped(CheckConclusion::Skipped, true)]
    #[case::failure(CheckConclusion::Failure, false)]
    #[case::cancelled(CheckConclusion::Cancelled, false)]
    #[case::timed_out(CheckConclusion::TimedOut, false)]
    fn passing_conclusions(#[case] conclusion: CheckConclusion, #[case] expected: bool) {
        assert_eq!(conclusion.is_passing(), expected);
    }

    #[test]
    fn review_decision_is_none_without_decisive_reviews() {
        let reviews = vec![review("alice", ReviewState::Commented, 1)];
        assert_eq!(ReviewDecision::from_reviews(&reviews), None);
    }

    #[test]
    fn review_decision_uses_latest_review_per_reviewer() {
        let reviews = vec![
            review("alice", ReviewState::ChangesRequested, 1),
            review("alice", ReviewState::Approved, 5),
            review("bob", ReviewState::Approved, 2),
        ];
        assert_eq!(
            ReviewDecision::from_reviews(&reviews),
            Some(ReviewDecision::Approved)
        );
    }

    #[test]
    fn review_decision_prefers_outstanding_change_requests() {
        let reviews = vec![
            review("alice", ReviewState::Approved, 1),
            review("bob", ReviewState::ChangesRequested, 2),
        ];
        assert_eq!(
            ReviewDecision::from_reviews(&reviews),
            Some(ReviewDecision::ChangesRequested)
        );
    }

    #[rstest]
    fn snapshot_collects_all_parts(api_pull_request: ApiPullRequest) {
        let reviews: Vec<ApiReview> = serde_json::from_value(json!([
            { "user": { "login": "bob" }, "state": "APPROVED", "submitted_at": "2025-01-01T10:00:00Z" },
            { "user": { "login": "eve" }, "state": "SOMETHING_NEW", "submitted_at": null }
        ]))
        .expect("reviews should deserialise");
        let check_runs: Vec<ApiCheckRun> = serde_json::from_value(json!([
            { "name": "build", "status": "completed", "conclusion": "success" },
            { "name": "test", "status": "queued", "conclusion": null }
        ]))
        .expect("check runs should deserialise");
        let fetched_at = Utc::now();

        let snapshot = ApiSnapshotParts {
            pull_request: api_pull_request,
            reviews,
            check_runs,
            combined_status: ApiCombinedStatus {
                state: CombinedStatus::Success,
            },
        }
        .into_snapshot(fetched_at);

        assert_eq!(snapshot.number, 42);
        assert_eq!(snapshot.state, PullRequestState::Open);
        assert!(snapshot.is_draft);
        assert_eq!(snapshot.author.as_deref(), Some("octocat"));
        assert_eq!(snapshot.head_sha, "abc123");
        assert_eq!(snapshot.labels.len(), 2, "labels form a set");
        assert_eq!(snapshot.assignees.len(), 1);
        assert_eq!(snapshot.comment_count, 7);
        assert_eq!(snapshot.reviews.len(), 1, "unknown review states are skipped");
        assert_eq!(snapshot.review_decision, Some(ReviewDecision::Approved));
        assert_eq!(snapshot.completed_checks(), 1);
        assert_eq!(snapshot.fetched_at, fetched_at);
        assert_eq!(
            snapshot.status_line(),
            "open | Checks: 1/2 complete | Reviews: approved"
        );
    }

    #[rstest]
    fn snapshot_serialises_expected_field_names(api_pull_request: ApiPullRequest) {
        let snapshot = ApiSnapshotParts {
            pull_request: api_pull_request,
            reviews: Vec::new(),
            check_runs: Vec::new(),
            combined_status: ApiCombinedStatus {
                state: CombinedStatus::Pending,
            },
        }
        .into_snapshot(Utc::now());

        let value = serde_json::to_value(&snapshot).expect("snapshot should serialise");
        assert_eq!(value["is_merged"], json!(false));
        assert_eq!(value["state"], json!("open"));
        assert_eq!(value["labels"], json!(["backend", "ci"]));
        assert_eq!(value["comment_count"], json!(7));
        assert!(value["review_decision"].is_null());
    }
}
