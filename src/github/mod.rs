//! GitHub access for pull request monitoring.
//!
//! This module wraps Octocrab to parse pull request URLs, hold optional
//! personal access tokens, and fetch complete pull request snapshots
//! (metadata, reviews, check runs, combined status). Errors are mapped into
//! [`GitHubError`] variants so the monitor can tell rate limiting apart from
//! every other failure without inspecting Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod rate_limit;

pub use error::GitHubError;
pub use gateway::{FetchedSnapshot, OctocrabGateway, PullRequestGateway};
pub use locator::{
    PersonalAccessToken, PullRequestLocator, PullRequestNumber, RepositoryName, RepositoryOwner,
};
pub use models::{
    CheckConclusion, CheckRun, CheckStatus, CombinedStatus, PullRequestSnapshot, PullRequestState,
    Review, ReviewDecision, ReviewState,
};
pub use rate_limit::RateLimitInfo;

#[cfg(test)]
pub use gateway::MockPullRequestGateway;

#[cfg(test)]
mod tests;
