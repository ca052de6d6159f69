//! Gateways for loading pull request snapshots through Octocrab.
//!
//! The monitor consumes GitHub through the [`PullRequestGateway`] trait so
//! the polling loop can be driven by scripted snapshots in tests, while
//! [`OctocrabGateway`] issues the real HTTP requests.

mod client;
mod error_mapping;
mod http_utils;
mod pull_request;


pub use pull_request::OctocrabGateway;

use async_trait::async_trait;

use crate::github::error::GitHubError;
use crate::github::locator::PullRequestLocator;
use crate::github::models::PullRequestSnapshot;
use crate::github::rate_limit::RateLimitInfo;

/// A snapshot together with the quota GitHub reported while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSnapshot {
    /// The pull request state.
    pub snapshot: PullRequestSnapshot,
    /// Lowest remaining quota observed across the calls that built the
    /// snapshot, when GitHub sent rate limit headers.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Gateway that can load a complete pull request snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestGateway: Send + Sync {
    /// Fetch the pull request, its reviews, and its head commit's checks.
    ///
    /// The fetch succeeds or fails as a whole; partial data is never
    /// returned.
    async fn fetch_snapshot(
        &self,
        locator: &PullRequestLocator,
    ) -> Result<FetchedSnapshot, GitHubError>;

    /// Whether requests carry a credential (5000 requests/hour rather than 60).
    fn is_authenticated(&self) -> bool;
}
