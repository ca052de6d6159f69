//! Octocrab implementation of the pull request gateway.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use http::Uri;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;

use crate::github::error::GitHubError;
use crate::github::locator::{PersonalAccessToken, PullRequestLocator};
use crate::github::models::{
    ApiCheckRun, ApiCheckRunPage, ApiCombinedStatus, ApiPullRequest, ApiReview, ApiSnapshotParts,
};
use crate::github::rate_limit::RateLimitInfo;

use super::client::build_octocrab_client;
use super::error_mapping::{map_http_error, map_octocrab_error};
use super::http_utils::{extract_github_message, rate_limit_from_headers, tightest_rate_limit};
use super::{FetchedSnapshot, PullRequestGateway};

/// Page size used for paginated listings; GitHub's maximum.
const PER_PAGE: u8 = 100;

/// A decoded response body with the quota reported alongside it.
struct Observed<T> {
    value: T,
    rate_limit: Option<RateLimitInfo>,
}

/// Octocrab-backed gateway.
pub struct OctocrabGateway {
    client: Octocrab,
    authenticated: bool,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab, authenticated: bool) -> Self {
        Self {
            client,
            authenticated,
        }
    }

    /// Builds an Octocrab client for the pull request's API host.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::InvalidUrl` when the base URI cannot be parsed or
    /// `GitHubError::Api` when Octocrab fails to construct a client.
    pub fn for_locator(
        token: Option<&PersonalAccessToken>,
        locator: &PullRequestLocator,
        request_timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let octocrab =
            build_octocrab_client(token, locator.api_base().as_str(), request_timeout)?;
        Ok(Self::new(octocrab, token.is_some()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: String,
    ) -> Result<Observed<T>, GitHubError> {
        let uri: Uri = path
            .parse::<Uri>()
            .map_err(|error| GitHubError::InvalidUrl(error.to_string()))?;

        let response = self
            .client
            ._get(uri)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        let rate_limit = rate_limit_from_headers(response.headers());
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        if !status.is_success() {
            return Err(map_http_error(
                operation,
                &path,
                status,
                rate_limit,
                extract_github_message(&body),
            ));
        }

        let value = serde_json::from_str(&body).map_err(|error| GitHubError::Api {
            status: Some(status.as_u16()),
            message: format!("{operation} response deserialisation failed: {error}"),
        })?;

        Ok(Observed { value, rate_limit })
    }

    async fn reviews(
        &self,
        locator: &PullRequestLocator,
    ) -> Result<Observed<Vec<ApiReview>>, GitHubError> {
        let mut reviews = Vec::new();
        let mut observations = Vec::new();
        let mut page = 1_u32;
        loop {
            let Observed { value, rate_limit } = self
                .get_json::<Vec<ApiReview>>("reviews", locator.reviews_path(page, PER_PAGE))
                .await?;
            observations.push(rate_limit);
            let short_page = value.len() < usize::from(PER_PAGE);
            reviews.extend(value);
            if short_page {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(Observed {
            value: reviews,
            rate_limit: tightest_rate_limit(observations),
        })
    }

    async fn check_runs(
        &self,
        locator: &PullRequestLocator,
        sha: &str,
    ) -> Result<Observed<Vec<ApiCheckRun>>, GitHubError> {
        let mut runs = Vec::new();
        let mut observations = Vec::new();
        let mut page = 1_u32;
        loop {
            let Observed { value, rate_limit } = self
                .get_json::<ApiCheckRunPage>(
                    "check runs",
                    locator.check_runs_path(sha, page, PER_PAGE),
                )
                .await?;
            observations.push(rate_limit);
            let short_page = value.check_runs.len() < usize::from(PER_PAGE);
            runs.extend(value.check_runs);
            if short_page {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(Observed {
            value: runs,
            rate_limit: tightest_rate_limit(observations),
        })
    }
}

#[async_trait]
impl PullRequestGateway for OctocrabGateway {
    async fn fetch_snapshot(
        &self,
        locator: &PullRequestLocator,
    ) -> Result<FetchedSnapshot, GitHubError> {
        // The head SHA is needed before checks can be listed.
        let pull_request = self
            .get_json::<ApiPullRequest>("pull request", locator.pull_request_path())
            .await?;
        let sha = pull_request.value.head.sha.clone();

        let (reviews, check_runs, combined_status) = tokio::try_join!(
            self.reviews(locator),
            self.check_runs(locator, &sha),
            self.get_json::<ApiCombinedStatus>(
                "combined status",
                locator.combined_status_path(&sha)
            ),
        )?;

        let rate_limit = tightest_rate_limit([
            pull_request.rate_limit,
            reviews.rate_limit,
            check_runs.rate_limit,
            combined_status.rate_limit,
        ]);

        let snapshot = ApiSnapshotParts {
            pull_request: pull_request.value,
            reviews: reviews.value,
            check_runs: check_runs.value,
            combined_status: combined_status.value,
        }
        .into_snapshot(Utc::now());

        Ok(FetchedSnapshot {
            snapshot,
            rate_limit,
        })
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
