//! Octocrab client construction for the gateway.

use std::time::Duration;

use http::Uri;
use octocrab::Octocrab;

use crate::github::error::GitHubError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Builds an Octocrab client for the API base URL.
///
/// The token is optional; anonymous clients work against public
/// repositories with a lower quota. `request_timeout` bounds connecting and
/// reading for each individual HTTP call, independently of how long the
/// monitoring session runs.
///
/// # Errors
///
/// Returns `GitHubError::InvalidUrl` when the base URI cannot be parsed or
/// `GitHubError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: Option<&PersonalAccessToken>,
    api_base: &str,
    request_timeout: Duration,
) -> Result<Octocrab, GitHubError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| GitHubError::InvalidUrl(error.to_string()))?;

    let mut builder = Octocrab::builder()
        .set_connect_timeout(Some(request_timeout))
        .set_read_timeout(Some(request_timeout));
    if let Some(credential) = token {
        builder = builder.personal_token(credential.as_ref());
    }

    builder
        .base_uri(base_uri)
        .map_err(|error| GitHubError::Api {
            status: None,
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
