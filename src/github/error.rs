//! Error types exposed by the GitHub access layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while parsing input or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHubError {
    /// The provided URL could not be parsed.
    #[error("pull request URL is invalid: {0}")]
    InvalidUrl(String),

    /// The pull request path is incomplete.
    #[error("pull request URL must match /owner/repo/pull/<number>")]
    MissingPathSegments,

    /// The pull request number is not a valid integer.
    #[error("pull request number must be a positive integer")]
    InvalidPullRequestNumber,

    /// The authentication token was blank.
    #[error("personal access token must not be blank")]
    BlankToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// HTTP status returned by GitHub (401 or 403).
        status: u16,
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// The pull request or one of its sub-resources does not exist.
    #[error("resource not found: {resource}")]
    NotFound {
        /// API path that returned 404.
        resource: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// HTTP status code, when the failure came from a response.
        status: Option<u16>,
        /// Response body or decode failure describing the problem.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403/429 with an exhausted quota.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from response headers.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },
}

impl GitHubError {
    /// Returns true when the failure means the request quota is exhausted.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// Returns the rate limit data attached to a rate limit failure.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimitInfo> {
        match self {
            Self::RateLimitExceeded { rate_limit, .. } => *rate_limit,
            _ => None,
        }
    }

    /// Returns the HTTP status associated with the failure, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => *status,
            Self::RateLimitExceeded { .. } => Some(403),
            Self::InvalidUrl(_)
            | Self::MissingPathSegments
            | Self::InvalidPullRequestNumber
            | Self::BlankToken
            | Self::Network { .. } => None,
        }
    }
}
