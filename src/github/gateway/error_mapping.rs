//! Error mapping helpers for the Octocrab gateway.

use http::StatusCode;

use crate::github::error::GitHubError;
use crate::github::rate_limit::RateLimitInfo;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

const fn is_rate_limit_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status(source.status_code) && message_indicates_rate_limit
}

/// Checks whether a raw response signals quota exhaustion.
///
/// GitHub answers primary exhaustion with `x-ratelimit-remaining: 0` and
/// secondary limits with a "rate limit" message, both as 403 or 429.
pub(super) fn is_rate_limit_response(
    status: StatusCode,
    rate_limit: Option<&RateLimitInfo>,
    message: &str,
) -> bool {
    is_rate_limit_status(status)
        && (rate_limit.is_some_and(RateLimitInfo::is_exhausted)
            || message.to_lowercase().contains("rate limit"))
}

fn rate_limit_exceeded(
    operation: &str,
    rate_limit: Option<RateLimitInfo>,
    message: &str,
) -> GitHubError {
    let base_message = format!("{operation} failed: {message}");
    let full_message = match &rate_limit {
        Some(info) => format!(
            "{base_message} (resets at {reset})",
            reset = info.reset_at()
        ),
        None => base_message,
    };
    GitHubError::RateLimitExceeded {
        rate_limit,
        message: full_message,
    }
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GitHubError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let status = source.status_code;
        return if is_rate_limit_error(source) {
            rate_limit_exceeded(operation, None, &source.message)
        } else if status == StatusCode::NOT_FOUND {
            GitHubError::NotFound {
                resource: operation.to_owned(),
            }
        } else if is_auth_failure(status) {
            GitHubError::Authentication {
                status: status.as_u16(),
                message: format!(
                    "{operation} failed: GitHub returned {status} {message}",
                    message = source.message
                ),
            }
        } else {
            GitHubError::Api {
                status: Some(status.as_u16()),
                message: format!(
                    "{operation} failed with status {status}: {message}",
                    message = source.message
                ),
            }
        };
    }

    if is_network_error(error) {
        return GitHubError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    GitHubError::Api {
        status: None,
        message: format!("{operation} failed: {error}"),
    }
}

pub(super) fn map_http_error(
    operation: &str,
    resource: &str,
    status: StatusCode,
    rate_limit: Option<RateLimitInfo>,
    maybe_message: Option<String>,
) -> GitHubError {
    let message = maybe_message.unwrap_or_else(|| "unknown error".to_owned());
    if is_rate_limit_response(status, rate_limit.as_ref(), &message) {
        rate_limit_exceeded(operation, rate_limit, &message)
    } else if status == StatusCode::NOT_FOUND {
        GitHubError::NotFound {
            resource: resource.to_owned(),
        }
    } else if is_auth_failure(status) {
        GitHubError::Authentication {
            status: status.as_u16(),
            message: format!("{operation} failed: GitHub returned {status} {message}"),
        }
    } else {
        GitHubError::Api {
            status: Some(status.as_u16()),
            message: format!("{operation} failed with status {status}: {message}"),
        }
    }
}
