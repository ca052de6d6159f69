//! Failure modes of a monitoring session.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::github::error::GitHubError;
use crate::github::models::PullRequestSnapshot;

/// Errors that end a monitoring session without a terminal outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// The request was rejected before any network call.
    #[error("invalid monitor request: {message}")]
    Validation {
        /// What was wrong with the request.
        message: String,
    },

    /// The rate limit stayed exhausted for too many consecutive polls.
    #[error(
        "GitHub rate limit exhausted {consecutive} times in a row; retry in {retry_after_seconds}s"
    )]
    RateLimited {
        /// Consecutive exhaustion signals observed.
        consecutive: u32,
        /// Seconds until the quota is expected to reset.
        retry_after_seconds: u64,
        /// Successful polls before giving up.
        poll_count: u32,
        /// The last snapshot fetched, if any.
        last_snapshot: Option<Box<PullRequestSnapshot>>,
    },

    /// A GitHub call failed for a reason other than rate limiting.
    #[error("GitHub request failed: {source}")]
    Api {
        /// The underlying gateway error.
        source: GitHubError,
        /// Successful polls before the failure.
        poll_count: u32,
        /// The last snapshot fetched, if any.
        last_snapshot: Option<Box<PullRequestSnapshot>>,
    },

    /// The caller cancelled the session.
    #[error("monitoring cancelled after {poll_count} polls")]
    Cancelled {
        /// Time spent before cancellation was observed.
        elapsed: Duration,
        /// Successful polls before cancellation.
        poll_count: u32,
    },
}

impl MonitorError {
    /// Builds a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Machine-readable failure kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::Api { .. } => "api_error",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Returns the serialisable failure report for this error.
    #[must_use]
    pub fn report(&self) -> FailureReport<'_> {
        let (status_code, retry_after_seconds, poll_count, final_status) = match self {
            Self::Validation { .. } => (None, None, None, None),
            Self::RateLimited {
                retry_after_seconds,
                poll_count,
                last_snapshot,
                ..
            } => (
                Some(429),
                Some(*retry_after_seconds),
                Some(*poll_count),
                last_snapshot.as_deref(),
            ),
            Self::Api {
                source,
                poll_count,
                last_snapshot,
            } => (
                source.status_code(),
                None,
                Some(*poll_count),
                last_snapshot.as_deref(),
            ),
            Self::Cancelled { poll_count, .. } => (None, None, Some(*poll_count), None),
        };

        FailureReport {
            success: false,
            reason: self.kind(),
            error: self.to_string(),
            status_code,
            retry_after_seconds,
            poll_count,
            final_status,
        }
    }
}

/// JSON shape of a failed session.
#[derive(Debug, Serialize)]
pub struct FailureReport<'a> {
    /// Always `false`.
    pub success: bool,
    /// Failure kind, see [`MonitorError::kind`].
    pub reason: &'static str,
    /// Human-readable description.
    pub error: String,
    /// HTTP status of the failing call, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Seconds until a retry is worthwhile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    /// Successful polls before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_count: Option<u32>,
    /// The last snapshot fetched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_status: Option<&'a PullRequestSnapshot>,
}
