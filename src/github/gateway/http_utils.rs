//! Shared HTTP utilities for the gateway.

use http::HeaderMap;

use crate::github::rate_limit::{RateLimitInfo, unix_now};

pub(super) fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

/// Reads rate limit data from a response.
///
/// Secondary rate limits carry a `retry-after` header instead of an exhausted
/// quota; it is folded into an exhausted [`RateLimitInfo`] whose reset time is
/// `now + retry-after` so the monitor backs off the same way for both.
pub(super) fn rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let retry_after = headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let reported = RateLimitInfo::from_headers(headers);

    match (retry_after, reported) {
        (Some(seconds), info) => Some(RateLimitInfo::new(
            info.map_or(0, |known| known.limit()),
            0,
            unix_now().saturating_add(seconds),
        )),
        (None, info) => info,
    }
}

/// Picks the observation with the least quota left.
pub(super) fn tightest_rate_limit(
    observations: impl IntoIterator<Item = Option<RateLimitInfo>>,
) -> Option<RateLimitInfo> {
    observations
        .into_iter()
        .flatten()
        .min_by_key(RateLimitInfo::remaining)
}
