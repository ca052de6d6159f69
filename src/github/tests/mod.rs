//! Unit tests for pull request URL parsing and tokens.

use rstest::rstest;

use super::{GitHubError, PersonalAccessToken, PullRequestLocator};

#[rstest]
#[case::plain("https://github.com/octo/repo/pull/12")]
#[case::trailing_slash("https://github.com/octo/repo/pull/12/")]
#[case::www_host("https://www.github.com/octo/repo/pull/12")]
fn parses_standard_github_url_segments(#[case] url: &str) {
    let locator = PullRequestLocator::parse(url).expect("should parse standard GitHub URL");
    assert_eq!(locator.owner().as_str(), "octo", "owner mismatch");
    assert_eq!(locator.repository().as_str(), "repo", "repository mismatch");
    assert_eq!(locator.number().get(), 12_u64, "number mismatch");
    assert_eq!(
        locator.api_base().as_str(),
        "https://api.github.com/",
        "api base mismatch"
    );
}

#[rstest]
fn parses_enterprise_url() {
    let locator = PullRequestLocator::parse("https://ghe.example.com/foo/bar/pull/7")
        .expect("should parse enterprise URL");
    assert_eq!(
        locator.api_base().as_str(),
        "https://ghe.example.com/api/v3",
        "enterprise api base mismatch"
    );
}

#[rstest]
fn displays_short_reference() {
    let locator = PullRequestLocator::parse("https://github.com/octo/repo/pull/12")
        .expect("should parse standard GitHub URL");
    assert_eq!(locator.to_string(), "octo/repo#12");
}

#[rstest]
#[case::missing_number("https://github.com/octo/repo/pull/")]
#[case::issues_path("https://github.com/octo/repo/issues/4")]
#[case::pulls_collection("https://github.com/octo/repo/pulls/4")]
#[case::files_tab("https://github.com/octo/repo/pull/4/files")]
#[case::repository_only("https://github.com/octo/repo")]
fn rejects_malformed_paths(#[case] url: &str) {
    let result = PullRequestLocator::parse(url);
    assert!(
        matches!(result, Err(GitHubError::MissingPathSegments)),
        "expected MissingPathSegments for {url}, got {result:?}"
    );
}

#[rstest]
#[case::non_numeric("https://github.com/octo/repo/pull/not-a-number")]
#[case::zero("https://github.com/octo/repo/pull/0")]
fn rejects_invalid_numbers(#[case] url: &str) {
    let result = PullRequestLocator::parse(url);
    assert!(
        matches!(result, Err(GitHubError::InvalidPullRequestNumber)),
        "expected InvalidPullRequestNumber for {url}, got {result:?}"
    );
}

#[rstest]
fn rejects_invalid_url() {
    let result = PullRequestLocator::parse("octo/repo/pull/4");
    assert!(
        matches!(result, Err(GitHubError::InvalidUrl(_))),
        "expected InvalidUrl for malformed URL, got {result:?}"
    );
}

#[rstest]
fn builds_api_paths() {
    let locator = PullRequestLocator::parse("https://github.com/octo/repo/pull/4")
        .expect("should parse standard GitHub URL");
    assert_eq!(locator.pull_request_path(), "/repos/octo/repo/pulls/4");
    assert_eq!(
        locator.reviews_path(2, 100),
        "/repos/octo/repo/pulls/4/reviews?per_page=100&page=2"
    );
    assert_eq!(
        locator.check_runs_path("abc", 1, 100),
        "/repos/octo/repo/commits/abc/check-runs?per_page=100&page=1"
    );
    assert_eq!(
        locator.combined_status_path("abc"),
        "/repos/octo/repo/commits/abc/status"
    );
}

#[rstest]
#[case::empty("")]
#[case::whitespace("   ")]
fn rejects_blank_token(#[case] value: &str) {
    let result = PersonalAccessToken::new(value);
    assert!(
        matches!(result, Err(GitHubError::BlankToken)),
        "expected BlankToken, got {result:?}"
    );
}

#[rstest]
fn token_debug_output_is_redacted() {
    let token = PersonalAccessToken::new(" secret ").expect("token should be valid");
    assert_eq!(token.value(), "secret");
    assert!(!format!("{token:?}").contains("secret"));
}
