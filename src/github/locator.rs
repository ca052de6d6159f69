//! URL parsing and identity wrappers for the monitored pull request.

use std::fmt;

use url::Url;

use super::error::GitHubError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, GitHubError> {
        if value.is_empty() {
            return Err(GitHubError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, GitHubError> {
        if value.is_empty() {
            return Err(GitHubError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    pub(crate) const fn new(value: u64) -> Result<Self, GitHubError> {
        if value == 0 {
            return Err(GitHubError::InvalidPullRequestNumber);
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Personal access token wrapper enforcing a non-blank value.
///
/// The token is optional for monitoring: without one GitHub allows 60
/// requests per hour instead of 5000.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::BlankToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GitHubError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GitHubError::BlankToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}

/// Derives the GitHub API base URL from a parsed pull request URL.
///
/// `github.com` maps to the public API; any other host is treated as a
/// GitHub Enterprise instance serving the API under `/api/v3`.
fn derive_api_base(parsed: &Url) -> Result<Url, GitHubError> {
    let host = parsed
        .host_str()
        .ok_or_else(|| GitHubError::InvalidUrl("URL must include a host".to_owned()))?;

    if host.eq_ignore_ascii_case("github.com") || host.eq_ignore_ascii_case("www.github.com") {
        return Url::parse("https://api.github.com")
            .map_err(|error| GitHubError::InvalidUrl(error.to_string()));
    }

    let authority = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let mut api_url = Url::parse(&format!("{}://{authority}", parsed.scheme()))
        .map_err(|error| GitHubError::InvalidUrl(error.to_string()))?;

    api_url
        .set_port(parsed.port())
        .map_err(|()| GitHubError::InvalidUrl("invalid port".to_owned()))?;
    api_url.set_path("api/v3");
    Ok(api_url)
}

/// Parsed pull request URL and derived API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
    number: PullRequestNumber,
}

impl PullRequestLocator {
    /// Parses a GitHub pull request URL in the form
    /// `https://github.com/<owner>/<repo>/pull/<number>`.
    ///
    /// A single trailing slash is accepted; any further path segment (such
    /// as `/files`) is rejected.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::InvalidUrl` when parsing fails, `MissingPathSegments`
    /// when the URL path is not `/owner/repo/pull/<number>`, and
    /// `InvalidPullRequestNumber` when the final segment is not a positive
    /// integer.
    pub fn parse(input: &str) -> Result<Self, GitHubError> {
        let parsed =
            Url::parse(input).map_err(|error| GitHubError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(GitHubError::MissingPathSegments)?;

        let owner_segment = segments.next().ok_or(GitHubError::MissingPathSegments)?;
        let repository_segment = segments.next().ok_or(GitHubError::MissingPathSegments)?;
        let marker = segments.next().ok_or(GitHubError::MissingPathSegments)?;
        let number_segment = segments.next().ok_or(GitHubError::MissingPathSegments)?;

        if marker != "pull" || number_segment.is_empty() {
            return Err(GitHubError::MissingPathSegments);
        }

        if segments.any(|extra| !extra.is_empty()) {
            return Err(GitHubError::MissingPathSegments);
        }

        let owner = RepositoryOwner::new(owner_segment)?;
        let repository = RepositoryName::new(repository_segment)?;
        let number = number_segment
            .parse::<u64>()
            .map_err(|_| GitHubError::InvalidPullRequestNumber)
            .and_then(PullRequestNumber::new)?;

        let api_base = derive_api_base(&parsed)?;

        Ok(Self {
            api_base,
            owner,
            repository,
            number,
        })
    }

    /// API base URL derived from the pull request host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Pull request number.
    #[must_use]
    pub const fn number(&self) -> PullRequestNumber {
        self.number
    }

    fn repository_path(&self) -> String {
        format!(
            "/repos/{}/{}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn pull_request_path(&self) -> String {
        format!("{}/pulls/{}", self.repository_path(), self.number.get())
    }

    pub(crate) fn reviews_path(&self, page: u32, per_page: u8) -> String {
        format!(
            "{}/reviews?per_page={per_page}&page={page}",
            self.pull_request_path()
        )
    }

    pub(crate) fn check_runs_path(&self, sha: &str, page: u32, per_page: u8) -> String {
        format!(
            "{}/commits/{sha}/check-runs?per_page={per_page}&page={page}",
            self.repository_path()
        )
    }

    pub(crate) fn combined_status_path(&self, sha: &str) -> String {
        format!("{}/commits/{sha}/status", self.repository_path())
    }
}

impl fmt::Display for PullRequestLocator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}#{}",
            self.owner.as_str(),
            self.repository.as_str(),
            self.number.get()
        )
    }
}
