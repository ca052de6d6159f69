//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.prwatch.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PRWATCH_PR_URL`, `PRWATCH_TOKEN`,
//!    `PRWATCH_POLL_INTERVAL_SECONDS`, and so on, plus `GITHUB_TOKEN` as a
//!    token fallback
//! 4. **Command-line arguments** – `--pr-url`/`-u`, `--token`/`-t`,
//!    `--poll-interval-seconds`/`-i`, `--max-timeout-seconds`/`-m`
//!
//! # Configuration File
//!
//! ```toml
//! pr_url = "https://github.com/owner/repo/pull/123"
//! token = "ghp_example"
//! poll_interval_seconds = 15
//! max_timeout_seconds = 1800
//! max_consecutive_rate_limits = 3
//! request_timeout_seconds = 30
//! ```

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::locator::PersonalAccessToken;
use crate::monitor::error::MonitorError;
use crate::monitor::request::{
    DEFAULT_MAX_TIMEOUT_SECONDS, DEFAULT_POLL_INTERVAL_SECONDS, MonitorRequest,
};
use crate::monitor::tracker::DEFAULT_MAX_CONSECUTIVE_RATE_LIMITS;

/// Seconds allowed for a single HTTP request when not configured.
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use prwatch::PrwatchConfig;
///
/// let config = PrwatchConfig::load().expect("failed to load configuration");
/// let request = config.monitor_request().expect("invalid monitor request");
/// let token = config.resolve_token().expect("invalid token");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PRWATCH",
    discovery(
        dotfile_name = ".prwatch.toml",
        config_file_name = "prwatch.toml",
        app_name = "prwatch"
    )
)]
pub struct PrwatchConfig {
    /// GitHub pull request URL to monitor.
    ///
    /// Can be provided via:
    /// - CLI: `--pr-url <URL>` or `-u <URL>`
    /// - Environment: `PRWATCH_PR_URL`
    /// - Config file: `pr_url = "..."`
    #[ortho_config(cli_short = 'u')]
    pub pr_url: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Optional: anonymous sessions work against public repositories with a
    /// much smaller quota.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `PRWATCH_TOKEN` or `GITHUB_TOKEN`
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Seconds between polls (5 to 300).
    #[ortho_config(cli_short = 'i')]
    pub poll_interval_seconds: f64,

    /// Seconds before the session gives up (at most 86 400).
    #[ortho_config(cli_short = 'm')]
    pub max_timeout_seconds: f64,

    /// Consecutive rate limit signals tolerated before failing.
    #[ortho_config()]
    pub max_consecutive_rate_limits: u32,

    /// Connect and read timeout for each GitHub request, in seconds (at
    /// least 1).
    #[ortho_config()]
    pub request_timeout_seconds: u64,

    /// Suppresses JSON progress lines on stderr.
    ///
    /// Note: `PRWATCH_QUIET` is not read because `ortho_config` does not load
    /// boolean values from the environment.
    #[ortho_config(cli_short = 'q')]
    pub quiet: bool,
}

impl Default for PrwatchConfig {
    fn default() -> Self {
        Self {
            pr_url: None,
            token: None,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            max_timeout_seconds: DEFAULT_MAX_TIMEOUT_SECONDS,
            max_consecutive_rate_limits: DEFAULT_MAX_CONSECUTIVE_RATE_LIMITS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            quiet: false,
        }
    }
}

impl PrwatchConfig {
    /// Returns the pull request URL or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] when no URL is configured.
    pub fn require_pr_url(&self) -> Result<&str, MonitorError> {
        self.pr_url.as_deref().ok_or_else(|| {
            MonitorError::validation("pull request URL is required (use --pr-url or -u)")
        })
    }

    /// Resolves the token from configuration or the `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// A configured token takes priority. An empty `GITHUB_TOKEN` counts as
    /// unset, so the session runs anonymously.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] when the configured token is
    /// blank.
    pub fn resolve_token(&self) -> Result<Option<PersonalAccessToken>, MonitorError> {
        let candidate = self.token.clone().or_else(|| {
            env::var("GITHUB_TOKEN")
                .ok()
                .filter(|value| !value.trim().is_empty())
        });

        candidate
            .map(PersonalAccessToken::new)
            .transpose()
            .map_err(|error| MonitorError::validation(error.to_string()))
    }

    /// Builds a validated request from the URL and timing settings.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] when the URL is missing or
    /// malformed or the timing settings are out of range.
    pub fn monitor_request(&self) -> Result<MonitorRequest, MonitorError> {
        self.request_timeout()?;
        MonitorRequest::from_url(
            self.require_pr_url()?,
            self.poll_interval_seconds,
            self.max_timeout_seconds,
        )
    }

    /// Per-request timeout for the GitHub client.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] when the timeout is zero, since
    /// every request would then fail before reaching GitHub.
    pub fn request_timeout(&self) -> Result<Duration, MonitorError> {
        if self.request_timeout_seconds == 0 {
            return Err(MonitorError::validation(
                "request timeout must be at least one second",
            ));
        }
        Ok(Duration::from_secs(self.request_timeout_seconds))
    }
}
