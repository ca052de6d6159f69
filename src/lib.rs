//! Pull request monitoring for GitHub.
//!
//! The library polls a single pull request until it is merged, closed, has
//! every check run completed, or a time budget runs out. It wraps Octocrab to
//! parse pull request URLs, hold optional personal access tokens, and fetch
//! snapshots; tracks GitHub rate limits across polls; and streams progress
//! events while the session runs.

pub mod config;
pub mod github;
pub mod monitor;

pub use config::PrwatchConfig;
pub use github::{
    GitHubError, OctocrabGateway, PersonalAccessToken, PullRequestGateway, PullRequestLocator,
    PullRequestSnapshot,
};
pub use monitor::{
    MonitorError, MonitorOutcome, MonitorRequest, PollScheduler, ProgressReporter, ProgressSink,
    TerminalReason,
};
