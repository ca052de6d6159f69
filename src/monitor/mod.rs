//! Pull request monitoring sessions.
//!
//! A session polls one pull request through a
//! [`PullRequestGateway`](crate::github::PullRequestGateway) until it is
//! merged, closed, has every check run completed, or the time budget runs out.
//! Rate limit signals are absorbed with bounded back-off, progress is streamed
//! to a [`ProgressSink`], and the caller can cancel at any point through a
//! [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod error;
pub mod evaluator;
pub mod outcome;
pub mod progress;
pub mod request;
pub mod scheduler;
pub mod tracker;

pub use error::{FailureReport, MonitorError};
pub use evaluator::{TerminalDecision, evaluate};
pub use outcome::{MonitorOutcome, TerminalReason};
pub use progress::{
    ChannelProgressSink, NoopProgressSink, ProgressError, ProgressEvent, ProgressReporter,
    ProgressSink, StderrJsonlProgressSink,
};
pub use request::MonitorRequest;
pub use scheduler::PollScheduler;
pub use tracker::{RateLimitState, RateLimitTracker};
