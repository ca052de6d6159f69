//! Progress events and the sinks that receive them.
//!
//! Events describe what a running session is doing. Delivery is best-effort:
//! a sink that fails or is full never interrupts monitoring; the reporter logs
//! the failure and carries on.

use std::io;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::github::locator::PullRequestLocator;
use crate::github::models::PullRequestSnapshot;

/// A structured progress event emitted during a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Emitted once before the first poll.
    Started {
        /// Short reference such as `owner/repo#42`.
        pull_request: String,
        /// Upper estimate of how many polls the session may take.
        estimated_polls: u64,
        /// Whether requests carry a token.
        authenticated: bool,
    },
    /// Emitted after each successful poll that did not end the session.
    Polled {
        /// Seconds since the session started.
        elapsed_seconds: f64,
        /// Successful polls so far, including this one.
        poll_count: u32,
        /// Summary of the fetched snapshot.
        message: String,
    },
    /// Emitted when the session backs off for rate limiting.
    RateLimited {
        /// Seconds since the session started.
        elapsed_seconds: f64,
        /// How long the session will wait before polling again.
        wait_seconds: f64,
        /// Consecutive exhaustion signals so far.
        consecutive: u32,
    },
}

/// Failure to deliver a progress event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgressError {
    /// The receiving channel has no spare capacity.
    #[error("progress channel is full")]
    Full,
    /// The receiving side has gone away.
    #[error("progress receiver has been dropped")]
    Closed,
    /// The event could not be written out.
    #[error("progress output failed: {message}")]
    Output {
        /// Description of the failure.
        message: String,
    },
}

/// A destination for progress events.
pub trait ProgressSink: Send + Sync {
    /// Delivers one event without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError`] when the event could not be delivered.
    fn deliver(&self, event: ProgressEvent) -> Result<(), ProgressError>;
}

/// Sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn deliver(&self, _event: ProgressEvent) -> Result<(), ProgressError> {
        Ok(())
    }
}

/// Writes events to stderr as JSON lines (JSONL).
#[derive(Debug, Default)]
pub struct StderrJsonlProgressSink;

impl ProgressSink for StderrJsonlProgressSink {
    fn deliver(&self, event: ProgressEvent) -> Result<(), ProgressError> {
        let serialised = serde_json::to_string(&event).map_err(|error| ProgressError::Output {
            message: error.to_string(),
        })?;
        writeln_stderr(&serialised).map_err(|error| ProgressError::Output {
            message: error.to_string(),
        })
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// Forwards events into a bounded Tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressSink {
    /// Wraps the sending half of a channel.
    #[must_use]
    pub const fn new(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn deliver(&self, event: ProgressEvent) -> Result<(), ProgressError> {
        self.sender.try_send(event).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => ProgressError::Full,
            mpsc::error::TrySendError::Closed(_) => ProgressError::Closed,
        })
    }
}

/// Builds progress events and hands them to a sink.
#[derive(Clone, Copy)]
pub struct ProgressReporter<'sink> {
    sink: &'sink dyn ProgressSink,
}

impl<'sink> ProgressReporter<'sink> {
    /// Creates a reporter writing to `sink`.
    #[must_use]
    pub const fn new(sink: &'sink dyn ProgressSink) -> Self {
        Self { sink }
    }

    /// Reports the start of a session.
    pub fn started(&self, locator: &PullRequestLocator, estimated_polls: u64, authenticated: bool) {
        self.emit(ProgressEvent::Started {
            pull_request: locator.to_string(),
            estimated_polls,
            authenticated,
        });
    }

    /// Reports a successful, non-terminal poll.
    ///
    /// When the fetch finished past the deadline, this `polled` event is the
    /// last one and the session ends with a timeout right after it.
    pub fn report(&self, elapsed: Duration, poll_count: u32, snapshot: &PullRequestSnapshot) {
        self.emit(ProgressEvent::Polled {
            elapsed_seconds: elapsed.as_secs_f64(),
            poll_count,
            message: format!("Poll #{poll_count}: {}", snapshot.status_line()),
        });
    }

    /// Reports a rate limit back-off.
    pub fn rate_limited(&self, elapsed: Duration, wait: Duration, consecutive: u32) {
        self.emit(ProgressEvent::RateLimited {
            elapsed_seconds: elapsed.as_secs_f64(),
            wait_seconds: wait.as_secs_f64(),
            consecutive,
        });
    }

    fn emit(&self, event: ProgressEvent) {
        if let Err(error) = self.sink.deliver(event) {
            warn!(%error, "dropping progress event");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc;

    use super::{
        ChannelProgressSink, ProgressError, ProgressEvent, ProgressReporter, ProgressSink,
    };
    use crate::github::locator::PullRequestLocator;
    use crate::github::models::test_support::{open_snapshot, running_check};

    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingSink {
        pub(crate) fn take(&self) -> Vec<ProgressEvent> {
            self.events
                .lock()
                .expect("events mutex should be available")
                .drain(..)
                .collect()
        }
    }

    impl ProgressSink for RecordingSink {
        fn deliver(&self, event: ProgressEvent) -> Result<(), ProgressError> {
            self.events
                .lock()
                .expect("events mutex should be available")
                .push(event);
            Ok(())
        }
    }

    struct FailingSink;

    impl ProgressSink for FailingSink {
        fn deliver(&self, _event: ProgressEvent) -> Result<(), ProgressError> {
            Err(ProgressError::Closed)
        }
    }

    #[test]
    fn polled_event_carries_status_line() {
        let sink = RecordingSink::default();
        let reporter = ProgressReporter::new(&sink);
        let snapshot = open_snapshot(4).with_check_runs(vec![running_check("build")]);

        reporter.report(Duration::from_secs(30), 2, &snapshot);

        assert_eq!(
            sink.take(),
            vec![ProgressEvent::Polled {
                elapsed_seconds: 30.0,
                poll_count: 2,
                message: "Poll #2: open | Checks: 0/1 complete | Reviews: none".to_owned(),
            }]
        );
    }

    #[test]
    fn started_event_serialises_with_type_tag() {
        let sink = RecordingSink::default();
        let locator = PullRequestLocator::parse("https://github.com/octo/repo/pull/8")
            .expect("locator should parse");
        ProgressReporter::new(&sink).started(&locator, 120, false);

        let events = sink.take();
        let value = serde_json::to_value(&events).expect("events should serialise");
        assert_eq!(
            value,
            json!([{
                "type": "started",
                "pull_request": "octo/repo#8",
                "estimated_polls": 120,
                "authenticated": false
            }])
        );
    }

    #[test]
    fn delivery_failures_do_not_propagate() {
        let reporter = ProgressReporter::new(&FailingSink);
        reporter.rate_limited(Duration::from_secs(1), Duration::from_secs(60), 1);
    }

    #[tokio::test]
    async fn channel_sink_reports_full_and_closed() {
        let (sender, mut receiver) = mpsc::channel(1);
        let sink = ChannelProgressSink::new(sender);
        let event = ProgressEvent::RateLimited {
            elapsed_seconds: 0.0,
            wait_seconds: 1.0,
            consecutive: 1,
        };

        sink.deliver(event.clone()).expect("first event should fit");
        assert_eq!(sink.deliver(event.clone()), Err(ProgressError::Full));
        assert_eq!(receiver.recv().await, Some(event.clone()));

        drop(receiver);
        assert_eq!(sink.deliver(event), Err(ProgressError::Closed));
    }
}
