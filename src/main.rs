//! Prwatch CLI entrypoint: monitors one pull request and prints the result.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use prwatch::monitor::{NoopProgressSink, StderrJsonlProgressSink};
use prwatch::{
    MonitorError, MonitorOutcome, OctocrabGateway, PollScheduler, PrwatchConfig,
    ProgressReporter, ProgressSink,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status for a session that ran out of time.
const TIMEOUT_EXIT_CODE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let (written, code) = match run().await {
        Ok(outcome) => {
            let code = if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(TIMEOUT_EXIT_CODE)
            };
            (write_json(&outcome), code)
        }
        Err(failure) => (write_json(&failure.report()), ExitCode::FAILURE),
    };

    if let Err(write_error) = written {
        error!(error = %write_error, "failed to write result");
        return ExitCode::FAILURE;
    }
    code
}

async fn run() -> Result<MonitorOutcome, MonitorError> {
    let config = load_config()?;
    let request = config.monitor_request()?;
    let token = config.resolve_token()?;

    let gateway =
        OctocrabGateway::for_locator(token.as_ref(), request.locator(), config.request_timeout()?)
            .map_err(|source| MonitorError::Api {
                source,
                poll_count: 0,
                last_snapshot: None,
            })?;

    let sink: Box<dyn ProgressSink> = if config.quiet {
        Box::new(NoopProgressSink)
    } else {
        Box::new(StderrJsonlProgressSink)
    };
    let progress = ProgressReporter::new(sink.as_ref());

    let cancellation = CancellationToken::new();
    let _interrupt = tokio::spawn(cancel_on_interrupt(cancellation.clone()));

    PollScheduler::new(&gateway)
        .with_max_consecutive_rate_limits(config.max_consecutive_rate_limits)
        .run(&request, &progress, &cancellation)
        .await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`MonitorError::Validation`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<PrwatchConfig, MonitorError> {
    PrwatchConfig::load().map_err(|error| MonitorError::validation(error.to_string()))
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prwatch=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn cancel_on_interrupt(cancellation: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("interrupt received; cancelling");
            cancellation.cancel();
        }
        Err(error) => warn!(%error, "cannot listen for interrupts"),
    }
}

fn write_json(value: &impl Serialize) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")
}
