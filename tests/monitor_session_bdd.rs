//! Behavioural tests for complete monitoring sessions over HTTP.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use prwatch::monitor::NoopProgressSink;
use prwatch::{
    MonitorError, MonitorOutcome, MonitorRequest, OctocrabGateway, PollScheduler,
    ProgressReporter,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type StepResult = Result<(), String>;

/// Shared runtime wrapper that can be stored in an rstest-bdd Slot.
#[derive(Clone)]
struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

#[derive(ScenarioState, Default)]
struct SessionState {
    runtime: Slot<SharedRuntime>,
    server: Slot<MockServer>,
    rate_limit_bound: Slot<u32>,
    outcome: Slot<MonitorOutcome>,
    error: Slot<MonitorError>,
}

#[fixture]
fn session_state() -> SessionState {
    SessionState::default()
}

fn ensure_runtime_and_server(state: &SessionState) -> Result<SharedRuntime, String> {
    if state.runtime.with_ref(|_| ()).is_none() {
        let runtime =
            Runtime::new().map_err(|error| format!("failed to create Tokio runtime: {error}"))?;
        state
            .runtime
            .set(SharedRuntime(Rc::new(RefCell::new(runtime))));
    }

    let runtime = state
        .runtime
        .get()
        .ok_or_else(|| "runtime not initialised".to_owned())?;

    if state.server.with_ref(|_| ()).is_none() {
        state.server.set(runtime.block_on(MockServer::start()));
    }

    Ok(runtime)
}

fn mount(state: &SessionState, mocks: Vec<Mock>) -> StepResult {
    let runtime = ensure_runtime_and_server(state)?;
    state
        .server
        .with_ref(|server| {
            for mock in mocks {
                runtime.block_on(mock.mount(server));
            }
        })
        .ok_or_else(|| "mock server not initialised".to_owned())
}

fn pull_request_body(pr: u64, state: &str, merged: bool) -> Value {
    json!({
        "number": pr,
        "title": "Add monitor",
        "state": state,
        "merged": merged,
        "draft": false,
        "user": { "login": "octocat" },
        "head": { "sha": "cafe" },
        "labels": [],
        "assignees": [],
        "comments": 0
    })
}

fn json_mock(route: String, body: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

fn snapshot_mocks(pr: u64, pull_request: Value, check_runs: Value) -> Vec<Mock> {
    vec![
        json_mock(format!("/api/v3/repos/owner/repo/pulls/{pr}"), pull_request),
        json_mock(
            format!("/api/v3/repos/owner/repo/pulls/{pr}/reviews"),
            json!([]),
        ),
        json_mock(
            "/api/v3/repos/owner/repo/commits/cafe/check-runs".to_owned(),
            json!({ "total_count": 1, "check_runs": check_runs }),
        ),
        json_mock(
            "/api/v3/repos/owner/repo/commits/cafe/status".to_owned(),
            json!({ "state": "pending" }),
        ),
    ]
}

#[given("a mock GitHub API server with merged pull request {pr:u64}")]
fn seed_merged_pull_request(session_state: &SessionState, pr: u64) -> StepResult {
    mount(
        session_state,
        snapshot_mocks(pr, pull_request_body(pr, "closed", true), json!([])),
    )
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given(
    "a mock GitHub API server with pull request {pr:u64} whose checks finished with \
     {conclusion}"
)]
fn seed_finished_checks(session_state: &SessionState, pr: u64, conclusion: String) -> StepResult {
    let check_runs = json!([
        { "name": "build", "status": "completed", "conclusion": "success" },
        { "name": "test", "status": "completed", "conclusion": conclusion.trim_matches('"') }
    ]);
    mount(
        session_state,
        snapshot_mocks(pr, pull_request_body(pr, "open", false), check_runs),
    )
}

#[given("a mock GitHub API server without pull request {pr:u64}")]
fn seed_missing_pull_request(session_state: &SessionState, pr: u64) -> StepResult {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/api/v3/repos/owner/repo/pulls/{pr}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })));
    mount(session_state, vec![mock])
}

#[given("a mock GitHub API server whose rate limit is exhausted for pull request {pr:u64}")]
fn seed_exhausted_rate_limit(session_state: &SessionState, pr: u64) -> StepResult {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/api/v3/repos/owner/repo/pulls/{pr}")))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-limit", "60")
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        );
    mount(session_state, vec![mock])
}

#[given("a rate limit bound of {bound:u32}")]
fn remember_bound(session_state: &SessionState, bound: u32) {
    session_state.rate_limit_bound.set(bound);
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[when("the monitor watches {pr_url}")]
fn watch_pull_request(session_state: &SessionState, pr_url: String) -> StepResult {
    let runtime = ensure_runtime_and_server(session_state)?;
    let server_url = session_state
        .server
        .with_ref(MockServer::uri)
        .ok_or_else(|| "mock server URL missing".to_owned())?;
    let resolved_url = pr_url
        .trim_matches('"')
        .replace("https://SERVER", &server_url);

    let request =
        MonitorRequest::from_url(&resolved_url, 5.0, 60.0).map_err(|error| error.to_string())?;
    let bound = session_state.rate_limit_bound.get().unwrap_or(3);

    let result = runtime.block_on(async {
        let gateway =
            OctocrabGateway::for_locator(None, request.locator(), Duration::from_secs(5))
                .map_err(|error| error.to_string())?;
        let sink = NoopProgressSink;
        Ok::<_, String>(
            PollScheduler::new(&gateway)
                .with_max_consecutive_rate_limits(bound)
                .run(
                    &request,
                    &ProgressReporter::new(&sink),
                    &CancellationToken::new(),
                )
                .await,
        )
    })?;

    match result {
        Ok(outcome) => session_state.outcome.set(outcome),
        Err(error) => session_state.error.set(error),
    }
    Ok(())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("the session succeeds with reason {reason}")]
fn assert_success(session_state: &SessionState, reason: String) -> StepResult {
    let outcome = session_state
        .outcome
        .get()
        .ok_or_else(|| format!("expected an outcome, got error {:?}", session_state.error.get()))?;
    let expected = reason.trim_matches('"');

    if outcome.success && outcome.reason.as_str() == expected {
        Ok(())
    } else {
        Err(format!("expected successful {expected} outcome, got {outcome:?}"))
    }
}

#[then("the session performed {count:u32} polls")]
fn assert_poll_count(session_state: &SessionState, count: u32) -> StepResult {
    let actual = session_state
        .outcome
        .with_ref(|outcome| outcome.poll_count)
        .ok_or_else(|| "outcome missing".to_owned())?;

    if actual == count {
        Ok(())
    } else {
        Err(format!("expected {count} polls but found {actual}"))
    }
}

#[then("the checks did not pass")]
fn assert_checks_failed(session_state: &SessionState) -> StepResult {
    let passed = session_state
        .outcome
        .with_ref(|outcome| outcome.checks_passed)
        .ok_or_else(|| "outcome missing".to_owned())?;

    if passed == Some(false) {
        Ok(())
    } else {
        Err(format!("expected checks_passed false, got {passed:?}"))
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("the session fails with kind {kind}")]
fn assert_failure_kind(session_state: &SessionState, kind: String) -> StepResult {
    let error = session_state
        .error
        .get()
        .ok_or_else(|| format!("expected an error, got {:?}", session_state.outcome.get()))?;
    let expected = kind.trim_matches('"');

    if error.kind() == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} failure, got {error:?}"))
    }
}

#[then("the reported status code is {status:u16}")]
fn assert_status_code(session_state: &SessionState, status: u16) -> StepResult {
    let actual = session_state
        .error
        .with_ref(|error| error.report().status_code)
        .ok_or_else(|| "error missing".to_owned())?;

    if actual == Some(status) {
        Ok(())
    } else {
        Err(format!("expected status {status}, got {actual:?}"))
    }
}

#[scenario(path = "tests/features/monitor_session.feature", index = 0)]
fn merged_pull_request_ends_session(session_state: SessionState) {
    let _ = session_state;
}

#[scenario(path = "tests/features/monitor_session.feature", index = 1)]
fn failing_checks_end_session(session_state: SessionState) {
    let _ = session_state;
}

#[scenario(path = "tests/features/monitor_session.feature", index = 2)]
fn missing_pull_request_fails(session_state: SessionState) {
    let _ = session_state;
}

#[scenario(path = "tests/features/monitor_session.feature", index = 3)]
fn exhausted_rate_limit_fails(session_state: SessionState) {
    let _ = session_state;
}
