//! Behaviour-driven tests for publishing archives to a release.
//!
//! The GitHub CLI is replaced by a scripted [`StubExecutor`], so scenarios
//! describe the CLI's answers up front and then check how many invocations
//! the publisher made and what it reported.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rust_release_action::error::ReleaseError;
use rust_release_action::release::{ReleasePublisher, TOKEN_ENV};
use rust_release_action::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};

const RELEASE_REF: &str = "v1.0.0";
const TOKEN: &str = "t0ken";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ReleaseWorld {
    archives: Vec<Utf8PathBuf>,
    script: Vec<ExpectedCall>,
    executor: Option<StubExecutor>,
    outcome: Option<Result<(), ReleaseError>>,
}

#[fixture]
fn world() -> ReleaseWorld {
    ReleaseWorld::default()
}

fn upload_args(archives: &[Utf8PathBuf]) -> Vec<&str> {
    let mut args = vec!["release", "upload", RELEASE_REF];
    args.extend(archives.iter().map(|path| path.as_str()));
    args.push("--clobber");
    args
}

fn queue_upload(world: &mut ReleaseWorld, succeeds: bool) {
    let output = if succeeds {
        success_output()
    } else {
        failure_output("HTTP 502: Bad Gateway")
    };
    let call = ExpectedCall::new("gh", &upload_args(&world.archives), Ok(output));
    world.script.push(call);
}

/// Build the stub from the queued script on first use.
fn executor(world: &mut ReleaseWorld) -> &StubExecutor {
    let script = std::mem::take(&mut world.script);
    world.executor.get_or_insert_with(|| StubExecutor::new(script))
}

fn record(world: &mut ReleaseWorld, outcome: Result<(), ReleaseError>) {
    if !matches!(world.outcome, Some(Err(_))) {
        world.outcome = Some(outcome);
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("two packed archives")]
fn given_archives(world: &mut ReleaseWorld) {
    world.archives = vec![
        Utf8PathBuf::from("/tmp/dist/tool-x86_64-unknown-linux-gnu.tar.gz"),
        Utf8PathBuf::from("/tmp/dist/tool-aarch64-apple-darwin.tar.gz"),
    ];
}

#[given("the upload fails {count} times")]
fn given_upload_failures(world: &mut ReleaseWorld, count: String) {
    let failures: usize = count.parse().expect("numeric count");
    for _ in 0..failures {
        queue_upload(world, false);
    }
}

#[given("the upload then succeeds")]
fn given_upload_success(world: &mut ReleaseWorld) {
    queue_upload(world, true);
}

#[given("the release \"{tag}\" does not exist yet")]
fn given_missing_release(world: &mut ReleaseWorld, tag: String) {
    world.script.push(ExpectedCall::new(
        "gh",
        &["release", "view", tag.as_str()],
        Ok(failure_output("release not found")),
    ));
    world.script.push(ExpectedCall::new(
        "gh",
        &["release", "create", tag.as_str(), "--draft", "--generate-notes"],
        Ok(success_output()),
    ));
}

#[when("the release \"{tag}\" is prepared with options \"{options}\"")]
fn when_release_prepared(world: &mut ReleaseWorld, tag: String, options: String) {
    let create_options: Vec<String> = options.split_whitespace().map(str::to_owned).collect();
    let outcome = ReleasePublisher::new(executor(world), Some(TOKEN.to_owned()))
        .ensure_release_exists(&tag, &create_options);
    record(world, outcome);
}

#[when("the archives are published to \"{tag}\"")]
fn when_published(world: &mut ReleaseWorld, tag: String) {
    let archives = world.archives.clone();
    let outcome =
        ReleasePublisher::new(executor(world), Some(TOKEN.to_owned())).publish(&archives, &tag);
    record(world, outcome);
}

#[then("the upload succeeds")]
fn then_upload_succeeds(world: &mut ReleaseWorld) {
    match world.outcome.as_ref().expect("outcome recorded") {
        Ok(()) => {}
        Err(err) => panic!("upload should succeed: {err}"),
    }
}

#[then("the upload fails after {attempts} attempts")]
fn then_upload_fails(world: &mut ReleaseWorld, attempts: String) {
    let expected: u32 = attempts.parse().expect("numeric attempts");
    match world.outcome.as_ref().expect("outcome recorded") {
        Err(ReleaseError::UploadFailed { attempts: made, .. }) => assert_eq!(*made, expected),
        other => panic!("expected an upload failure, got {other:?}"),
    }
}

#[then("the release CLI was called {count} times")]
fn then_cli_calls(world: &mut ReleaseWorld, count: String) {
    let expected: usize = count.parse().expect("numeric count");
    let stub = world.executor.as_ref().expect("executor used");
    stub.assert_finished();
    let received = stub.received();
    assert_eq!(received.len(), expected);
    assert!(
        received
            .iter()
            .all(|command| command.env_value(TOKEN_ENV) == Some(TOKEN)),
        "every gh invocation must carry the token"
    );
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/release_upload.feature",
    name = "Upload gives up after five failed attempts"
)]
fn scenario_upload_exhausted(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_upload.feature",
    name = "Upload succeeds after transient failures"
)]
fn scenario_upload_recovers(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_upload.feature",
    name = "A missing release is created before uploading"
)]
fn scenario_release_created(world: ReleaseWorld) {
    let _ = world;
}
