//! Deployment attempt and status polling tests

use std::time::Duration;

use shipyard::deploy::attempt::{run_attempt, AttemptRequest};
use shipyard::deploy::fsm::FsmSettings;
use shipyard::errors::DeployFailure;
use shipyard::models::deployment::ReadyState;
use shipyard::progress::Milestone;

use crate::support::{batch, build_settings, fast_settings, FakeHosting, Recorder, Step};

async fn attempt(
    api: &FakeHosting,
    settings: &FsmSettings,
    observer: &Recorder,
) -> Result<shipyard::deploy::attempt::AttemptOutcome, DeployFailure> {
    let files = batch(&[("index.html", "<html></html>")]);
    let build = build_settings();
    let request = AttemptRequest {
        project_name: "my-app",
        batch: &files,
        build: &build,
        target: "production",
    };
    run_attempt(api, request, settings, observer).await
}

#[tokio::test(start_paused = true)]
async fn test_attempt_polls_until_ready() {
    let api = FakeHosting::scripted([
        Step::State(ReadyState::Queued),
        Step::State(ReadyState::Building),
        Step::State(ReadyState::Building),
        Step::State(ReadyState::Ready),
    ]);
    let recorder = Recorder::default();

    let outcome = attempt(&api, &fast_settings(), &recorder).await.unwrap();
    assert_eq!(outcome.deployment_id, "dpl_1");
    assert_eq!(outcome.url, "https://my-app-abc123.vercel.app");
    assert_eq!(outcome.polls, 4);
    assert_eq!(api.checks(), 4);

    let milestones = recorder.all();
    assert!(matches!(milestones[0], Milestone::Uploading { files: 1 }));
    assert!(matches!(&milestones[1], Milestone::Uploaded { deployment_id } if deployment_id == "dpl_1"));
    let polled = milestones
        .iter()
        .filter(|m| matches!(m, Milestone::Polled { .. }))
        .count();
    assert_eq!(polled, 3);

    let percents = recorder.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert!(percents.iter().all(|p| *p <= 90));
}

#[tokio::test(start_paused = true)]
async fn test_attempt_times_out_without_terminal_state() {
    let api = FakeHosting {
        fallback: ReadyState::Building,
        ..Default::default()
    };
    let settings = FsmSettings {
        poll_interval: Duration::from_secs(1),
        deadline: Duration::from_secs(2),
    };

    let result = attempt(&api, &settings, &Recorder::default()).await;
    match result {
        Err(DeployFailure::Timeout { waited }) => assert!(waited >= Duration::from_secs(2)),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(api.checks(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_checks_do_not_end_the_attempt() {
    let api = FakeHosting::scripted([
        Step::Fail,
        Step::Fail,
        Step::State(ReadyState::Building),
        Step::Fail,
        Step::State(ReadyState::Ready),
    ]);

    let outcome = attempt(&api, &fast_settings(), &Recorder::default()).await.unwrap();
    assert_eq!(outcome.polls, 5);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_check_is_bounded_by_deadline() {
    let api = FakeHosting::scripted([Step::Hang]);
    let settings = FsmSettings {
        poll_interval: Duration::from_secs(1),
        deadline: Duration::from_secs(3),
    };

    let result = attempt(&api, &settings, &Recorder::default()).await;
    assert!(matches!(result, Err(DeployFailure::Timeout { .. })));
    assert_eq!(api.checks(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_build_state() {
    for state in [ReadyState::Error, ReadyState::Canceled] {
        let api = FakeHosting::scripted([
            Step::State(ReadyState::Building),
            Step::State(state.clone()),
        ]);
        let result = attempt(&api, &fast_settings(), &Recorder::default()).await;
        assert_eq!(result, Err(DeployFailure::BuildFailed { state }));
    }
}

#[tokio::test(start_paused = true)]
async fn test_submission_failure_is_upstream() {
    let api = FakeHosting {
        fail_submit: true,
        ..Default::default()
    };
    let recorder = Recorder::default();

    let result = attempt(&api, &fast_settings(), &recorder).await;
    match result {
        Err(DeployFailure::Upstream(message)) => assert!(message.contains("quota exceeded")),
        other => panic!("expected upstream failure, got {:?}", other),
    }
    assert_eq!(api.checks(), 0);
    assert_eq!(recorder.all().len(), 1);
}
