//! End-to-end pipeline tests against a scripted hosting platform

use chrono::Utc;
use openapi_server::{DeployRequest, InputFile};

use shipyard::deploy::pipeline::{DeployInput, ROBOTS_PATH, SITEMAP_PATH};
use shipyard::errors::DeployFailure;
use shipyard::models::deployment::ReadyState;
use shipyard::progress::Milestone;
use shipyard::records::{DeploymentRecord, RecordStore};
use shipyard::workers::reconciler::ReconcileReport;

use crate::support::{harness, FakeHosting, Recorder, Step};

const OWNER: &str = "user_1";
const PLACEHOLDER: &str = "https://my-app.vercel.app";
const LIVE_URL: &str = "https://my-app-abc123.vercel.app";

fn input(customize: impl FnOnce(&mut DeployRequest)) -> DeployInput {
    let mut request = DeployRequest {
        files: vec![InputFile {
            path: "src/App.tsx".to_string(),
            content: "<div className='flex p-4'>Hi</div>".to_string(),
            encoding: None,
        }],
        project_name: "My App".to_string(),
        ..Default::default()
    };
    customize(&mut request);
    DeployInput::from_request(OWNER, request).unwrap()
}

fn record(id: &str, owner: &str, remote_id: &str, url: &str) -> DeploymentRecord {
    DeploymentRecord {
        id: id.to_string(),
        owner: owner.to_string(),
        name: "Old Name".to_string(),
        remote_project_id: remote_id.to_string(),
        remote_project_name: "my-app".to_string(),
        url: Some(url.to_string()),
        custom_domain: None,
        last_deployment_id: Some("dpl_0".to_string()),
        status: "ready".to_string(),
        artifact_id: None,
        updated_at: Utc::now(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_deploy_schedules_reconciliation() {
    let mut h = harness(FakeHosting::scripted([
        Step::State(ReadyState::Queued),
        Step::State(ReadyState::Building),
        Step::State(ReadyState::Ready),
    ]));
    let recorder = Recorder::default();

    let outcome = h.pipeline.run(input(|_| {}), &recorder).await.unwrap();
    assert_eq!(outcome.url, LIVE_URL);
    assert_eq!(outcome.deployment_id, "dpl_1");
    assert_eq!(outcome.project.name, "my-app");
    assert!(outcome.reconciliation_scheduled);
    assert!(outcome.seo_score.is_some());
    assert_eq!(*h.api.created.lock().unwrap(), vec!["my-app".to_string()]);

    // The first upload carried the provisional URL
    let (name, first) = h.api.submissions().remove(0);
    assert_eq!(name, "my-app");
    let sitemap = first.get(SITEMAP_PATH).unwrap().as_text().unwrap();
    assert!(sitemap.contains(&format!("<loc>{}/</loc>", PLACEHOLDER)));
    assert!(first.contains(ROBOTS_PATH));
    assert!(first.contains("package.json"));

    // The record points at the live URL
    let records = h.store.all();
    assert_eq!(records.len(), 1);
    assert_eq!(Some(records[0].id.clone()), outcome.record_id);
    assert_eq!(records[0].url.as_deref(), Some(LIVE_URL));
    assert_eq!(records[0].remote_project_id, "prj_my-app");
    assert_eq!(records[0].status, "ready");

    // Background redeploy replaces the placeholder
    match h.reports.recv().await.unwrap() {
        ReconcileReport::Succeeded { project_name, deployment_id, url } => {
            assert_eq!(project_name, "my-app");
            assert_eq!(deployment_id, "dpl_2");
            assert_eq!(url, LIVE_URL);
        }
        other => panic!("unexpected report {:?}", other),
    }
    let submissions = h.api.submissions();
    assert_eq!(submissions.len(), 2);
    let sitemap = submissions[1].1.get(SITEMAP_PATH).unwrap().as_text().unwrap();
    assert!(!sitemap.contains(PLACEHOLDER));
    assert!(sitemap.contains(LIVE_URL));

    // The reconciliation did not write the record
    assert_eq!(h.store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_milestones_are_monotonic() {
    let h = harness(FakeHosting::scripted([
        Step::State(ReadyState::Queued),
        Step::Fail,
        Step::State(ReadyState::Building),
        Step::State(ReadyState::Ready),
    ]));
    let recorder = Recorder::default();

    h.pipeline.run(input(|_| {}), &recorder).await.unwrap();

    let percents = recorder.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert_eq!(percents.first(), Some(&2));
    assert_eq!(percents.last(), Some(&97));

    let milestones = recorder.all();
    assert!(milestones.iter().any(|m| matches!(m, Milestone::SeoAnalyzed { .. })));
    assert!(!milestones.iter().any(|m| matches!(m, Milestone::SeoFixed { .. })));
    assert!(milestones
        .iter()
        .any(|m| matches!(m, Milestone::Live { url } if url == LIVE_URL)));
}

#[tokio::test(start_paused = true)]
async fn test_custom_domain_becomes_final_url() {
    let h = harness(FakeHosting::default());

    let outcome = h
        .pipeline
        .run(input(|r| r.custom_domain = Some("example.com".into())), &Recorder::default())
        .await
        .unwrap();
    assert_eq!(outcome.url, "https://example.com");
    assert!(!outcome.reconciliation_scheduled);

    let (_, first) = h.api.submissions().remove(0);
    let robots = first.get(ROBOTS_PATH).unwrap().as_text().unwrap();
    assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));

    let records = h.store.all();
    assert_eq!(records[0].url.as_deref(), Some("https://example.com"));
    assert_eq!(records[0].custom_domain.as_deref(), Some("example.com"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_domain_keeps_platform_url() {
    let h = harness(FakeHosting {
        fail_domain: true,
        ..Default::default()
    });
    let recorder = Recorder::default();

    let outcome = h
        .pipeline
        .run(input(|r| r.custom_domain = Some("example.com".into())), &recorder)
        .await
        .unwrap();
    assert_eq!(outcome.url, LIVE_URL);
    assert!(recorder
        .all()
        .iter()
        .any(|m| matches!(m, Milestone::DomainFailed { domain } if domain == "example.com")));
}

#[tokio::test(start_paused = true)]
async fn test_recorded_url_avoids_reconciliation() {
    let h = harness(FakeHosting::default().with_project("prj_1", "my-app"));
    h.store
        .put(record("rec_1", OWNER, "prj_1", "https://my-app-old.vercel.app"))
        .await
        .unwrap();

    let outcome = h.pipeline.run(input(|_| {}), &Recorder::default()).await.unwrap();
    assert!(!outcome.reconciliation_scheduled);
    assert!(h.api.created.lock().unwrap().is_empty());

    let (_, first) = h.api.submissions().remove(0);
    let sitemap = first.get(SITEMAP_PATH).unwrap().as_text().unwrap();
    assert!(sitemap.contains("https://my-app-old.vercel.app/"));

    // Same row, refreshed
    assert_eq!(outcome.record_id.as_deref(), Some("rec_1"));
    let records = h.store.all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url.as_deref(), Some(LIVE_URL));
    assert_eq!(records[0].name, "My App");
    assert_eq!(records[0].last_deployment_id.as_deref(), Some("dpl_1"));
}

#[tokio::test(start_paused = true)]
async fn test_record_of_another_owner_is_ignored() {
    let h = harness(FakeHosting::default().with_project("prj_1", "my-app"));
    h.store
        .put(record("rec_other", "someone_else", "prj_1", "https://elsewhere.example"))
        .await
        .unwrap();

    let outcome = h
        .pipeline
        .run(input(|r| r.project_id = Some("rec_other".into())), &Recorder::default())
        .await
        .unwrap();

    // No usable URL, so the provisional one was used
    assert!(outcome.reconciliation_scheduled);
    let record_id = outcome.record_id.unwrap();
    assert_ne!(record_id, "rec_other");

    let other = h.store.get("rec_other").await.unwrap().unwrap();
    assert_eq!(other.url.as_deref(), Some("https://elsewhere.example"));
    let mine = h.store.get(&record_id).await.unwrap().unwrap();
    assert_eq!(mine.owner, OWNER);
}

#[tokio::test(start_paused = true)]
async fn test_auto_fix_rewrites_entry_page() {
    let h = harness(FakeHosting::default());
    let recorder = Recorder::default();

    h.pipeline
        .run(
            input(|r| {
                r.auto_fix_seo = Some(true);
                r.files.push(InputFile {
                    path: "about/index.html".to_string(),
                    content: "<html><head></head><body><h1>About</h1></body></html>".to_string(),
                    encoding: None,
                });
            }),
            &recorder,
        )
        .await
        .unwrap();

    assert!(recorder
        .all()
        .iter()
        .any(|m| matches!(m, Milestone::SeoFixed { applied } if *applied > 0)));
    let (_, first) = h.api.submissions().remove(0);
    let about = first.get("about/index.html").unwrap().as_text().unwrap();
    assert!(about.contains("<title>"));
    assert!(about.contains("lang="));
}

#[tokio::test(start_paused = true)]
async fn test_build_failure_writes_no_record() {
    let h = harness(FakeHosting::scripted([
        Step::State(ReadyState::Building),
        Step::State(ReadyState::Error),
    ]));

    let result = h.pipeline.run(input(|_| {}), &Recorder::default()).await;
    assert_eq!(result, Err(DeployFailure::BuildFailed { state: ReadyState::Error }));
    assert!(h.store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_project_lookup_failure_is_fatal() {
    let h = harness(FakeHosting {
        fail_lookup: true,
        ..Default::default()
    });

    let result = h.pipeline.run(input(|_| {}), &Recorder::default()).await;
    assert!(matches!(result, Err(DeployFailure::Upstream(_))));
    assert!(h.api.submissions().is_empty());
}
