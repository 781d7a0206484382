//! Background reconciliation tests

use std::sync::Arc;

use shipyard::deploy::site_url::SiteUrlDecision;
use shipyard::errors::DeployFailure;
use shipyard::models::deployment::ReadyState;
use shipyard::workers::reconciler::{self, ReconcileReport, Reconciler};

use crate::support::{batch, build_settings, fast_settings, FakeHosting, Step};

const PLACEHOLDER: &str = "https://my-app.vercel.app";
const REAL_URL: &str = "https://my-app-abc123.vercel.app";

#[tokio::test(start_paused = true)]
async fn test_detached_job_reports_success() {
    let api = Arc::new(FakeHosting::scripted([
        Step::State(ReadyState::Building),
        Step::State(ReadyState::Ready),
    ]));
    let (reconciler, mut reports) = Reconciler::new(api.clone(), fast_settings());

    let decision = SiteUrlDecision::resolve(None, None, PLACEHOLDER);
    let files = batch(&[
        ("public/sitemap.xml", "<loc>https://my-app.vercel.app/</loc>"),
        ("src/App.tsx", "const home = 'https://my-app.vercel.app'"),
    ]);
    let job = Reconciler::prepare(&decision, &files, REAL_URL, "my-app", &build_settings(), "production")
        .unwrap();
    assert_eq!(job.real_url, REAL_URL);

    let _ = reconciler.detach(job);
    match reports.recv().await.unwrap() {
        ReconcileReport::Succeeded { project_name, url, .. } => {
            assert_eq!(project_name, "my-app");
            assert_eq!(url, REAL_URL);
        }
        other => panic!("unexpected report {:?}", other),
    }

    let (_, submitted) = api.submissions().remove(0);
    assert_eq!(
        submitted.get("public/sitemap.xml").unwrap().as_text(),
        Some("<loc>https://my-app-abc123.vercel.app/</loc>")
    );
    assert_eq!(
        submitted.get("src/App.tsx").unwrap().as_text(),
        Some("const home = 'https://my-app.vercel.app'")
    );
}

#[tokio::test(start_paused = true)]
async fn test_detached_job_reports_failure() {
    let api = Arc::new(FakeHosting::scripted([Step::State(ReadyState::Error)]));
    let (reconciler, mut reports) = Reconciler::new(api, fast_settings());

    let decision = SiteUrlDecision::resolve(None, None, PLACEHOLDER);
    let files = batch(&[("public/robots.txt", "Sitemap: https://my-app.vercel.app/sitemap.xml")]);
    let job = Reconciler::prepare(&decision, &files, REAL_URL, "my-app", &build_settings(), "production")
        .unwrap();

    reconciler.detach(job).await.unwrap();
    assert_eq!(
        reports.recv().await,
        Some(ReconcileReport::Failed {
            project_name: "my-app".to_string(),
            failure: DeployFailure::BuildFailed { state: ReadyState::Error },
        })
    );
}

#[test]
fn test_no_job_without_placeholder() {
    let files = batch(&[("public/sitemap.xml", "<loc>https://example.com/</loc>")]);
    let custom = SiteUrlDecision::resolve(Some("example.com"), None, PLACEHOLDER);
    assert!(Reconciler::prepare(&custom, &files, REAL_URL, "my-app", &build_settings(), "production").is_none());

    // Placeholder decided, but nothing carries it
    let provisional = SiteUrlDecision::resolve(None, None, PLACEHOLDER);
    assert!(
        Reconciler::prepare(&provisional, &files, REAL_URL, "my-app", &build_settings(), "production")
            .is_none()
    );
}

#[tokio::test]
async fn test_log_worker_stops_on_shutdown() {
    let (_reconciler, reports) = Reconciler::new(Arc::new(FakeHosting::default()), fast_settings());
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let worker = tokio::spawn(reconciler::run(
        reports,
        Box::pin(async move {
            let _ = rx.await;
        }),
    ));
    tx.send(()).unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn test_log_worker_stops_when_senders_are_gone() {
    let (reconciler, reports) = Reconciler::new(Arc::new(FakeHosting::default()), fast_settings());
    let worker = tokio::spawn(reconciler::run(reports, Box::pin(std::future::pending::<()>())));
    drop(reconciler);
    worker.await.unwrap();
}
