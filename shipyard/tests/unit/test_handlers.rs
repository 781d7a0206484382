//! HTTP surface tests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use shipyard::server::serve::router;
use shipyard::server::state::ServerState;

use crate::support::{harness, FakeHosting, Harness};

fn app(api: FakeHosting) -> (Router, Harness) {
    let h = harness(api);
    (router(Arc::new(ServerState::new(h.pipeline.clone()))), h)
}

fn deploy_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/deploy")
        .header("content-type", "application/json")
        .header("x-owner-id", "user_1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _h) = app(FakeHosting::default());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "shipyard");
}

#[tokio::test]
async fn test_missing_files_is_rejected_before_streaming() {
    let (app, h) = app(FakeHosting::default());
    let response = app
        .oneshot(deploy_request(r#"{"files": [], "projectName": "My App"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "missing files");
    assert!(h.api.submissions().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let (app, _h) = app(FakeHosting::default());
    let response = app.oneshot(deploy_request("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test(start_paused = true)]
async fn test_deploy_streams_progress_and_end_marker() {
    let (app, h) = app(FakeHosting::default());
    let request = deploy_request(
        r#"{
            "files": [{"path": "src/App.tsx", "content": "<div className='flex p-4'>Hi</div>"}],
            "projectName": "My App"
        }"#,
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let text = body_text(response).await;
    let events: Vec<serde_json::Value> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter(|data| *data != "[DONE]")
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();

    let percents: Vec<u64> = events.iter().map(|e| e["percent"].as_u64().unwrap()).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);

    assert!(events.iter().any(|e| e["type"] == "seo_analysis"));
    let last = events.last().unwrap();
    assert_eq!(last["type"], "complete");
    assert_eq!(last["percent"], 100);
    assert_eq!(last["url"], "https://my-app-abc123.vercel.app");
    assert_eq!(last["deploymentId"], "dpl_1");
    assert!(last["projectId"].is_string());

    assert!(text.trim_end().ends_with("event: end\ndata: [DONE]"));
    assert_eq!(h.store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deploy_failure_is_an_error_event() {
    let (app, h) = app(FakeHosting {
        fail_submit: true,
        ..Default::default()
    });
    let request = deploy_request(
        r#"{"files": [{"path": "index.html", "content": "<h1>Hi</h1>"}], "projectName": "site"}"#,
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = body_text(response).await;
    let last: serde_json::Value = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter(|data| *data != "[DONE]")
        .last()
        .map(|data| serde_json::from_str(data).unwrap())
        .unwrap();
    assert_eq!(last["type"], "error");
    assert_eq!(last["reason"], "upstream");
    assert!(text.contains("event: end"));
    assert!(h.store.is_empty());
}
