//! Deployment record upsert tests

use shipyard::models::deployment::RemoteProject;
use shipyard::records::{self, DeploymentSuccess, MemoryRecordStore, RecordStore};

fn remote() -> RemoteProject {
    RemoteProject {
        id: "prj_1".to_string(),
        name: "my-app".to_string(),
    }
}

fn success<'a>(remote: &'a RemoteProject, name: &'a str, url: &'a str) -> DeploymentSuccess<'a> {
    DeploymentSuccess {
        owner: "user_1",
        name,
        remote,
        url,
        custom_domain: None,
        deployment_id: "dpl_1",
        artifact_id: Some("art_1"),
        record_id: None,
    }
}

#[tokio::test]
async fn test_insert_then_update_by_remote_project() {
    let store = MemoryRecordStore::new();
    let remote = remote();

    let first = records::upsert(&store, &success(&remote, "My App", "https://a.vercel.app"))
        .await
        .unwrap();
    assert_eq!(first.status, "ready");
    assert_eq!(first.artifact_id.as_deref(), Some("art_1"));

    let second = records::upsert(&store, &success(&remote, "Renamed", "https://b.vercel.app"))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.name, "Renamed");
    assert_eq!(second.url.as_deref(), Some("https://b.vercel.app"));
    assert_eq!(store.len(), 1);

    let url = store.find_url_by_remote_id("user_1", "prj_1").await.unwrap();
    assert_eq!(url.as_deref(), Some("https://b.vercel.app"));
    assert_eq!(store.find_url_by_remote_id("user_2", "prj_1").await.unwrap(), None);
}

#[tokio::test]
async fn test_explicit_record_id_keeps_name() {
    let store = MemoryRecordStore::new();
    let remote = remote();
    let first = records::upsert(&store, &success(&remote, "My App", "https://a.vercel.app"))
        .await
        .unwrap();

    let mut update = success(&remote, "Other Name", "https://c.vercel.app");
    update.record_id = Some(first.id.as_str());
    update.custom_domain = Some("example.com");
    let updated = records::upsert(&store, &update).await.unwrap();

    assert_eq!(updated.id, first.id);
    assert_eq!(updated.name, "My App");
    assert_eq!(updated.custom_domain.as_deref(), Some("example.com"));
    assert!(updated.updated_at >= first.updated_at);
}

#[tokio::test]
async fn test_unknown_record_id_falls_back_to_insert() {
    let store = MemoryRecordStore::new();
    let remote = remote();

    let mut fresh = success(&remote, "My App", "https://a.vercel.app");
    fresh.record_id = Some("missing");
    let record = records::upsert(&store, &fresh).await.unwrap();

    assert_ne!(record.id, "missing");
    assert_eq!(store.get(&record.id).await.unwrap(), Some(record));
}
