use crate::common::{get_bool, get_string, object, s, setup, EventCapture, TOKEN};
use mockito::Matcher;
use serde_json::json;
use tfplug::context::Context;
use tfplug::types::{has_errors, Dynamic};
use tracing_subscriber::layer::SubscriberExt;

const TYPE: &str = "infradots_organization";
const ORG_ID: &str = "2e24b2f5-1b0a-4b8c-9f5e-0c8d1f2a3b4c";

fn organization_body(execution_mode: &str, agents_enabled: bool, updated_at: &str) -> String {
    json!({
        "id": ORG_ID,
        "name": "test-org",
        "execution_mode": execution_mode,
        "agents_enabled": agents_enabled,
        "created_at": "2025-07-07T12:00:00Z",
        "updated_at": updated_at,
        "members": [{"email": "owner@example.com"}],
        "teams": [{"name": "owners"}],
        "subscription": null,
        "tags": []
    })
    .to_string()
}

#[tokio::test(flavor = "multi_thread")]
async fn organization_lifecycle() {
    let mut t = setup().await;
    let item_path = format!("/api/organizations/{}/", ORG_ID);

    let create_mock = t
        .server
        .mock("POST", "/api/organizations/")
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .match_body(Matcher::Json(json!({
            "name": "test-org",
            "execution_mode": "remote",
            "agents_enabled": true
        })))
        .with_status(201)
        .with_body(organization_body("remote", true, "2025-07-07T12:00:00Z"))
        .create_async()
        .await;

    let created = t
        .create(TYPE, object(&[("name", s("test-org"))]))
        .await;
    create_mock.assert_async().await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);

    let state = created.new_state;
    assert_eq!(get_string(&state, "id"), ORG_ID);
    assert_eq!(get_string(&state, "execution_mode"), "remote");
    assert!(get_bool(&state, "agents_enabled"));
    assert_eq!(get_string(&state, "updated_at"), "2025-07-07T12:00:00Z");

    let first_read = t
        .server
        .mock("GET", item_path.as_str())
        .with_status(200)
        .with_body(organization_body("remote", true, "2025-07-07T12:00:00Z"))
        .create_async()
        .await;

    let read = t.read(TYPE, state.clone()).await;
    assert!(read.diagnostics.is_empty());
    assert_eq!(read.new_state.as_ref(), Some(&state));
    drop(first_read);

    let update_mock = t
        .server
        .mock("PATCH", item_path.as_str())
        .match_body(Matcher::Json(json!({
            "execution_mode": "Local",
            "agents_enabled": false
        })))
        .with_status(200)
        .with_body(organization_body("Local", false, "2025-07-07T12:01:00Z"))
        .create_async()
        .await;

    let updated = t
        .update(
            TYPE,
            state,
            object(&[
                ("name", s("test-org")),
                ("execution_mode", s("Local")),
                ("agents_enabled", Dynamic::Bool(false)),
            ]),
        )
        .await;
    update_mock.assert_async().await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);

    let _second_read = t
        .server
        .mock("GET", item_path.as_str())
        .with_status(200)
        .with_body(organization_body("Local", false, "2025-07-07T12:01:00Z"))
        .create_async()
        .await;

    let refreshed = t.read(TYPE, updated.new_state).await.new_state.unwrap();
    assert_eq!(get_string(&refreshed, "execution_mode"), "Local");
    assert!(!get_bool(&refreshed, "agents_enabled"));
    assert_eq!(get_string(&refreshed, "updated_at"), "2025-07-07T12:01:00Z");
    assert_eq!(get_string(&refreshed, "created_at"), "2025-07-07T12:00:00Z");
}

#[tokio::test(flavor = "multi_thread")]
async fn read_of_deleted_organization_clears_state() {
    let mut t = setup().await;
    let _mock = t
        .server
        .mock("GET", "/api/organizations/gone/")
        .with_status(404)
        .with_body(r#"{"detail":"Not found."}"#)
        .create_async()
        .await;

    let read = t
        .read(TYPE, object(&[("id", s("gone")), ("name", s("test-org"))]))
        .await;

    assert!(read.new_state.is_none());
    assert!(read.diagnostics.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn read_failure_keeps_state() {
    let mut t = setup().await;
    let _mock = t
        .server
        .mock("GET", "/api/organizations/o1/")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let current = object(&[("id", s("o1")), ("name", s("test-org"))]);
    let read = t.read(TYPE, current.clone()).await;

    assert_eq!(read.new_state, Some(current));
    assert_eq!(read.diagnostics.len(), 1);
    assert_eq!(read.diagnostics[0].summary, "Error reading organization");
    assert!(read.diagnostics[0].detail.contains("500"));
    assert!(read.diagnostics[0].detail.contains("internal error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_requires_created_status() {
    let mut t = setup().await;
    let _mock = t
        .server
        .mock("POST", "/api/organizations/")
        .with_status(400)
        .with_body(r#"{"name":["organization with this name already exists."]}"#)
        .create_async()
        .await;

    let created = t.create(TYPE, object(&[("name", s("test-org"))])).await;

    assert!(has_errors(&created.diagnostics));
    assert!(created.diagnostics[0].detail.contains("HTTP 400"));
    assert!(created.diagnostics[0].detail.contains("already exists"));
}

#[tokio::test(flavor = "multi_thread")]
async fn update_without_changes_sends_nothing() {
    let mut t = setup().await;
    let patch = t
        .server
        .mock("PATCH", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let prior = object(&[
        ("id", s(ORG_ID)),
        ("name", s("test-org")),
        ("execution_mode", s("remote")),
        ("agents_enabled", Dynamic::Bool(true)),
        ("created_at", s("2025-07-07T12:00:00Z")),
        ("updated_at", s("2025-07-07T12:00:00Z")),
    ]);
    let updated = t
        .update(TYPE, prior.clone(), object(&[("name", s("test-org"))]))
        .await;

    patch.assert_async().await;
    assert!(updated.diagnostics.is_empty());
    assert_eq!(updated.new_state, prior);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_tolerates_missing_organization() {
    let mut t = setup().await;

    for (id, status) in [("a", 200), ("b", 204), ("c", 404)] {
        let mock = t
            .server
            .mock("DELETE", format!("/api/organizations/{}/", id).as_str())
            .with_status(status)
            .create_async()
            .await;

        let deleted = t.delete(TYPE, object(&[("id", s(id))])).await;
        mock.assert_async().await;
        assert!(deleted.diagnostics.is_empty(), "status {}", status);
    }

    let _failing = t
        .server
        .mock("DELETE", "/api/organizations/d/")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let deleted = t.delete(TYPE, object(&[("id", s("d"))])).await;
    assert!(has_errors(&deleted.diagnostics));
    assert_eq!(deleted.diagnostics[0].summary, "Error deleting organization");
}

#[tokio::test(flavor = "multi_thread")]
async fn import_by_name() {
    let mut t = setup().await;
    let _list = t
        .server
        .mock("GET", "/api/organizations/")
        .with_status(200)
        .with_body(format!(
            "[{}, {}]",
            json!({"id": "other", "name": "other-org", "execution_mode": "local", "agents_enabled": false}),
            organization_body("remote", true, "2025-07-07T12:00:00Z")
        ))
        .create_async()
        .await;

    let response = t
        .provider
        .import_resource(Context::new(), TYPE, "test-org")
        .await
        .unwrap();

    assert!(response.diagnostics.is_empty());
    assert_eq!(response.imported_resources.len(), 1);
    let state = &response.imported_resources[0].state;
    assert_eq!(get_string(state, "id"), ORG_ID);
    assert_eq!(get_string(state, "execution_mode"), "remote");

    let missing = t
        .provider
        .import_resource(Context::new(), TYPE, "nope")
        .await
        .unwrap();
    assert!(missing.imported_resources.is_empty());
    assert_eq!(missing.diagnostics[0].summary, "Organization not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn import_rejects_bad_identifier_without_calling_api() {
    let mut t = setup().await;
    let any = t
        .server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let response = t
        .provider
        .import_resource(Context::new(), TYPE, "test-org:extra")
        .await
        .unwrap();

    assert_eq!(response.diagnostics[0].summary, "Invalid import ID format");
    any.assert_async().await;
}

// Current-thread runtime so the scoped subscriber sees every poll
#[tokio::test]
async fn lifecycle_logs_carry_operation_span() {
    let mut t = setup().await;
    let capture = EventCapture::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

    let _create = t
        .server
        .mock("POST", "/api/organizations/")
        .with_status(201)
        .with_body(organization_body("remote", true, "2025-07-07T12:00:00Z"))
        .create_async()
        .await;
    let created = t.create(TYPE, object(&[("name", s("test-org"))])).await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);

    let events = capture.events();
    let creating = events
        .iter()
        .find(|e| e.message.contains("Creating organization"))
        .expect("create is logged");
    assert!(creating.span.contains("type_name=infradots_organization"), "{:?}", creating);
    assert!(creating.span.contains("operation=create"), "{:?}", creating);
}
