use crate::common::{get_string, is_null, object, s, setup};
use mockito::Matcher;
use serde_json::json;
use tfplug::context::Context;
use tfplug::types::DynamicValue;

const TYPE: &str = "infradots_vcs";
const COLLECTION: &str = "/api/organizations/test-org/vcs/";
const ITEM: &str = "/api/organizations/test-org/vcs/vcs-1/";

fn vcs_body(client_id: &str) -> String {
    json!({
        "id": "vcs-1",
        "name": "github",
        "vcsType": "github",
        "endpoint": "https://github.com",
        "clientId": client_id,
        "description": "",
        "created_at": "2025-07-01T08:00:00Z",
        "updated_at": "2025-07-01T08:00:00Z"
    })
    .to_string()
}

fn vcs_config(client_id: &str, client_secret: &str) -> DynamicValue {
    object(&[
        ("organization_name", s("test-org")),
        ("name", s("github")),
        ("vcs_type", s("github")),
        ("url", s("https://github.com")),
        ("client_id", s(client_id)),
        ("client_secret", s(client_secret)),
    ])
}

#[tokio::test(flavor = "multi_thread")]
async fn vcs_lifecycle_keeps_client_secret() {
    let mut t = setup().await;

    let create = t
        .server
        .mock("POST", COLLECTION)
        .match_body(Matcher::Json(json!({
            "name": "github",
            "vcsType": "github",
            "endpoint": "https://github.com",
            "clientId": "cid",
            "clientSecret": "s3cret",
            "description": ""
        })))
        .with_status(201)
        .with_body(vcs_body("cid"))
        .create_async()
        .await;

    let created = t.create(TYPE, vcs_config("cid", "s3cret")).await;
    create.assert_async().await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    assert_eq!(get_string(&created.new_state, "client_secret"), "s3cret");
    assert_eq!(get_string(&created.new_state, "url"), "https://github.com");

    let read_mock = t
        .server
        .mock("GET", ITEM)
        .with_status(200)
        .with_body(vcs_body("cid"))
        .create_async()
        .await;
    let read = t.read(TYPE, created.new_state.clone()).await;
    assert_eq!(read.new_state.as_ref(), Some(&created.new_state));
    drop(read_mock);

    let update = t
        .server
        .mock("PATCH", ITEM)
        .match_body(Matcher::Json(json!({
            "clientId": "cid-2",
            "clientSecret": "rotated"
        })))
        .with_status(200)
        .with_body(vcs_body("cid-2"))
        .create_async()
        .await;

    let updated = t
        .update(TYPE, created.new_state, vcs_config("cid-2", "rotated"))
        .await;
    update.assert_async().await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);
    assert_eq!(get_string(&updated.new_state, "client_id"), "cid-2");
    assert_eq!(get_string(&updated.new_state, "client_secret"), "rotated");
}

#[tokio::test(flavor = "multi_thread")]
async fn vcs_import_leaves_secret_unset() {
    let mut t = setup().await;
    let _list = t
        .server
        .mock("GET", COLLECTION)
        .with_status(200)
        .with_body(format!("[{}]", vcs_body("cid")))
        .create_async()
        .await;

    let response = t
        .provider
        .import_resource(Context::new(), TYPE, "test-org:github")
        .await
        .unwrap();
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = &response.imported_resources[0].state;
    assert_eq!(get_string(state, "id"), "vcs-1");
    assert_eq!(get_string(state, "organization_name"), "test-org");
    assert!(is_null(state, "client_secret"));

    let missing = t
        .provider
        .import_resource(Context::new(), TYPE, "test-org:gitlab")
        .await
        .unwrap();
    assert_eq!(missing.diagnostics[0].summary, "VCS connection not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn vcs_read_of_deleted_connection_clears_state() {
    let mut t = setup().await;
    let _mock = t
        .server
        .mock("GET", ITEM)
        .with_status(404)
        .create_async()
        .await;

    let read = t
        .read(
            TYPE,
            object(&[("id", s("vcs-1")), ("organization_name", s("test-org"))]),
        )
        .await;
    assert!(read.new_state.is_none());
    assert!(read.diagnostics.is_empty());
}
