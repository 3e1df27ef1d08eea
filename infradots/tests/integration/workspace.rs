use crate::common::{get_string, is_null, object, s, setup};
use mockito::Matcher;
use serde_json::json;
use tfplug::context::Context;
use tfplug::types::{has_errors, AttributePath};

const TYPE: &str = "infradots_workspace";
const COLLECTION: &str = "/api/organizations/test-org/workspaces/";
const ITEM: &str = "/api/organizations/test-org/workspaces/ws-1/";

fn workspace_body(description: &str) -> String {
    json!({
        "id": "ws-1",
        "name": "test-workspace",
        "description": description,
        "source": "https://github.com/acme/infra",
        "branch": "main",
        "terraform_version": "1.6.0",
        "created_at": "2025-07-07T12:00:00Z",
        "updated_at": "2025-07-07T12:00:00Z",
        "vcs": {
            "id": "vcs-1",
            "name": "github",
            "vcsType": "github",
            "endpoint": "https://github.com",
            "clientId": "cid",
            "description": "",
            "created_at": "2025-07-01T08:00:00Z",
            "updated_at": "2025-07-01T08:00:00Z"
        }
    })
    .to_string()
}

fn workspace_config(description: &str) -> tfplug::types::DynamicValue {
    object(&[
        ("organization_name", s("test-org")),
        ("name", s("test-workspace")),
        ("description", s(description)),
        ("source", s("https://github.com/acme/infra")),
        ("branch", s("main")),
        ("terraform_version", s("1.6.0")),
        ("vcs_id", s("vcs-1")),
    ])
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_create_read_update() {
    let mut t = setup().await;

    let create = t
        .server
        .mock("POST", COLLECTION)
        .match_body(Matcher::Json(json!({
            "name": "test-workspace",
            "description": "networking",
            "source": "https://github.com/acme/infra",
            "branch": "main",
            "terraform_version": "1.6.0",
            "vcs_id": "vcs-1"
        })))
        .with_status(201)
        .with_body(workspace_body("networking"))
        .create_async()
        .await;

    let created = t.create(TYPE, workspace_config("networking")).await;
    create.assert_async().await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);

    let state = created.new_state;
    assert_eq!(get_string(&state, "id"), "ws-1");
    assert_eq!(get_string(&state, "vcs_id"), "vcs-1");
    assert_eq!(
        state
            .get_string(&AttributePath::new("vcs").attribute("vcs_type"))
            .unwrap(),
        "github"
    );
    assert_eq!(
        state
            .get_string(&AttributePath::new("vcs").attribute("created_at"))
            .unwrap(),
        "2025-07-01T08:00:00Z"
    );

    let read_mock = t
        .server
        .mock("GET", ITEM)
        .with_status(200)
        .with_body(workspace_body("networking"))
        .create_async()
        .await;
    let read = t.read(TYPE, state.clone()).await;
    assert_eq!(read.new_state.as_ref(), Some(&state));
    drop(read_mock);

    let update = t
        .server
        .mock("PATCH", ITEM)
        .match_body(Matcher::Json(json!({"description": "core networking"})))
        .with_status(200)
        .with_body(workspace_body("core networking"))
        .create_async()
        .await;

    let updated = t
        .update(TYPE, state, workspace_config("core networking"))
        .await;
    update.assert_async().await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);
    assert_eq!(
        get_string(&updated.new_state, "description"),
        "core networking"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_without_vcs_has_null_object() {
    let mut t = setup().await;
    let _mock = t
        .server
        .mock("GET", ITEM)
        .with_status(200)
        .with_body(
            json!({
                "id": "ws-1",
                "name": "test-workspace",
                "description": "",
                "source": "s",
                "branch": "main",
                "terraform_version": "1.6.0",
                "vcs": null
            })
            .to_string(),
        )
        .create_async()
        .await;

    let current = object(&[
        ("id", s("ws-1")),
        ("organization_name", s("test-org")),
        ("name", s("test-workspace")),
    ]);
    let state = t.read(TYPE, current).await.new_state.unwrap();

    assert!(is_null(&state, "vcs"));
    assert!(is_null(&state, "vcs_id"));
    assert!(is_null(&state, "description"));
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_import_matches_data_source_lookup() {
    let mut t = setup().await;
    let _list = t
        .server
        .mock("GET", COLLECTION)
        .with_status(200)
        .with_body(format!(
            "[{}, {}]",
            json!({"id": "ws-0", "name": "staging", "vcs": null}),
            workspace_body("networking")
        ))
        .expect(2)
        .create_async()
        .await;

    let imported = t
        .provider
        .import_resource(Context::new(), TYPE, "test-org:test-workspace")
        .await
        .unwrap();
    assert!(imported.diagnostics.is_empty(), "{:?}", imported.diagnostics);
    let state = &imported.imported_resources[0].state;
    assert_eq!(get_string(state, "organization_name"), "test-org");
    assert!(is_null(state, "vcs_id"));

    let data_source = t.provider.data_source("infradots_workspace_data").unwrap();
    let looked_up = data_source
        .read(
            Context::new(),
            tfplug::data_source::ReadDataSourceRequest {
                type_name: "infradots_workspace_data".to_string(),
                config: object(&[
                    ("organization_name", s("test-org")),
                    ("name", s("test-workspace")),
                ]),
            },
        )
        .await;
    assert!(looked_up.diagnostics.is_empty());
    assert_eq!(get_string(&looked_up.state, "id"), get_string(state, "id"));
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_import_rejects_bad_identifiers() {
    let mut t = setup().await;
    let any = t
        .server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    for id in ["test-org", "a:b:c:d", "test-org:"] {
        let response = t
            .provider
            .import_resource(Context::new(), TYPE, id)
            .await
            .unwrap();
        assert!(has_errors(&response.diagnostics), "{}", id);
        assert_eq!(response.diagnostics[0].summary, "Invalid import ID format");
    }

    any.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_cannot_move_between_organizations() {
    let mut t = setup().await;
    let patch = t
        .server
        .mock("PATCH", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let prior = object(&[
        ("id", s("ws-1")),
        ("organization_name", s("test-org")),
        ("name", s("test-workspace")),
        ("source", s("https://github.com/acme/infra")),
        ("branch", s("main")),
        ("terraform_version", s("1.6.0")),
    ]);
    let mut config = workspace_config("networking");
    config
        .set_string(&AttributePath::new("organization_name"), "other-org".to_string())
        .unwrap();

    let updated = t.update(TYPE, prior, config).await;
    patch.assert_async().await;
    assert_eq!(updated.diagnostics[0].summary, "Attribute cannot be changed");
}
