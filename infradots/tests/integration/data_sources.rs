use crate::common::{get_string, object, s, setup, TestProvider};
use serde_json::json;
use tfplug::context::Context;
use tfplug::data_source::{
    ReadDataSourceRequest, ReadDataSourceResponse, ValidateDataSourceConfigRequest,
};
use tfplug::types::{AttributePath, DynamicValue};

async fn read(t: &TestProvider, type_name: &str, config: DynamicValue) -> ReadDataSourceResponse {
    t.provider
        .data_source(type_name)
        .unwrap()
        .read(
            Context::for_operation(type_name, "read"),
            ReadDataSourceRequest {
                type_name: type_name.to_string(),
                config,
            },
        )
        .await
}

fn organization_json() -> serde_json::Value {
    json!({
        "id": "org-1",
        "name": "test-org",
        "execution_mode": "remote",
        "agents_enabled": true,
        "created_at": "2025-07-07T12:00:00Z",
        "updated_at": "2025-07-07T12:00:00Z",
        "members": [{"email": "a@example.com"}, {"email": "b@example.com"}],
        "teams": [{"name": "owners"}]
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn organization_by_id_and_by_name() {
    let mut t = setup().await;
    let _get = t
        .server
        .mock("GET", "/api/organizations/org-1/")
        .with_status(200)
        .with_body(organization_json().to_string())
        .create_async()
        .await;
    let _list = t
        .server
        .mock("GET", "/api/organizations/")
        .with_status(200)
        .with_body(json!([organization_json()]).to_string())
        .create_async()
        .await;

    let by_id = read(&t, "infradots_organization_data", object(&[("id", s("org-1"))])).await;
    assert!(by_id.diagnostics.is_empty(), "{:?}", by_id.diagnostics);
    assert_eq!(get_string(&by_id.state, "name"), "test-org");
    assert_eq!(
        by_id
            .state
            .get_string(&AttributePath::new("members").index(1).attribute("email"))
            .unwrap(),
        "b@example.com"
    );
    assert_eq!(
        by_id
            .state
            .get_string(&AttributePath::new("teams").index(0).attribute("name"))
            .unwrap(),
        "owners"
    );

    let by_name = read(
        &t,
        "infradots_organization_data",
        object(&[("name", s("test-org"))]),
    )
    .await;
    assert!(by_name.diagnostics.is_empty());
    assert_eq!(by_name.state, by_id.state);
}

#[tokio::test(flavor = "multi_thread")]
async fn organization_not_found_and_unexpected_status() {
    let mut t = setup().await;
    let _missing = t
        .server
        .mock("GET", "/api/organizations/nope/")
        .with_status(404)
        .create_async()
        .await;
    let _broken = t
        .server
        .mock("GET", "/api/organizations/")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let missing = read(&t, "infradots_organization_data", object(&[("id", s("nope"))])).await;
    assert!(missing.state.is_null());
    assert_eq!(missing.diagnostics[0].summary, "Organization not found");

    let broken = read(
        &t,
        "infradots_organization_data",
        object(&[("name", s("test-org"))]),
    )
    .await;
    assert_eq!(broken.diagnostics[0].summary, "Unexpected HTTP status code");
    assert!(broken.diagnostics[0].detail.contains("502"));
}

#[tokio::test(flavor = "multi_thread")]
async fn lookups_without_filter_are_rejected() {
    let t = setup().await;

    for type_name in [
        "infradots_organization_data",
        "infradots_workspace_data",
        "infradots_vcs_data",
    ] {
        let data_source = t.provider.data_source(type_name).unwrap();
        let validated = data_source
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: type_name.to_string(),
                    config: object(&[("organization_name", s("test-org"))]),
                },
            )
            .await;
        assert!(
            validated
                .diagnostics
                .iter()
                .any(|d| d.summary == "Missing required parameter"),
            "{}",
            type_name
        );

        let response = read(&t, type_name, object(&[("organization_name", s("test-org"))])).await;
        assert_eq!(response.diagnostics[0].summary, "Missing required parameter");
    }

    let response = read(&t, "infradots_workspace_data", object(&[("name", s("prod"))])).await;
    assert_eq!(response.diagnostics[0].summary, "Missing required parameter");
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_by_id_includes_vcs() {
    let mut t = setup().await;
    let _get = t
        .server
        .mock("GET", "/api/organizations/test-org/workspaces/ws-1/")
        .with_status(200)
        .with_body(
            json!({
                "id": "ws-1",
                "name": "prod",
                "description": "production",
                "source": "https://github.com/acme/infra",
                "branch": "main",
                "terraform_version": "1.6.0",
                "vcs": {"id": "vcs-1", "name": "github", "vcsType": "github", "endpoint": "https://github.com"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let response = read(
        &t,
        "infradots_workspace_data",
        object(&[("organization_name", s("test-org")), ("id", s("ws-1"))]),
    )
    .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(get_string(&response.state, "name"), "prod");
    assert_eq!(
        response
            .state
            .get_string(&AttributePath::new("vcs").attribute("url"))
            .unwrap(),
        "https://github.com"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn vcs_by_name_takes_first_match() {
    let mut t = setup().await;
    let _list = t
        .server
        .mock("GET", "/api/organizations/test-org/vcs/")
        .with_status(200)
        .with_body(
            json!([
                {"id": "vcs-1", "name": "github", "vcsType": "github", "endpoint": "https://github.com", "clientId": "first"},
                {"id": "vcs-2", "name": "github", "vcsType": "github", "endpoint": "https://github.com", "clientId": "second"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let response = read(
        &t,
        "infradots_vcs_data",
        object(&[("organization_name", s("test-org")), ("name", s("github"))]),
    )
    .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(get_string(&response.state, "id"), "vcs-1");
    assert_eq!(get_string(&response.state, "client_id"), "first");
    assert!(response
        .state
        .get(&AttributePath::new("client_secret"))
        .is_err());
}
