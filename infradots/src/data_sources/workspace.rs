//! Workspace data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    DataSource, DataSourceSchemaRequest, DataSourceSchemaResponse, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tracing::Instrument;

use super::{is_set, lookup_failed, missing_parameter, not_found, Lookup};
use crate::api::{Client, Workspace};
use crate::resources::workspace::{vcs_object, VCS_OBJECT_FIELDS};
use crate::state::{into_state, optional_string, string, timestamp, Fields};
use crate::InfradotsProviderData;

pub const TYPE_NAME: &str = "infradots_workspace_data";

const FILTER_HINT: &str = "Either id or name must be specified together with organization_name";

pub struct WorkspaceDataSource {
    client: Client,
}

impl WorkspaceDataSource {
    pub fn new(data: &InfradotsProviderData) -> Self {
        Self {
            client: data.client.clone(),
        }
    }

    pub fn data_source_schema() -> Schema {
        let computed = |name: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .computed()
                .build()
        };

        SchemaBuilder::new()
            .version(0)
            .description("Looks up an existing workspace by id or name")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_name", AttributeType::String)
                    .description("Organization that owns the workspace")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(computed("description"))
            .attribute(computed("source"))
            .attribute(computed("branch"))
            .attribute(computed("terraform_version"))
            .attribute(
                AttributeBuilder::new("vcs", AttributeType::string_object(VCS_OBJECT_FIELDS))
                    .computed()
                    .build(),
            )
            .attribute(computed("created_at"))
            .attribute(computed("updated_at"))
            .build()
    }

    async fn lookup(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        tracing::debug!("Reading workspace data source");
        let organization =
            optional_string(config, "organization_name")?.ok_or_else(|| missing_parameter(FILTER_HINT))?;
        let lookup = Lookup::from_config(config)?.ok_or_else(|| missing_parameter(FILTER_HINT))?;
        let workspaces = self.client.workspaces(&organization);

        let workspace = match &lookup {
            Lookup::ById(id) => workspaces
                .get(id)
                .await
                .map_err(|e| lookup_failed("workspace", &e))?
                .ok_or_else(|| {
                    not_found(
                        "Workspace",
                        format!(
                            "No workspace with id {:?} in organization {:?}",
                            id, organization
                        ),
                    )
                })?,
            Lookup::ByName(name) => workspaces
                .find_by_name(name)
                .await
                .map_err(|e| lookup_failed("workspace", &e))?
                .ok_or_else(|| {
                    not_found(
                        "Workspace",
                        format!(
                            "No workspace with name {:?} found in organization {:?}",
                            name, organization
                        ),
                    )
                })?,
        };

        Ok(workspace_data(&workspace, &organization))
    }
}

fn workspace_data(workspace: &Workspace, organization: &str) -> DynamicValue {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&workspace.id));
    fields.insert("organization_name".to_string(), string(organization));
    fields.insert("name".to_string(), string(&workspace.name));
    fields.insert("description".to_string(), string(&workspace.description));
    fields.insert("source".to_string(), string(&workspace.source));
    fields.insert("branch".to_string(), string(&workspace.branch));
    fields.insert(
        "terraform_version".to_string(),
        string(&workspace.terraform_version),
    );
    fields.insert("vcs".to_string(), vcs_object(workspace.vcs.as_ref()));
    fields.insert(
        "created_at".to_string(),
        timestamp(workspace.created_at.as_ref()),
    );
    fields.insert(
        "updated_at".to_string(),
        timestamp(workspace.updated_at.as_ref()),
    );
    into_state(fields)
}

#[async_trait]
impl DataSource for WorkspaceDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::data_source_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let config = &request.config;
        let mut diagnostics = Self::data_source_schema().validate_config(config);
        if !is_set(config, "organization_name")
            || (!is_set(config, "id") && !is_set(config, "name"))
        {
            diagnostics.push(missing_parameter(FILTER_HINT));
        }
        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match self
            .lookup(&request.config)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(diag) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![diag],
            },
        }
    }
}
