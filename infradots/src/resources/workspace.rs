//! Workspace resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::{import_failed, imported, split_import_id};
use tfplug::resource::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringNotEmpty;
use tracing::Instrument;

use crate::api::workspaces::{CreateWorkspaceRequest, UpdateWorkspaceRequest, Workspace};
use crate::api::{Client, VcsConnection};
use crate::state::{
    api_error, carried, changed, changed_or_cleared, immutable, into_state, optional_string,
    optional_text, required_string, resolve_unknowns, string, timestamp, Fields,
};
use crate::InfradotsProviderData;

pub const TYPE_NAME: &str = "infradots_workspace";

/// Fields of the nested, read-only `vcs` object
pub(crate) const VCS_OBJECT_FIELDS: &[&str] = &[
    "id",
    "name",
    "vcs_type",
    "url",
    "description",
    "created_at",
    "updated_at",
];

pub struct WorkspaceResource {
    client: Client,
}

impl WorkspaceResource {
    pub fn new(data: &InfradotsProviderData) -> Self {
        Self {
            client: data.client.clone(),
        }
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a workspace within an infradots organization")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Server-assigned workspace identifier")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_name", AttributeType::String)
                    .description("Organization that owns the workspace")
                    .required()
                    .validator(StringNotEmpty::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Workspace name, unique within the organization")
                    .required()
                    .validator(StringNotEmpty::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("source", AttributeType::String)
                    .description("Repository the workspace runs from")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("branch", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("terraform_version", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vcs_id", AttributeType::String)
                    .description("VCS connection used to fetch the source")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vcs", AttributeType::string_object(VCS_OBJECT_FIELDS))
                    .description("VCS connection attached to the workspace")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_at", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build()
    }

    async fn create_workspace(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let organization = required_string(planned, "organization_name")?;
        let body = CreateWorkspaceRequest {
            name: required_string(planned, "name")?,
            description: optional_string(planned, "description")?,
            source: required_string(planned, "source")?,
            branch: required_string(planned, "branch")?,
            terraform_version: required_string(planned, "terraform_version")?,
            vcs_id: optional_string(planned, "vcs_id")?,
        };

        tracing::info!("Creating workspace {} in {}", body.name, organization);
        let workspace = self
            .client
            .workspaces(&organization)
            .create(&body)
            .await
            .map_err(|e| api_error("Error creating workspace", &e))?;

        Ok(workspace_state(&workspace, &organization, planned))
    }

    async fn read_workspace(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let organization = required_string(current, "organization_name")?;
        let id = required_string(current, "id")?;

        let workspace = self
            .client
            .workspaces(&organization)
            .get(&id)
            .await
            .map_err(|e| api_error("Error reading workspace", &e))?;

        match workspace {
            Some(workspace) => Ok(Some(workspace_state(&workspace, &organization, current))),
            None => {
                tracing::info!("Workspace {} no longer exists, removing from state", id);
                Ok(None)
            }
        }
    }

    async fn update_workspace(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let organization = required_string(prior, "organization_name")?;
        if changed(
            optional_string(planned, "organization_name")?,
            Some(organization.clone()),
        )
        .is_some()
        {
            return Err(immutable("organization_name"));
        }
        let id = required_string(prior, "id")?;

        let field = |name: &str| -> Result<Option<String>, Diagnostic> {
            Ok(changed(
                optional_string(planned, name)?,
                optional_string(prior, name)?,
            ))
        };

        let vcs_id = match (
            optional_string(planned, "vcs_id")?,
            optional_string(prior, "vcs_id")?,
        ) {
            (None, Some(_)) => Some(None),
            (planned, prior) => changed(planned, prior).map(Some),
        };

        let body = UpdateWorkspaceRequest {
            name: field("name")?,
            description: changed_or_cleared(
                optional_string(planned, "description")?,
                optional_string(prior, "description")?,
            ),
            source: field("source")?,
            branch: field("branch")?,
            terraform_version: field("terraform_version")?,
            vcs_id,
        };

        if body.is_empty() {
            tracing::debug!("Workspace {} has no changes to apply", id);
            return Ok(resolve_unknowns(planned, prior));
        }

        tracing::info!("Updating workspace {} in {}", id, organization);
        let workspace = self
            .client
            .workspaces(&organization)
            .update(&id, &body)
            .await
            .map_err(|e| api_error("Error updating workspace", &e))?;

        Ok(workspace_state(&workspace, &organization, planned))
    }

    async fn delete_workspace(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let organization = required_string(prior, "organization_name")?;
        let id = required_string(prior, "id")?;

        tracing::info!("Deleting workspace {} in {}", id, organization);
        self.client
            .workspaces(&organization)
            .delete(&id)
            .await
            .map_err(|e| api_error("Error deleting workspace", &e))
    }

    async fn import_workspace(&self, import_id: &str) -> Result<DynamicValue, Diagnostic> {
        let parts = split_import_id(import_id, &[2], "organization_name:workspace_name")?;
        let (organization, name) = (&parts[0], &parts[1]);

        let workspace = self
            .client
            .workspaces(organization)
            .find_by_name(name)
            .await
            .map_err(|e| api_error("Error importing workspace", &e))?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Workspace not found",
                    format!(
                        "No workspace named {:?} exists in organization {:?}",
                        name, organization
                    ),
                )
            })?;

        Ok(workspace_state(
            &workspace,
            organization,
            &DynamicValue::object(),
        ))
    }
}

/// Nested `vcs` object as stored in state, null when no connection is attached
pub(crate) fn vcs_object(vcs: Option<&VcsConnection>) -> Dynamic {
    let Some(vcs) = vcs else {
        return Dynamic::Null;
    };

    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&vcs.id));
    fields.insert("name".to_string(), string(&vcs.name));
    fields.insert("vcs_type".to_string(), string(&vcs.vcs_type));
    fields.insert("url".to_string(), string(&vcs.url));
    fields.insert("description".to_string(), string(&vcs.description));
    fields.insert("created_at".to_string(), timestamp(vcs.created_at.as_ref()));
    fields.insert("updated_at".to_string(), timestamp(vcs.updated_at.as_ref()));
    Dynamic::Map(fields)
}

/// Builds state from an API record. `vcs_id` is write-side only and always
/// comes from `previous` (plan or prior state).
fn workspace_state(workspace: &Workspace, organization: &str, previous: &DynamicValue) -> DynamicValue {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&workspace.id));
    fields.insert("organization_name".to_string(), string(organization));
    fields.insert("name".to_string(), string(&workspace.name));
    fields.insert(
        "description".to_string(),
        optional_text(&workspace.description, Some(previous), "description"),
    );
    fields.insert("source".to_string(), string(&workspace.source));
    fields.insert("branch".to_string(), string(&workspace.branch));
    fields.insert(
        "terraform_version".to_string(),
        string(&workspace.terraform_version),
    );
    fields.insert("vcs_id".to_string(), carried(previous, "vcs_id"));
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
impl Resource for WorkspaceResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::resource_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: Self::resource_schema().validate_config(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        match self
            .create_workspace(&request.planned_state)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![diag],
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        match self
            .read_workspace(&request.current_state)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![diag],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self
            .update_workspace(&request.prior_state, &request.planned_state)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![diag],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse {
            diagnostics: self
                .delete_workspace(&request.prior_state)
                .instrument(ctx.span().clone())
                .await
                .err()
                .into_iter()
                .collect(),
        }
    }

    fn importer(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for WorkspaceResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        match self
            .import_workspace(&request.id)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(state) => imported(TYPE_NAME, state),
            Err(diag) => import_failed(diag),
        }
    }
}
