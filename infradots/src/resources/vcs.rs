//! VCS connection resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import::{import_failed, imported, split_import_id};
use tfplug::resource::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::StringNotEmpty;
use tracing::Instrument;

use crate::api::vcs::{CreateVcsRequest, UpdateVcsRequest};
use crate::api::{Client, VcsConnection};
use crate::state::{
    api_error, carried, changed, immutable, into_state, optional_string, required_string,
    resolve_unknowns, string, timestamp, Fields,
};
use crate::InfradotsProviderData;

pub const TYPE_NAME: &str = "infradots_vcs";

pub struct VcsResource {
    client: Client,
}

impl VcsResource {
    pub fn new(data: &InfradotsProviderData) -> Self {
        Self {
            client: data.client.clone(),
        }
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a VCS connection of an infradots organization")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_name", AttributeType::String)
                    .required()
                    .validator(StringNotEmpty::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(StringNotEmpty::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vcs_type", AttributeType::String)
                    .description("Provider kind, e.g. github or gitlab")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("Base URL of the VCS provider")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_id", AttributeType::String)
                    .description("OAuth client ID")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_secret", AttributeType::String)
                    .description("OAuth client secret")
                    .required()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .optional()
                    .default(StaticDefault::string(""))
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

    async fn create_vcs(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let organization = required_string(planned, "organization_name")?;
        let body = CreateVcsRequest {
            name: required_string(planned, "name")?,
            vcs_type: required_string(planned, "vcs_type")?,
            url: required_string(planned, "url")?,
            client_id: required_string(planned, "client_id")?,
            client_secret: required_string(planned, "client_secret")?,
            description: optional_string(planned, "description")?,
        };

        tracing::info!("Creating VCS connection {} in {}", body.name, organization);
        let vcs = self
            .client
            .vcs(&organization)
            .create(&body)
            .await
            .map_err(|e| api_error("Error creating VCS connection", &e))?;

        Ok(vcs_state(&vcs, &organization, planned))
    }

    async fn read_vcs(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let organization = required_string(current, "organization_name")?;
        let id = required_string(current, "id")?;

        let vcs = self
            .client
            .vcs(&organization)
            .get(&id)
            .await
            .map_err(|e| api_error("Error reading VCS connection", &e))?;

        match vcs {
            Some(vcs) => Ok(Some(vcs_state(&vcs, &organization, current))),
            None => {
                tracing::info!("VCS connection {} no longer exists, removing from state", id);
                Ok(None)
            }
        }
    }

    async fn update_vcs(
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

        let body = UpdateVcsRequest {
            name: field("name")?,
            vcs_type: field("vcs_type")?,
            url: field("url")?,
            client_id: field("client_id")?,
            client_secret: field("client_secret")?,
            description: field("description")?,
        };

        if body.is_empty() {
            tracing::debug!("VCS connection {} has no changes to apply", id);
            return Ok(resolve_unknowns(planned, prior));
        }

        tracing::info!("Updating VCS connection {} in {}", id, organization);
        let vcs = self
            .client
            .vcs(&organization)
            .update(&id, &body)
            .await
            .map_err(|e| api_error("Error updating VCS connection", &e))?;

        Ok(vcs_state(&vcs, &organization, planned))
    }

    async fn delete_vcs(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let organization = required_string(prior, "organization_name")?;
        let id = required_string(prior, "id")?;

        tracing::info!("Deleting VCS connection {} in {}", id, organization);
        self.client
            .vcs(&organization)
            .delete(&id)
            .await
            .map_err(|e| api_error("Error deleting VCS connection", &e))
    }

    async fn import_vcs(&self, import_id: &str) -> Result<DynamicValue, Diagnostic> {
        let parts = split_import_id(import_id, &[2], "organization_name:vcs_name")?;
        let (organization, name) = (&parts[0], &parts[1]);

        let vcs = self
            .client
            .vcs(organization)
            .find_by_name(name)
            .await
            .map_err(|e| api_error("Error importing VCS connection", &e))?
            .ok_or_else(|| {
                Diagnostic::error(
                    "VCS connection not found",
                    format!(
                        "No VCS connection named {:?} exists in organization {:?}",
                        name, organization
                    ),
                )
            })?;

        Ok(vcs_state(&vcs, organization, &DynamicValue::object()))
    }
}

/// The client secret is write-only: it always comes from `previous`
fn vcs_state(vcs: &VcsConnection, organization: &str, previous: &DynamicValue) -> DynamicValue {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&vcs.id));
    fields.insert("organization_name".to_string(), string(organization));
    fields.insert("name".to_string(), string(&vcs.name));
    fields.insert("vcs_type".to_string(), string(&vcs.vcs_type));
    fields.insert("url".to_string(), string(&vcs.url));
    fields.insert("client_id".to_string(), string(&vcs.client_id));
    fields.insert(
        "client_secret".to_string(),
        carried(previous, "client_secret"),
    );
    fields.insert("description".to_string(), string(&vcs.description));
    fields.insert("created_at".to_string(), timestamp(vcs.created_at.as_ref()));
    fields.insert("updated_at".to_string(), timestamp(vcs.updated_at.as_ref()));
    into_state(fields)
}

#[async_trait]
impl Resource for VcsResource {
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
            .create_vcs(&request.planned_state)
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
            .read_vcs(&request.current_state)
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
            .update_vcs(&request.prior_state, &request.planned_state)
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
                .delete_vcs(&request.prior_state)
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
impl ResourceWithImportState for VcsResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        match self
            .import_vcs(&request.id)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(state) => imported(TYPE_NAME, state),
            Err(diag) => import_failed(diag),
        }
    }
}
