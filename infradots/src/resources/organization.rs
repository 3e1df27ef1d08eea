//! Organization resource implementation

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
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{StringNotEmpty, StringOneOf};
use tracing::Instrument;

use crate::api::organizations::{
    CreateOrganizationRequest, Organization, UpdateOrganizationRequest,
};
use crate::api::Client;
use crate::state::{
    api_error, changed, into_state, optional_bool, optional_string, required_string,
    resolve_unknowns, string, timestamp, Fields,
};
use crate::InfradotsProviderData;

pub const TYPE_NAME: &str = "infradots_organization";

pub struct OrganizationResource {
    client: Client,
}

impl OrganizationResource {
    pub fn new(data: &InfradotsProviderData) -> Self {
        Self {
            client: data.client.clone(),
        }
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an infradots organization")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Server-assigned organization identifier")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Organization name")
                    .required()
                    .validator(StringNotEmpty::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("execution_mode", AttributeType::String)
                    .description("Where runs execute: local or remote")
                    .optional()
                    .validator(StringOneOf::create_ignore_case(&["local", "remote"]))
                    .default(StaticDefault::string("remote"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("agents_enabled", AttributeType::Bool)
                    .description("Whether self-hosted agents may run workloads")
                    .optional()
                    .default(StaticDefault::bool(true))
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

    async fn create_organization(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let body = CreateOrganizationRequest {
            name: required_string(planned, "name")?,
            execution_mode: optional_string(planned, "execution_mode")?,
            agents_enabled: optional_bool(planned, "agents_enabled")?,
        };

        tracing::info!("Creating organization {}", body.name);
        let organization = self
            .client
            .organizations()
            .create(&body)
            .await
            .map_err(|e| api_error("Error creating organization", &e))?;

        Ok(organization_state(&organization, Some(planned)))
    }

    async fn read_organization(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let id = required_string(current, "id")?;

        let organization = self
            .client
            .organizations()
            .get(&id)
            .await
            .map_err(|e| api_error("Error reading organization", &e))?;

        match organization {
            Some(organization) => Ok(Some(organization_state(&organization, Some(current)))),
            None => {
                tracing::info!("Organization {} no longer exists, removing from state", id);
                Ok(None)
            }
        }
    }

    async fn update_organization(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let id = required_string(prior, "id")?;

        let body = UpdateOrganizationRequest {
            name: changed(
                optional_string(planned, "name")?,
                optional_string(prior, "name")?,
            ),
            execution_mode: changed(
                optional_string(planned, "execution_mode")?,
                optional_string(prior, "execution_mode")?,
            ),
            agents_enabled: changed(
                optional_bool(planned, "agents_enabled")?,
                optional_bool(prior, "agents_enabled")?,
            ),
        };

        if body.is_empty() {
            tracing::debug!("Organization {} has no changes to apply", id);
            return Ok(resolve_unknowns(planned, prior));
        }

        tracing::info!("Updating organization {}", id);
        let organization = self
            .client
            .organizations()
            .update(&id, &body)
            .await
            .map_err(|e| api_error("Error updating organization", &e))?;

        Ok(organization_state(&organization, Some(planned)))
    }

    async fn delete_organization(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let id = required_string(prior, "id")?;

        tracing::info!("Deleting organization {}", id);
        self.client
            .organizations()
            .delete(&id)
            .await
            .map_err(|e| api_error("Error deleting organization", &e))
    }

    async fn import_organization(&self, import_id: &str) -> Result<DynamicValue, Diagnostic> {
        let parts = split_import_id(import_id, &[1], "organization_name")?;
        let name = &parts[0];

        let organization = self
            .client
            .organizations()
            .find_by_name(name)
            .await
            .map_err(|e| api_error("Error importing organization", &e))?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Organization not found",
                    format!("No organization named {:?} exists", name),
                )
            })?;

        Ok(organization_state(&organization, None))
    }
}

/// `known` is the plan or prior state the record answers. Its
/// `execution_mode` spelling is kept when it matches the API value ignoring
/// case, so a configured "Local" does not diff against "local".
fn organization_state(organization: &Organization, known: Option<&DynamicValue>) -> DynamicValue {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&organization.id));
    fields.insert("name".to_string(), string(&organization.name));
    fields.insert(
        "execution_mode".to_string(),
        string(&execution_mode(&organization.execution_mode, known)),
    );
    fields.insert(
        "agents_enabled".to_string(),
        Dynamic::Bool(organization.agents_enabled),
    );
    fields.insert(
        "created_at".to_string(),
        timestamp(organization.created_at.as_ref()),
    );
    fields.insert(
        "updated_at".to_string(),
        timestamp(organization.updated_at.as_ref()),
    );
    into_state(fields)
}

fn execution_mode(api_value: &str, known: Option<&DynamicValue>) -> String {
    known
        .and_then(|value| {
            value
                .get_optional_string(&AttributePath::new("execution_mode"))
                .ok()
                .flatten()
        })
        .filter(|configured| configured.eq_ignore_ascii_case(api_value))
        .unwrap_or_else(|| api_value.to_string())
}

#[async_trait]
impl Resource for OrganizationResource {
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
            .create_organization(&request.planned_state)
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
            .read_organization(&request.current_state)
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
            .update_organization(&request.prior_state, &request.planned_state)
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
                .delete_organization(&request.prior_state)
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
impl ResourceWithImportState for OrganizationResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        match self
            .import_organization(&request.id)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(state) => imported(TYPE_NAME, state),
            Err(diag) => import_failed(diag),
        }
    }
}
