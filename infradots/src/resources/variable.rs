//! Variable resource implementation
//!
//! A variable belongs to an organization, or to one workspace of that
//! organization when `workspace_name` is set. Values of sensitive variables
//! are never returned by the API, so the last known value is kept in state.

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
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{StringNotEmpty, StringOneOf};
use tracing::Instrument;

use crate::api::variables::{CreateVariableRequest, UpdateVariableRequest};
use crate::api::{Client, Variable, VariableScope};
use crate::state::{
    api_error, carried, changed, immutable, into_state, optional_bool, optional_string,
    required_string, resolve_unknowns, string, timestamp, Fields,
};
use crate::InfradotsProviderData;

pub const TYPE_NAME: &str = "infradots_variable";

pub struct VariableResource {
    client: Client,
}

/// Where a variable lives, as recorded in state
struct Location {
    organization: String,
    workspace: Option<String>,
}

impl Location {
    fn from_state(value: &DynamicValue) -> Result<Self, Diagnostic> {
        Ok(Self {
            organization: required_string(value, "organization_name")?,
            workspace: optional_string(value, "workspace_name")?,
        })
    }

    fn scope(&self) -> VariableScope<'_> {
        VariableScope::new(&self.organization, self.workspace.as_deref())
    }
}

impl VariableResource {
    pub fn new(data: &InfradotsProviderData) -> Self {
        Self {
            client: data.client.clone(),
        }
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an organization or workspace variable")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_name", AttributeType::String)
                    .description("Organization that owns the variable")
                    .required()
                    .validator(StringNotEmpty::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_name", AttributeType::String)
                    .description("Workspace that owns the variable; omit for organization variables")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("key", AttributeType::String)
                    .required()
                    .validator(StringNotEmpty::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("value", AttributeType::String)
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
                AttributeBuilder::new("category", AttributeType::String)
                    .description("Variable category: terraform or env")
                    .optional()
                    .validator(StringOneOf::create(&["terraform", "env"]))
                    .default(StaticDefault::string("terraform"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sensitive", AttributeType::Bool)
                    .description("Write-only variable; the API never returns its value")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("hcl", AttributeType::Bool)
                    .description("Parse the value as HCL")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("Identifier of the owning workspace")
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

    async fn create_variable(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let location = Location::from_state(planned)?;
        let body = CreateVariableRequest {
            key: required_string(planned, "key")?,
            value: required_string(planned, "value")?,
            description: optional_string(planned, "description")?,
            category: optional_string(planned, "category")?,
            sensitive: optional_bool(planned, "sensitive")?.unwrap_or(false),
            hcl: optional_bool(planned, "hcl")?.unwrap_or(false),
        };

        tracing::info!("Creating variable {} in {:?}", body.key, location.scope());
        let variable = self
            .client
            .variables(location.scope())
            .create(&body)
            .await
            .map_err(|e| api_error("Error creating variable", &e))?;

        Ok(variable_state(&variable, &location, planned))
    }

    async fn read_variable(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let location = Location::from_state(current)?;
        let id = required_string(current, "id")?;

        let variable = self
            .client
            .variables(location.scope())
            .get(&id)
            .await
            .map_err(|e| api_error("Error reading variable", &e))?;

        match variable {
            Some(variable) => Ok(Some(variable_state(&variable, &location, current))),
            None => {
                tracing::info!("Variable {} no longer exists, removing from state", id);
                Ok(None)
            }
        }
    }

    async fn update_variable(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let location = Location::from_state(prior)?;
        let target = Location::from_state(planned)?;
        if target.organization != location.organization {
            return Err(immutable("organization_name"));
        }
        if target.workspace != location.workspace {
            return Err(immutable("workspace_name"));
        }
        let id = required_string(prior, "id")?;

        let text = |name: &str| -> Result<Option<String>, Diagnostic> {
            Ok(changed(
                optional_string(planned, name)?,
                optional_string(prior, name)?,
            ))
        };
        let flag = |name: &str| -> Result<Option<bool>, Diagnostic> {
            Ok(changed(
                optional_bool(planned, name)?,
                optional_bool(prior, name)?,
            ))
        };

        let body = UpdateVariableRequest {
            key: text("key")?,
            value: text("value")?,
            description: text("description")?,
            category: text("category")?,
            sensitive: flag("sensitive")?,
            hcl: flag("hcl")?,
        };

        if body.is_empty() {
            tracing::debug!("Variable {} has no changes to apply", id);
            return Ok(resolve_unknowns(planned, prior));
        }

        tracing::info!("Updating variable {} in {:?}", id, location.scope());
        let variable = self
            .client
            .variables(location.scope())
            .update(&id, &body)
            .await
            .map_err(|e| api_error("Error updating variable", &e))?;

        Ok(variable_state(&variable, &location, planned))
    }

    async fn delete_variable(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let location = Location::from_state(prior)?;
        let id = required_string(prior, "id")?;

        tracing::info!("Deleting variable {} in {:?}", id, location.scope());
        self.client
            .variables(location.scope())
            .delete(&id)
            .await
            .map_err(|e| api_error("Error deleting variable", &e))
    }

    async fn import_variable(&self, import_id: &str) -> Result<DynamicValue, Diagnostic> {
        let mut parts = split_import_id(
            import_id,
            &[2, 3],
            "organization_name:key or organization_name:workspace_name:key",
        )?;
        let key = parts.pop().unwrap_or_default();
        let location = Location {
            organization: parts.remove(0),
            workspace: parts.pop(),
        };

        let variable = self
            .client
            .variables(location.scope())
            .find_by_key(&key)
            .await
            .map_err(|e| api_error("Error importing variable", &e))?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Variable not found",
                    format!("No variable with key {:?} exists in {:?}", key, location.scope()),
                )
            })?;

        Ok(variable_state(&variable, &location, &DynamicValue::object()))
    }
}

/// Value to keep in state: the API value unless it was withheld
fn variable_value(variable: &Variable, previous: &DynamicValue) -> Dynamic {
    match &variable.value {
        Some(value) if !(value.is_empty() && variable.sensitive) => string(value),
        _ => carried(previous, "value"),
    }
}

fn variable_state(variable: &Variable, location: &Location, previous: &DynamicValue) -> DynamicValue {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&variable.id));
    fields.insert(
        "organization_name".to_string(),
        string(&location.organization),
    );
    fields.insert(
        "workspace_name".to_string(),
        Dynamic::optional_string(location.workspace.clone()),
    );
    fields.insert("key".to_string(), string(&variable.key));
    fields.insert("value".to_string(), variable_value(variable, previous));
    fields.insert("description".to_string(), string(&variable.description));
    fields.insert("category".to_string(), string(&variable.category));
    fields.insert("sensitive".to_string(), Dynamic::Bool(variable.sensitive));
    fields.insert("hcl".to_string(), Dynamic::Bool(variable.hcl));
    fields.insert(
        "workspace_id".to_string(),
        Dynamic::optional_string(variable.workspace.clone()),
    );
    fields.insert(
        "created_at".to_string(),
        timestamp(variable.created_at.as_ref()),
    );
    fields.insert(
        "updated_at".to_string(),
        timestamp(variable.updated_at.as_ref()),
    );
    into_state(fields)
}

#[async_trait]
impl Resource for VariableResource {
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
            .create_variable(&request.planned_state)
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
            .read_variable(&request.current_state)
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
            .update_variable(&request.prior_state, &request.planned_state)
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
                .delete_variable(&request.prior_state)
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
impl ResourceWithImportState for VariableResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        match self
            .import_variable(&request.id)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(state) => imported(TYPE_NAME, state),
            Err(diag) => import_failed(diag),
        }
    }
}
