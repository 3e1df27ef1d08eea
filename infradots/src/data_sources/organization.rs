//! Organization data source implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::{
    DataSource, DataSourceSchemaRequest, DataSourceSchemaResponse, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tracing::Instrument;

use super::{is_set, lookup_failed, missing_parameter, not_found, Lookup};
use crate::api::{Client, Organization};
use crate::state::{into_state, string, timestamp, Fields};
use crate::InfradotsProviderData;

pub const TYPE_NAME: &str = "infradots_organization_data";

const FILTER_HINT: &str = "Either id or name must be specified";

pub struct OrganizationDataSource {
    client: Client,
}

impl OrganizationDataSource {
    pub fn new(data: &InfradotsProviderData) -> Self {
        Self {
            client: data.client.clone(),
        }
    }

    pub fn data_source_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Looks up an existing organization by id or name")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("execution_mode", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("agents_enabled", AttributeType::Bool)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "members",
                    AttributeType::List(Box::new(AttributeType::string_object(&["email"]))),
                )
                .description("Organization members")
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "teams",
                    AttributeType::List(Box::new(AttributeType::string_object(&["name"]))),
                )
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

    async fn lookup(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        tracing::debug!("Reading organization data source");
        let lookup = Lookup::from_config(config)?.ok_or_else(|| missing_parameter(FILTER_HINT))?;
        let organizations = self.client.organizations();

        let organization = match &lookup {
            Lookup::ById(id) => organizations
                .get(id)
                .await
                .map_err(|e| lookup_failed("organization", &e))?
                .ok_or_else(|| {
                    not_found("Organization", format!("No organization with id {:?}", id))
                })?,
            Lookup::ByName(name) => organizations
                .find_by_name(name)
                .await
                .map_err(|e| lookup_failed("organization", &e))?
                .ok_or_else(|| {
                    not_found("Organization", format!("No organization named {:?}", name))
                })?,
        };

        Ok(organization_data(&organization))
    }
}

fn organization_data(organization: &Organization) -> DynamicValue {
    let single = |key: &str, value: &str| {
        Dynamic::Map(HashMap::from([(key.to_string(), string(value))]))
    };

    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&organization.id));
    fields.insert("name".to_string(), string(&organization.name));
    fields.insert(
        "execution_mode".to_string(),
        string(&organization.execution_mode),
    );
    fields.insert(
        "agents_enabled".to_string(),
        Dynamic::Bool(organization.agents_enabled),
    );
    fields.insert(
        "members".to_string(),
        Dynamic::List(
            organization
                .members
                .iter()
                .map(|m| single("email", &m.email))
                .collect(),
        ),
    );
    fields.insert(
        "teams".to_string(),
        Dynamic::List(
            organization
                .teams
                .iter()
                .map(|t| single("name", &t.name))
                .collect(),
        ),
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

#[async_trait]
impl DataSource for OrganizationDataSource {
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
        let mut diagnostics = Self::data_source_schema().validate_config(&request.config);
        if !is_set(&request.config, "id") && !is_set(&request.config, "name") {
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
