//! VCS connection data source implementation

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
use crate::api::{Client, VcsConnection};
use crate::state::{into_state, optional_string, string, timestamp, Fields};
use crate::InfradotsProviderData;

pub const TYPE_NAME: &str = "infradots_vcs_data";

const FILTER_HINT: &str = "Either id or name must be specified together with organization_name";

pub struct VcsDataSource {
    client: Client,
}

impl VcsDataSource {
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
            .description("Looks up an existing VCS connection by id or name")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_name", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(computed("vcs_type"))
            .attribute(computed("url"))
            .attribute(computed("client_id"))
            .attribute(computed("description"))
            .attribute(computed("created_at"))
            .attribute(computed("updated_at"))
            .build()
    }

    async fn lookup(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        tracing::debug!("Reading VCS connection data source");
        let organization =
            optional_string(config, "organization_name")?.ok_or_else(|| missing_parameter(FILTER_HINT))?;
        let lookup = Lookup::from_config(config)?.ok_or_else(|| missing_parameter(FILTER_HINT))?;
        let connections = self.client.vcs(&organization);

        let vcs = match &lookup {
            Lookup::ById(id) => connections
                .get(id)
                .await
                .map_err(|e| lookup_failed("VCS connection", &e))?
                .ok_or_else(|| {
                    not_found(
                        "VCS connection",
                        format!(
                            "No VCS connection with id {:?} in organization {:?}",
                            id, organization
                        ),
                    )
                })?,
            Lookup::ByName(name) => connections
                .find_by_name(name)
                .await
                .map_err(|e| lookup_failed("VCS connection", &e))?
                .ok_or_else(|| {
                    not_found(
                        "VCS connection",
                        format!(
                            "No VCS connection with name {:?} found in organization {:?}",
                            name, organization
                        ),
                    )
                })?,
        };

        Ok(vcs_data(&vcs, &organization))
    }
}

// No client_secret here: data sources never expose it
fn vcs_data(vcs: &VcsConnection, organization: &str) -> DynamicValue {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), string(&vcs.id));
    fields.insert("organization_name".to_string(), string(organization));
    fields.insert("name".to_string(), string(&vcs.name));
    fields.insert("vcs_type".to_string(), string(&vcs.vcs_type));
    fields.insert("url".to_string(), string(&vcs.url));
    fields.insert("client_id".to_string(), string(&vcs.client_id));
    fields.insert("description".to_string(), string(&vcs.description));
    fields.insert("created_at".to_string(), timestamp(vcs.created_at.as_ref()));
    fields.insert("updated_at".to_string(), timestamp(vcs.updated_at.as_ref()));
    into_state(fields)
}

#[async_trait]
impl DataSource for VcsDataSource {
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
