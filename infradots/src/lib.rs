pub mod api;
pub mod data_sources;
pub mod provider_data;
pub mod resources;
mod state;

pub use provider_data::InfradotsProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::DataSource;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::Resource;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use crate::api::{Client, ClientConfig, DEFAULT_HOSTNAME};
use crate::state::{optional_bool, optional_string};

pub const PROVIDER_NAME: &str = "infradots";

const HOSTNAME_ENV: &str = "INFRADOTS_HOSTNAME";
const TOKEN_ENV: &str = "INFRADOTS_TOKEN";
const INSECURE_ENV: &str = "INFRADOTS_TLS_INSECURE_SKIP_VERIFY";

#[derive(Default)]
pub struct InfradotsProvider;

impl InfradotsProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provider_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Interact with the infradots platform")
            .attribute(
                AttributeBuilder::new("hostname", AttributeType::String)
                    .description(
                        "API hostname, with or without scheme. Defaults to api.infradots.com \
                         or the INFRADOTS_HOSTNAME environment variable",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("token", AttributeType::String)
                    .description("API token. Can also be set with INFRADOTS_TOKEN")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tls_insecure_skip_verify", AttributeType::Bool)
                    .description(
                        "Skip TLS certificate verification. Can also be set with \
                         INFRADOTS_TLS_INSECURE_SKIP_VERIFY",
                    )
                    .optional()
                    .build(),
            )
            .build()
    }
}

/// Configuration value, falling back to an environment variable
fn string_setting(config: &DynamicValue, name: &str, env: &str) -> Result<Option<String>, Diagnostic> {
    Ok(optional_string(config, name)?
        .or_else(|| std::env::var(env).ok().filter(|value| !value.is_empty())))
}

fn insecure_from_env() -> Result<bool, Diagnostic> {
    let Some(raw) = std::env::var(INSECURE_ENV).ok().filter(|v| !v.is_empty()) else {
        return Ok(false);
    };
    raw.trim().parse::<bool>().map_err(|_| {
        Diagnostic::error(
            "Invalid environment variable",
            format!("{} must be \"true\" or \"false\", got {:?}", INSECURE_ENV, raw),
        )
        .with_attribute(AttributePath::new("tls_insecure_skip_verify"))
    })
}

fn client_config(config: &DynamicValue) -> Result<ClientConfig, Diagnostic> {
    let hostname = string_setting(config, "hostname", HOSTNAME_ENV)?
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

    let token = string_setting(config, "token", TOKEN_ENV)?.ok_or_else(|| {
        Diagnostic::error(
            "token is required (set in provider config or INFRADOTS_TOKEN env var)",
            "The provider needs an API token to authenticate against infradots",
        )
        .with_attribute(AttributePath::new("token"))
    })?;

    let insecure_skip_verify = match optional_bool(config, "tls_insecure_skip_verify")? {
        Some(value) => value,
        None => insecure_from_env()?,
    };

    Ok(ClientConfig {
        insecure_skip_verify,
        ..ClientConfig::new(hostname, token)
    })
}

#[async_trait]
impl Provider for InfradotsProvider {
    type Data = InfradotsProviderData;

    fn type_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse<InfradotsProviderData> {
        let mut diagnostics = Self::provider_schema().validate_config(&request.config);
        if !diagnostics.is_empty() {
            return ConfigureProviderResponse {
                provider_data: None,
                diagnostics,
            };
        }

        let config = match client_config(&request.config) {
            Ok(config) => config,
            Err(diag) => {
                return ConfigureProviderResponse {
                    provider_data: None,
                    diagnostics: vec![diag],
                }
            }
        };

        if config.insecure_skip_verify {
            tracing::warn!("TLS certificate verification is disabled for {}", config.hostname);
            diagnostics.push(
                Diagnostic::warning(
                    "Insecure TLS configuration",
                    "tls_insecure_skip_verify is enabled; server certificates will not be verified",
                )
                .with_attribute(AttributePath::new("tls_insecure_skip_verify")),
            );
        }

        let hostname = config.hostname.clone();
        match Client::with_config(config) {
            Ok(client) => {
                tracing::info!(
                    "Configured infradots provider for {} (terraform {})",
                    client.base_url(),
                    request.terraform_version
                );
                ConfigureProviderResponse {
                    provider_data: Some(InfradotsProviderData::new(client)),
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Failed to create API client", e.to_string())
                        .with_attribute(AttributePath::new("hostname")),
                );
                tracing::error!("Failed to create API client for {}: {}", hostname, e);
                ConfigureProviderResponse {
                    provider_data: None,
                    diagnostics,
                }
            }
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory<InfradotsProviderData>> {
        let mut factories: HashMap<String, ResourceFactory<InfradotsProviderData>> =
            HashMap::new();
        factories.insert(
            resources::organization::TYPE_NAME.to_string(),
            |data: &InfradotsProviderData| -> Box<dyn Resource> {
                Box::new(resources::OrganizationResource::new(data))
            },
        );
        factories.insert(
            resources::workspace::TYPE_NAME.to_string(),
            |data: &InfradotsProviderData| -> Box<dyn Resource> {
                Box::new(resources::WorkspaceResource::new(data))
            },
        );
        factories.insert(
            resources::variable::TYPE_NAME.to_string(),
            |data: &InfradotsProviderData| -> Box<dyn Resource> {
                Box::new(resources::VariableResource::new(data))
            },
        );
        factories.insert(
            resources::vcs::TYPE_NAME.to_string(),
            |data: &InfradotsProviderData| -> Box<dyn Resource> {
                Box::new(resources::VcsResource::new(data))
            },
        );
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory<InfradotsProviderData>> {
        let mut factories: HashMap<String, DataSourceFactory<InfradotsProviderData>> =
            HashMap::new();
        factories.insert(
            data_sources::organization::TYPE_NAME.to_string(),
            |data: &InfradotsProviderData| -> Box<dyn DataSource> {
                Box::new(data_sources::OrganizationDataSource::new(data))
            },
        );
        factories.insert(
            data_sources::workspace::TYPE_NAME.to_string(),
            |data: &InfradotsProviderData| -> Box<dyn DataSource> {
                Box::new(data_sources::WorkspaceDataSource::new(data))
            },
        );
        factories.insert(
            data_sources::vcs::TYPE_NAME.to_string(),
            |data: &InfradotsProviderData| -> Box<dyn DataSource> {
                Box::new(data_sources::VcsDataSource::new(data))
            },
        );
        factories
    }
}

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG` (default
/// `info`). Hosts that already installed a subscriber keep theirs.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
