//! Provider trait and typed provider data wiring
//!
//! A provider parses its own configuration once and produces a typed
//! `Data` value (API clients, credentials). Resources and data sources are
//! built from that value by factory functions, so every instance receives
//! its dependencies at construction and never has to downcast them.

use crate::context::Context;
use crate::data_source::DataSource;
use crate::error::{Result, TfplugError};
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, Resource};
use crate::schema::Schema;
use crate::types::{has_errors, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::collections::HashMap;

/// Builds a resource from configured provider data
pub type ResourceFactory<D> = fn(&D) -> Box<dyn Resource>;

/// Builds a data source from configured provider data
pub type DataSourceFactory<D> = fn(&D) -> Box<dyn DataSource>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Immutable handle shared by every resource and data source
    type Data: Clone + Send + Sync + 'static;

    /// Provider type name, the prefix of every resource type (e.g. "infradots")
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Parse provider configuration and build the provider data.
    /// `provider_data` MUST be `Some` whenever no error diagnostic is returned.
    async fn configure(
        &self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse<Self::Data>;

    /// Resource factories keyed by resource type name
    fn resources(&self) -> HashMap<String, ResourceFactory<Self::Data>>;

    /// Data source factories keyed by data source type name
    fn data_sources(&self) -> HashMap<String, DataSourceFactory<Self::Data>>;
}

pub struct ProviderMetadataRequest;

pub struct ProviderMetadataResponse {
    pub type_name: String,
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse<D> {
    pub provider_data: Option<D>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A provider after a successful configure call
pub struct ConfiguredProvider<D> {
    data: D,
    resources: HashMap<String, ResourceFactory<D>>,
    data_sources: HashMap<String, DataSourceFactory<D>>,
}

impl<D: Clone + Send + Sync + 'static> ConfiguredProvider<D> {
    /// Runs `configure` and captures the factories. Warnings are returned
    /// alongside the configured provider; any error fails the whole call.
    pub async fn configure<P>(
        provider: &P,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> std::result::Result<(Self, Vec<Diagnostic>), Vec<Diagnostic>>
    where
        P: Provider<Data = D>,
    {
        let response = provider.configure(ctx, request).await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }

        match response.provider_data {
            Some(data) => Ok((
                Self {
                    data,
                    resources: provider.resources(),
                    data_sources: provider.data_sources(),
                },
                response.diagnostics,
            )),
            None => {
                let mut diagnostics = response.diagnostics;
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Provider configure returned no provider data",
                ));
                Err(diagnostics)
            }
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn resource(&self, type_name: &str) -> Result<Box<dyn Resource>> {
        self.resources
            .get(type_name)
            .map(|factory| factory(&self.data))
            .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>> {
        self.data_sources
            .get(type_name)
            .map(|factory| factory(&self.data))
            .ok_or_else(|| TfplugError::DataSourceNotFound(type_name.to_string()))
    }

    /// Routes an import to the resource type, failing when it has no importer
    pub async fn import_resource(
        &self,
        ctx: Context,
        type_name: &str,
        id: &str,
    ) -> Result<ImportResourceStateResponse> {
        let resource = self.resource(type_name)?;
        let importer = resource.importer().ok_or_else(|| {
            TfplugError::Custom(format!("Resource {} does not support import", type_name))
        })?;

        Ok(importer
            .import_state(
                ctx,
                ImportResourceStateRequest {
                    type_name: type_name.to_string(),
                    id: id.to_string(),
                },
            )
            .await)
    }

    pub fn resource_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn data_source_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.data_sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
