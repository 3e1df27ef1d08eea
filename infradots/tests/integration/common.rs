//! Shared setup for provider tests against a mock infradots API

use infradots::{InfradotsProvider, InfradotsProviderData};
use mockito::{Server, ServerGuard};
use std::fmt::{self, Write};
use std::sync::{Arc, Mutex};
use tfplug::context::Context;
use tfplug::provider::{ConfigureProviderRequest, ConfiguredProvider};
use tfplug::resource::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceSchemaRequest,
    UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{self, Layer};
use tracing_subscriber::registry::LookupSpan;

pub const TOKEN: &str = "test-token";

pub struct TestProvider {
    pub server: ServerGuard,
    pub provider: ConfiguredProvider<InfradotsProviderData>,
}

/// Starts a mock server and configures the provider against it
pub async fn setup() -> TestProvider {
    infradots::init_logging();
    let server = Server::new_async().await;

    let config = object(&[
        ("hostname", s(&server.url())),
        ("token", s(TOKEN)),
    ]);
    let (provider, warnings) = ConfiguredProvider::configure(
        &InfradotsProvider::new(),
        Context::new(),
        ConfigureProviderRequest {
            terraform_version: "1.6.0".to_string(),
            config,
        },
    )
    .await
    .expect("provider configures");
    assert!(warnings.is_empty());

    TestProvider { server, provider }
}

pub fn s(value: &str) -> Dynamic {
    Dynamic::String(value.to_string())
}

pub fn object(pairs: &[(&str, Dynamic)]) -> DynamicValue {
    DynamicValue::new(Dynamic::Map(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    ))
}

pub fn get_string(state: &DynamicValue, name: &str) -> String {
    state.get_string(&AttributePath::new(name)).unwrap()
}

pub fn get_bool(state: &DynamicValue, name: &str) -> bool {
    state.get_bool(&AttributePath::new(name)).unwrap()
}

pub fn is_null(state: &DynamicValue, name: &str) -> bool {
    matches!(state.get(&AttributePath::new(name)), Ok(Dynamic::Null))
}

impl TestProvider {
    pub fn resource(&self, type_name: &str) -> Box<dyn Resource> {
        self.provider.resource(type_name).unwrap()
    }

    /// Config with schema defaults applied, the way the host plans it
    pub async fn plan(&self, type_name: &str, config: &DynamicValue) -> DynamicValue {
        let resource = self.resource(type_name);
        let schema = resource
            .schema(Context::new(), ResourceSchemaRequest)
            .await
            .schema;
        assert!(
            schema.validate_config(config).is_empty(),
            "invalid test config for {}",
            type_name
        );
        schema.apply_defaults(config)
    }

    pub async fn create(&self, type_name: &str, config: DynamicValue) -> CreateResourceResponse {
        let planned_state = self.plan(type_name, &config).await;
        self.resource(type_name)
            .create(
                Context::for_operation(type_name, "create"),
                CreateResourceRequest {
                    type_name: type_name.to_string(),
                    planned_state,
                    config,
                },
            )
            .await
    }

    pub async fn read(&self, type_name: &str, current_state: DynamicValue) -> ReadResourceResponse {
        self.resource(type_name)
            .read(
                Context::for_operation(type_name, "read"),
                ReadResourceRequest {
                    type_name: type_name.to_string(),
                    current_state,
                },
            )
            .await
    }

    /// Plans `config` on top of `prior_state` and applies it
    pub async fn update(
        &self,
        type_name: &str,
        prior_state: DynamicValue,
        config: DynamicValue,
    ) -> UpdateResourceResponse {
        let planned_state = self.plan(type_name, &config).await;
        self.resource(type_name)
            .update(
                Context::for_operation(type_name, "update"),
                UpdateResourceRequest {
                    type_name: type_name.to_string(),
                    prior_state,
                    planned_state,
                    config,
                },
            )
            .await
    }

    pub async fn delete(&self, type_name: &str, prior_state: DynamicValue) -> DeleteResourceResponse {
        self.resource(type_name)
            .delete(
                Context::for_operation(type_name, "delete"),
                DeleteResourceRequest {
                    type_name: type_name.to_string(),
                    prior_state,
                },
            )
            .await
    }
}

/// A log line together with the fields of the span it was emitted in
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub span: String,
    pub message: String,
}

/// Layer recording every event with its enclosing span fields
#[derive(Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

struct SpanFields(String);

#[derive(Default)]
struct FieldText(String);

impl Visit for FieldText {
    fn record_str(&mut self, field: &Field, value: &str) {
        let _ = write!(self.0, "{}={} ", field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

impl<S> Layer<S> for EventCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: layer::Context<'_, S>) {
        let mut fields = FieldText::default();
        attrs.record(&mut fields);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(fields.0));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: layer::Context<'_, S>) {
        let mut message = FieldText::default();
        event.record(&mut message);
        let span = ctx
            .event_span(event)
            .and_then(|span| span.extensions().get::<SpanFields>().map(|f| f.0.clone()))
            .unwrap_or_default();

        self.events.lock().unwrap().push(CapturedEvent {
            span,
            message: message.0,
        });
    }
}
