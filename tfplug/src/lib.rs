//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-facing half of the Terraform plugin contract: dynamic values,
//! diagnostics, schemas, and the async traits that providers, resources and
//! data sources implement.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod validator;

// Re-exports for convenience
pub use context::Context;
pub use data_source::DataSource;
pub use error::{Result, TfplugError};
pub use import::split_import_id;
pub use provider::{ConfiguredProvider, Provider};
pub use resource::{Resource, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
