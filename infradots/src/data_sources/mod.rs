//! Data source implementations
//!
//! Every data source resolves one existing object either by `id` or by
//! `name`. Name lookups list the owning collection and take the first exact
//! match.

pub mod organization;
pub mod vcs;
pub mod workspace;

pub use organization::OrganizationDataSource;
pub use vcs::VcsDataSource;
pub use workspace::WorkspaceDataSource;

use crate::api::ApiError;
use crate::state::optional_string;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// How a data source finds its object
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup {
    ById(String),
    ByName(String),
}

impl Lookup {
    /// Reads the filter from configuration, preferring `id` over `name`
    pub(crate) fn from_config(config: &DynamicValue) -> Result<Option<Self>, Diagnostic> {
        if let Some(id) = optional_string(config, "id")? {
            return Ok(Some(Lookup::ById(id)));
        }
        Ok(optional_string(config, "name")?.map(Lookup::ByName))
    }
}

/// True when the attribute is set, even if its value is not known yet
pub(crate) fn is_set(config: &DynamicValue, name: &str) -> bool {
    !matches!(
        config.get(&AttributePath::new(name)),
        Ok(Dynamic::Null) | Err(_)
    )
}

pub(crate) fn missing_parameter(detail: &str) -> Diagnostic {
    Diagnostic::error("Missing required parameter", detail)
}

pub(crate) fn not_found(kind: &str, detail: String) -> Diagnostic {
    Diagnostic::error(format!("{} not found", kind), detail)
}

/// Diagnostic for a failed lookup call
pub(crate) fn lookup_failed(kind: &str, error: &ApiError) -> Diagnostic {
    match error {
        ApiError::UnexpectedStatus { .. } => {
            Diagnostic::error("Unexpected HTTP status code", error.to_string())
        }
        other => Diagnostic::error(format!("Error reading {}", kind), other.to_string()),
    }
}
