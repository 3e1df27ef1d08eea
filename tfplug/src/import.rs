//! Import helpers for simplifying resource import implementations

use crate::resource::{ImportResourceStateResponse, ImportedResource};
use crate::types::{Diagnostic, DynamicValue};

/// Splits a colon-delimited import identifier into its segments.
///
/// `allowed` lists the accepted segment counts, `format` is the human-readable
/// shape shown in the error (e.g. `"organization_name:name"`). Empty segments
/// are rejected as well.
///
/// Example: `"acme:prod:TF_LOG"` with `allowed = [2, 3]` → `["acme", "prod", "TF_LOG"]`
pub fn split_import_id(
    id: &str,
    allowed: &[usize],
    format: &str,
) -> Result<Vec<String>, Diagnostic> {
    let parts: Vec<&str> = id.split(':').collect();

    if !allowed.contains(&parts.len()) || parts.iter().any(|p| p.trim().is_empty()) {
        return Err(Diagnostic::error(
            "Invalid import ID format",
            format!(
                "Expected import identifier with format: {}. Got: {:?}",
                format, id
            ),
        ));
    }

    Ok(parts.into_iter().map(str::to_string).collect())
}

/// Response carrying a single imported object
pub fn imported(type_name: &str, state: DynamicValue) -> ImportResourceStateResponse {
    ImportResourceStateResponse {
        imported_resources: vec![ImportedResource {
            type_name: type_name.to_string(),
            state,
        }],
        diagnostics: vec![],
    }
}

/// Response for a failed import
pub fn import_failed(diagnostic: Diagnostic) -> ImportResourceStateResponse {
    ImportResourceStateResponse {
        imported_resources: vec![],
        diagnostics: vec![diagnostic],
    }
}
