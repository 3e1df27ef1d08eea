//! Helpers for moving values between resource state and API records

use crate::api::{format_timestamp, ApiError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Attribute map of one state object
pub(crate) type Fields = HashMap<String, Dynamic>;

pub(crate) fn into_state(fields: Fields) -> DynamicValue {
    DynamicValue::new(Dynamic::Map(fields))
}

pub(crate) fn string(value: &str) -> Dynamic {
    Dynamic::String(value.to_string())
}

pub(crate) fn timestamp(value: Option<&DateTime<Utc>>) -> Dynamic {
    Dynamic::optional_string(value.map(format_timestamp))
}

/// Strings the API returns as `""` when unset. An empty value is kept only
/// when the prior state held an empty string too, otherwise it becomes null.
pub(crate) fn optional_text(api_value: &str, prior: Option<&DynamicValue>, name: &str) -> Dynamic {
    if !api_value.is_empty() {
        return string(api_value);
    }

    let prior_empty = prior
        .and_then(|state| state.get(&AttributePath::new(name)).ok())
        .and_then(Dynamic::as_str)
        .map(str::is_empty)
        .unwrap_or(false);

    if prior_empty {
        string("")
    } else {
        Dynamic::Null
    }
}

/// Copies an attribute unchanged from an earlier state or plan
pub(crate) fn carried(value: &DynamicValue, name: &str) -> Dynamic {
    match value.get(&AttributePath::new(name)) {
        Ok(Dynamic::Unknown) | Err(_) => Dynamic::Null,
        Ok(v) => v.clone(),
    }
}

pub(crate) fn required_string(value: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
    optional_string(value, name)?.ok_or_else(|| {
        Diagnostic::error(
            "Missing required argument",
            format!("The argument \"{}\" is required", name),
        )
        .with_attribute(AttributePath::new(name))
    })
}

pub(crate) fn optional_string(value: &DynamicValue, name: &str) -> Result<Option<String>, Diagnostic> {
    value
        .get_optional_string(&AttributePath::new(name))
        .map_err(|e| invalid_value(name, e))
}

pub(crate) fn optional_bool(value: &DynamicValue, name: &str) -> Result<Option<bool>, Diagnostic> {
    value
        .get_optional_bool(&AttributePath::new(name))
        .map_err(|e| invalid_value(name, e))
}

fn invalid_value(name: &str, error: tfplug::TfplugError) -> Diagnostic {
    Diagnostic::error("Invalid attribute value", error.to_string())
        .with_attribute(AttributePath::new(name))
}

/// `Some(planned)` when the planned value differs from the prior one
pub(crate) fn changed<T: PartialEq>(planned: Option<T>, prior: Option<T>) -> Option<T> {
    match planned {
        Some(value) if prior.as_ref() != Some(&value) => Some(value),
        _ => None,
    }
}

/// Like [`changed`], but a value removed from the plan clears the remote
/// field with an empty string
pub(crate) fn changed_or_cleared(planned: Option<String>, prior: Option<String>) -> Option<String> {
    match (planned, prior) {
        (None, Some(prior)) if !prior.is_empty() => Some(String::new()),
        (planned, prior) => changed(planned, prior),
    }
}

/// Planned state with every unknown attribute resolved from the prior state
pub(crate) fn resolve_unknowns(planned: &DynamicValue, prior: &DynamicValue) -> DynamicValue {
    let Dynamic::Map(fields) = &planned.value else {
        return prior.clone();
    };

    let resolved = fields
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Dynamic::Unknown => carried(prior, name),
                other => other.clone(),
            };
            (name.clone(), value)
        })
        .collect();

    into_state(resolved)
}

/// Error diagnostic for a failed API call
pub(crate) fn api_error(summary: &str, error: &ApiError) -> Diagnostic {
    tracing::error!(status = ?error.status(), "{}: {}", summary, error);
    Diagnostic::error(summary, error.to_string())
}

pub(crate) fn immutable(name: &str) -> Diagnostic {
    Diagnostic::error(
        "Attribute cannot be changed",
        format!(
            "\"{}\" determines where the object lives and cannot be updated in place",
            name
        ),
    )
    .with_attribute(AttributePath::new(name))
}
