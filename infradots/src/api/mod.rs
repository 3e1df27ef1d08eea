pub mod client;
pub mod error;
pub mod organizations;
pub mod variables;
pub mod vcs;
pub mod workspaces;

pub use client::{Client, ClientConfig, DEFAULT_HOSTNAME};
pub use error::ApiError;
pub use organizations::Organization;
pub use variables::{Variable, VariableScope};
pub use vcs::VcsConnection;
pub use workspaces::Workspace;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};

/// Formats an API timestamp the way it is stored in state: UTC, whole
/// seconds, `Z` suffix.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Deserializes `null` as the type's default value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes an empty string as `None`
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// Linear scan for a natural key. Uniqueness is enforced by the server, not
/// here: when several records match, the first one wins and the ambiguity is
/// logged.
pub(crate) fn first_match<T>(
    items: Vec<T>,
    kind: &str,
    name: &str,
    matches: impl Fn(&T) -> bool,
) -> Option<T> {
    let mut found = items.into_iter().filter(|item| matches(item));
    let first = found.next();
    let extra = found.count();

    if first.is_some() && extra > 0 {
        tracing::warn!(
            "{} lookup for {:?} matched {} records, using the first one",
            kind,
            name,
            extra + 1
        );
    }

    first
}
