//! Variable API implementation
//!
//! Variables live either directly under an organization or under one of its
//! workspaces. Workspace scope is addressed by workspace name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::{segment, Client};
use super::error::ApiError;
use super::{empty_as_none, first_match, null_as_default};

/// Collection a variable belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope<'a> {
    Organization(&'a str),
    Workspace {
        organization: &'a str,
        workspace: &'a str,
    },
}

impl<'a> VariableScope<'a> {
    /// Workspace scope when a workspace name is given, organization scope otherwise
    pub fn new(organization: &'a str, workspace: Option<&'a str>) -> Self {
        match workspace {
            Some(workspace) => VariableScope::Workspace {
                organization,
                workspace,
            },
            None => VariableScope::Organization(organization),
        }
    }

    fn collection_path(&self) -> String {
        match self {
            VariableScope::Organization(organization) => {
                format!("/api/organizations/{}/variables/", segment(organization))
            }
            VariableScope::Workspace {
                organization,
                workspace,
            } => format!(
                "/api/organizations/{}/workspaces/{}/variables/",
                segment(organization),
                segment(workspace)
            ),
        }
    }
}

/// Variable as returned by the API. `value` may be withheld for sensitive
/// variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Variable {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub hcl: bool,
    /// Owning workspace id, absent for organization variables
    #[serde(default, deserialize_with = "empty_as_none")]
    pub workspace: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreateVariableRequest {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub sensitive: bool,
    pub hcl: bool,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UpdateVariableRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hcl: Option<bool>,
}

impl UpdateVariableRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct VariablesApi<'a> {
    client: &'a Client,
    scope: VariableScope<'a>,
}

impl<'a> VariablesApi<'a> {
    pub fn new(client: &'a Client, scope: VariableScope<'a>) -> Self {
        Self { client, scope }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.scope.collection_path(), segment(id))
    }

    pub async fn create(&self, request: &CreateVariableRequest) -> Result<Variable, ApiError> {
        self.client
            .create(&self.scope.collection_path(), request)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Variable>, ApiError> {
        self.client.fetch(&self.item_path(id)).await
    }

    pub async fn list(&self) -> Result<Vec<Variable>, ApiError> {
        self.client.list(&self.scope.collection_path()).await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateVariableRequest,
    ) -> Result<Variable, ApiError> {
        self.client.patch(&self.item_path(id), request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.remove(&self.item_path(id)).await
    }

    pub async fn find_by_key(&self, key: &str) -> Result<Option<Variable>, ApiError> {
        let variables = self.list().await?;
        Ok(first_match(variables, "Variable", key, |v| v.key == key))
    }
}
