//! Workspace API implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::{segment, Client};
use super::error::ApiError;
use super::vcs::VcsConnection;
use super::{first_match, null_as_default};

/// Workspace as returned by the API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub terraform_version: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vcs: Option<VcsConnection>,
}

#[derive(Debug, Serialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: String,
    pub branch: String,
    pub terraform_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_id: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UpdateWorkspaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    /// `Some(None)` detaches the VCS connection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_id: Option<Option<String>>,
}

impl UpdateWorkspaceRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct WorkspacesApi<'a> {
    client: &'a Client,
    organization: &'a str,
}

impl<'a> WorkspacesApi<'a> {
    pub fn new(client: &'a Client, organization: &'a str) -> Self {
        Self {
            client,
            organization,
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/api/organizations/{}/workspaces/",
            segment(self.organization)
        )
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.collection_path(), segment(id))
    }

    pub async fn create(&self, request: &CreateWorkspaceRequest) -> Result<Workspace, ApiError> {
        self.client.create(&self.collection_path(), request).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Workspace>, ApiError> {
        self.client.fetch(&self.item_path(id)).await
    }

    pub async fn list(&self) -> Result<Vec<Workspace>, ApiError> {
        self.client.list(&self.collection_path()).await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        self.client.patch(&self.item_path(id), request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.remove(&self.item_path(id)).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Workspace>, ApiError> {
        let workspaces = self.list().await?;
        Ok(first_match(workspaces, "Workspace", name, |w| w.name == name))
    }
}
