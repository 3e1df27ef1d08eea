//! VCS connection API implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::{segment, Client};
use super::error::ApiError;
use super::{first_match, null_as_default};

/// VCS connection as returned by the API. The client secret is write-only
/// and normally absent from responses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VcsConnection {
    pub id: String,
    pub name: String,
    #[serde(rename = "vcsType", default, deserialize_with = "null_as_default")]
    pub vcs_type: String,
    #[serde(rename = "endpoint", default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(rename = "clientId", default, deserialize_with = "null_as_default")]
    pub client_id: String,
    #[serde(rename = "clientSecret", default)]
    pub client_secret: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreateVcsRequest {
    pub name: String,
    #[serde(rename = "vcsType")]
    pub vcs_type: String,
    #[serde(rename = "endpoint")]
    pub url: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UpdateVcsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "vcsType", skip_serializing_if = "Option::is_none")]
    pub vcs_type: Option<String>,
    #[serde(rename = "endpoint", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "clientSecret", skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateVcsRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct VcsApi<'a> {
    client: &'a Client,
    organization: &'a str,
}

impl<'a> VcsApi<'a> {
    pub fn new(client: &'a Client, organization: &'a str) -> Self {
        Self {
            client,
            organization,
        }
    }

    fn collection_path(&self) -> String {
        format!("/api/organizations/{}/vcs/", segment(self.organization))
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.collection_path(), segment(id))
    }

    pub async fn create(&self, request: &CreateVcsRequest) -> Result<VcsConnection, ApiError> {
        self.client.create(&self.collection_path(), request).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<VcsConnection>, ApiError> {
        self.client.fetch(&self.item_path(id)).await
    }

    pub async fn list(&self) -> Result<Vec<VcsConnection>, ApiError> {
        self.client.list(&self.collection_path()).await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateVcsRequest,
    ) -> Result<VcsConnection, ApiError> {
        self.client.patch(&self.item_path(id), request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.remove(&self.item_path(id)).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<VcsConnection>, ApiError> {
        let connections = self.list().await?;
        Ok(first_match(connections, "VCS connection", name, |v| {
            v.name == name
        }))
    }
}
