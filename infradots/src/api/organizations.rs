//! Organization API implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::{segment, Client};
use super::error::ApiError;
use super::{first_match, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
}

/// Organization as returned by the API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub execution_mode: String,
    #[serde(default)]
    pub agents_enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<Member>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub subscription: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Option<serde_json::Value>,
}

/// Request body for creating organizations
#[derive(Debug, Serialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents_enabled: Option<bool>,
}

/// Partial update body, only changed fields are sent
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UpdateOrganizationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents_enabled: Option<bool>,
}

impl UpdateOrganizationRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct OrganizationsApi<'a> {
    client: &'a Client,
}

impl<'a> OrganizationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn collection_path() -> String {
        "/api/organizations/".to_string()
    }

    fn item_path(id: &str) -> String {
        format!("/api/organizations/{}/", segment(id))
    }

    pub async fn create(
        &self,
        request: &CreateOrganizationRequest,
    ) -> Result<Organization, ApiError> {
        self.client
            .create(&Self::collection_path(), request)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Organization>, ApiError> {
        self.client.fetch(&Self::item_path(id)).await
    }

    pub async fn list(&self) -> Result<Vec<Organization>, ApiError> {
        self.client.list(&Self::collection_path()).await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateOrganizationRequest,
    ) -> Result<Organization, ApiError> {
        self.client.patch(&Self::item_path(id), request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.remove(&Self::item_path(id)).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, ApiError> {
        let organizations = self.list().await?;
        Ok(first_match(organizations, "Organization", name, |o| {
            o.name == name
        }))
    }
}
