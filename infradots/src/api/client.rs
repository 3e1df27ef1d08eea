use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;
use super::organizations::OrganizationsApi;
use super::variables::{VariableScope, VariablesApi};
use super::vcs::VcsApi;
use super::workspaces::WorkspacesApi;

pub const DEFAULT_HOSTNAME: &str = "api.infradots.com";

const USER_AGENT: &str = concat!("terraform-provider-infradots/", env!("CARGO_PKG_VERSION"));

/// infradots API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
}

#[derive(Clone)]
pub struct ClientConfig {
    pub hostname: String,
    pub token: String,
    pub insecure_skip_verify: bool,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(hostname: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            token: token.into(),
            insecure_skip_verify: false,
            timeout: Duration::from_secs(30),
        }
    }
}

// Some list endpoints are paginated and wrap the records in `results`
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> From<ListBody<T>> for Vec<T> {
    fn from(body: ListBody<T>) -> Self {
        match body {
            ListBody::Plain(items) => items,
            ListBody::Paged { results } => results,
        }
    }
}

/// Turns a configured hostname into a base URL. Bare hostnames get an
/// `https://` scheme; explicit `http://`/`https://` endpoints are kept.
pub fn normalize_endpoint(hostname: &str) -> Result<String, ApiError> {
    let trimmed = hostname.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidEndpoint("hostname is empty".to_string()));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = url::Url::parse(&candidate)
        .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", hostname, e)))?;
    if parsed.host_str().is_none() {
        return Err(ApiError::InvalidEndpoint(format!(
            "{}: missing host",
            hostname
        )));
    }

    Ok(candidate.trim_end_matches('/').to_string())
}

/// Percent-encodes one path segment
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

impl Client {
    pub fn new(hostname: &str, token: &str, insecure_skip_verify: bool) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig {
            insecure_skip_verify,
            ..ClientConfig::new(hostname, token)
        })
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = normalize_endpoint(&config.hostname)?;

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                auth_header: format!("Bearer {}", config.token),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Organization operations
    pub fn organizations(&self) -> OrganizationsApi<'_> {
        OrganizationsApi::new(self)
    }

    /// Workspace operations within one organization
    pub fn workspaces<'a>(&'a self, organization: &'a str) -> WorkspacesApi<'a> {
        WorkspacesApi::new(self, organization)
    }

    /// Variable operations within an organization or one of its workspaces
    pub fn variables<'a>(&'a self, scope: VariableScope<'a>) -> VariablesApi<'a> {
        VariablesApi::new(self, scope)
    }

    /// VCS connection operations within one organization
    pub fn vcs<'a>(&'a self, organization: &'a str) -> VcsApi<'a> {
        VcsApi::new(self, organization)
    }

    /// POST to a collection; only 201 Created counts as success
    pub async fn create<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(Self::unexpected_status(response).await);
        }
        Self::parse_body(response).await
    }

    /// GET a single record; 404 maps to `None`
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;

        match response.status() {
            StatusCode::OK => Self::parse_body(response).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::unexpected_status(response).await),
        }
    }

    /// GET a collection
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;

        if response.status() != StatusCode::OK {
            return Err(Self::unexpected_status(response).await);
        }
        Self::parse_body::<ListBody<T>>(response).await.map(Vec::from)
    }

    /// PATCH a record with a partial body
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(Method::PATCH, path).json(body))
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Self::unexpected_status(response).await);
        }
        Self::parse_body(response).await
    }

    /// DELETE a record. Records that are already gone count as deleted.
    pub async fn remove(&self, path: &str) -> Result<(), ApiError> {
        let response = self.send(self.request(Method::DELETE, path)).await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::debug!("{} was already deleted", path);
                Ok(())
            }
            _ => Err(Self::unexpected_status(response).await),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("{} request to: {}", method, url);

        self.inner
            .http_client
            .request(method, url)
            .header(AUTHORIZATION, &self.inner.auth_header)
            .header(ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        tracing::debug!("Response status: {}", response.status());
        Ok(response)
    }

    async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::trace!("API response body: {}", text);

        serde_json::from_str::<T>(&text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(e.to_string())
        })
    }

    async fn unexpected_status(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));

        ApiError::UnexpectedStatus { status, body }
    }
}
