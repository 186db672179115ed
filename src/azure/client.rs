//! ARM Client
//!
//! Main client for the Azure Resource Manager control plane, combining
//! authentication and HTTP functionality.

use super::auth::ArmCredentials;
use super::error::ArmError;
use super::http::{ArmHttpClient, ArmResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Public-cloud ARM endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Interval between long-running operation polls when the server sends no `Retry-After`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Main ARM client
#[derive(Clone)]
pub struct ArmClient {
    pub credentials: ArmCredentials,
    pub http: ArmHttpClient,
    pub subscription_id: String,
    endpoint: Url,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(
        subscription_id: &str,
        endpoint: &str,
        credentials: ArmCredentials,
    ) -> Result<Self, ArmError> {
        let http = ArmHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            subscription_id: subscription_id.to_string(),
            endpoint: Url::parse(endpoint)?,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String, ArmError> {
        self.credentials.get_token().await
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build `{endpoint}{resource_id}?api-version={api_version}`
    pub fn resource_url(&self, resource_id: &str, api_version: &str) -> Result<String, ArmError> {
        let mut url = self.endpoint.join(resource_id)?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url.to_string())
    }

    /// Build the URL of a POST action on a resource, e.g. `listkeys`
    pub fn action_url(
        &self,
        resource_id: &str,
        action: &str,
        api_version: &str,
    ) -> Result<String, ArmError> {
        self.resource_url(&format!("{}/{}", resource_id, action), api_version)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    pub async fn get(&self, url: &str) -> Result<ArmResponse, ArmError> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    pub async fn put(&self, url: &str, body: &Value) -> Result<ArmResponse, ArmError> {
        let token = self.get_token().await?;
        self.http.put(url, &token, body).await
    }

    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<ArmResponse, ArmError> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    pub async fn delete(&self, url: &str) -> Result<ArmResponse, ArmError> {
        let token = self.get_token().await?;
        self.http.delete(url, &token).await
    }

    /// GET a resource and decode its model
    pub async fn get_resource<T: DeserializeOwned>(
        &self,
        resource_id: &str,
        api_version: &str,
    ) -> Result<T, ArmError> {
        let url = self.resource_url(resource_id, api_version)?;
        let response = self.get(&url).await?;
        Ok(serde_json::from_value(response.body)?)
    }
}
