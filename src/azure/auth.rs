//! Azure Authentication
//!
//! Obtains ARM bearer tokens from a static token, a service principal client
//! secret, or the Azure CLI, and caches them until shortly before expiry.

use super::error::ArmError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default Entra ID authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 60;

/// Where tokens come from
#[derive(Clone)]
pub enum TokenSource {
    /// A pre-issued bearer token (`ARM_ACCESS_TOKEN`)
    Static(String),
    /// OAuth2 client credentials grant for a service principal
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
        authority_host: String,
    },
    /// `az account get-access-token`
    AzureCli,
}

impl std::fmt::Debug for TokenSource {
    // Security: never print secrets
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(***)"),
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => write!(f, "ClientSecret({}/{})", tenant_id, client_id),
            Self::AzureCli => f.write_str("AzureCli"),
        }
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

/// ARM credentials holder with token caching
#[derive(Clone)]
pub struct ArmCredentials {
    source: TokenSource,
    resource: String,
    http: reqwest::Client,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl ArmCredentials {
    /// Credentials for the ARM audience `resource` (e.g. `https://management.azure.com`)
    pub fn new(source: TokenSource, resource: &str) -> Self {
        Self {
            source,
            resource: resource.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    pub fn static_token(token: impl Into<String>) -> Self {
        Self::new(TokenSource::Static(token.into()), "")
    }

    /// Pick a token source from the environment
    ///
    /// `ARM_ACCESS_TOKEN` wins, then a complete `ARM_TENANT_ID` /
    /// `ARM_CLIENT_ID` / `ARM_CLIENT_SECRET` triple, then the Azure CLI.
    pub fn from_env(
        tenant_id: Option<&str>,
        client_id: Option<&str>,
        authority_host: &str,
        resource: &str,
    ) -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(token) = env("ARM_ACCESS_TOKEN") {
            tracing::info!("Using static access token from ARM_ACCESS_TOKEN");
            return Self::new(TokenSource::Static(token), resource);
        }

        let tenant_id = env("ARM_TENANT_ID").or_else(|| tenant_id.map(str::to_string));
        let client_id = env("ARM_CLIENT_ID").or_else(|| client_id.map(str::to_string));
        if let (Some(tenant_id), Some(client_id), Some(client_secret)) =
            (tenant_id, client_id, env("ARM_CLIENT_SECRET"))
        {
            tracing::info!("Using client secret credentials for {}", client_id);
            return Self::new(
                TokenSource::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                    authority_host: authority_host.trim_end_matches('/').to_string(),
                },
                resource,
            );
        }

        tracing::info!("Using Azure CLI credentials");
        Self::new(TokenSource::AzureCli, resource)
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    /// Get an access token for API calls
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<String, ArmError> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let (token, ttl_secs) = self.fetch_token().await?;
        let expires_at =
            Utc::now() + ChronoDuration::seconds(ttl_secs - TOKEN_EXPIRY_BUFFER_SECS);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!("New token cached, expires at {}", expires_at);

        Ok(token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String, ArmError> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }
        self.get_token().await
    }

    /// Fetch a token and its lifetime in seconds
    async fn fetch_token(&self) -> Result<(String, i64), ArmError> {
        match &self.source {
            TokenSource::Static(token) => Ok((token.clone(), DEFAULT_TOKEN_TTL_SECS)),
            TokenSource::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
                authority_host,
            } => {
                let url = format!("{}/{}/oauth2/v2.0/token", authority_host, tenant_id);
                let scope = format!("{}/.default", self.resource);
                tracing::debug!("POST {}", url);

                let response = self
                    .http
                    .post(&url)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("scope", scope.as_str()),
                    ])
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ArmError::Authentication(format!(
                        "token endpoint returned {}",
                        status
                    )));
                }

                let body: OAuthTokenResponse = response.json().await?;
                let ttl = body
                    .expires_in
                    .as_ref()
                    .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
                    .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
                Ok((body.access_token, ttl))
            }
            TokenSource::AzureCli => {
                let output = tokio::process::Command::new("az")
                    .args([
                        "account",
                        "get-access-token",
                        "--resource",
                        self.resource.as_str(),
                        "--output",
                        "json",
                    ])
                    .output()
                    .await
                    .map_err(|e| {
                        ArmError::Authentication(format!("failed to run the Azure CLI: {}", e))
                    })?;

                if !output.status.success() {
                    return Err(ArmError::Authentication(
                        "Azure CLI could not issue a token. Run 'az login'".to_string(),
                    ));
                }

                let body: CliTokenResponse = serde_json::from_slice(&output.stdout)?;
                let ttl = body
                    .expires_on
                    .map(|epoch| epoch - Utc::now().timestamp())
                    .filter(|ttl| *ttl > TOKEN_EXPIRY_BUFFER_SECS)
                    .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
                Ok((body.access_token, ttl))
            }
        }
    }
}

/// Get the Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Validate an Azure subscription ID (a GUID)
pub fn validate_subscription_id(subscription_id: &str) -> bool {
    uuid::Uuid::parse_str(subscription_id).is_ok()
}

/// Read the default subscription
/// Security: Validates the subscription ID format before returning
pub fn get_default_subscription() -> Option<String> {
    for name in ["ARM_SUBSCRIPTION_ID", "AZURE_SUBSCRIPTION_ID"] {
        if let Ok(subscription) = std::env::var(name) {
            if validate_subscription_id(&subscription) {
                return Some(subscription);
            }
            tracing::warn!("Invalid subscription ID format in {}", name);
        }
    }

    let profile_path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(profile_path).ok()?;
    default_subscription_from_profile(&content)
}

/// Find the default subscription in an `azureProfile.json` document
fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The Azure CLI writes this file with a UTF-8 BOM
    let content = content.trim_start_matches('\u{feff}');
    let profile: Value = serde_json::from_str(content).ok()?;

    profile
        .get("subscriptions")?
        .as_array()?
        .iter()
        .find(|s| s.get("isDefault").and_then(|v| v.as_bool()).unwrap_or(false))
        .and_then(|s| s.get("id"))
        .and_then(|v| v.as_str())
        .filter(|id| validate_subscription_id(id))
        .map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subscription_id() {
        assert!(validate_subscription_id("12345678-1234-9876-4563-123456789012"));
        assert!(!validate_subscription_id("my-subscription"));
        assert!(!validate_subscription_id(""));
    }

    #[test]
    fn test_default_subscription_from_profile() {
        let profile = "\u{feff}{\"subscriptions\":[\
            {\"id\":\"00000000-0000-0000-0000-000000000001\",\"isDefault\":false},\
            {\"id\":\"00000000-0000-0000-0000-000000000002\",\"isDefault\":true}]}";
        assert_eq!(
            default_subscription_from_profile(profile).as_deref(),
            Some("00000000-0000-0000-0000-000000000002")
        );
        assert!(default_subscription_from_profile("{}").is_none());
    }

    #[test]
    fn test_static_token_is_cached() {
        let credentials = ArmCredentials::static_token("abc");
        let token = tokio_test::block_on(credentials.get_token()).unwrap();
        assert_eq!(token, "abc");
        let token = tokio_test::block_on(credentials.refresh_token()).unwrap();
        assert_eq!(token, "abc");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let source = TokenSource::ClientSecret {
            tenant_id: "t".to_string(),
            client_id: "c".to_string(),
            client_secret: "hunter2".to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        };
        assert!(!format!("{:?}", source).contains("hunter2"));
        assert_eq!(format!("{:?}", TokenSource::Static("tok".into())), "Static(***)");
    }
}
