//! Configuration Management
//!
//! Handles persistent configuration storage for armctl.

use crate::azure::auth::{self, DEFAULT_AUTHORITY_HOST};
use crate::azure::client::{DEFAULT_ENDPOINT, DEFAULT_POLL_INTERVAL};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// User configuration
///
/// Secrets are never stored here; the client secret comes from
/// `ARM_CLIENT_SECRET` only.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default subscription
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Service principal used with `ARM_CLIENT_SECRET`
    #[serde(default)]
    pub client_id: Option<String>,
    /// ARM endpoint, for sovereign clouds
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub authority_host: Option<String>,
    /// Drop the deprecated Service Bus topic fields
    #[serde(default)]
    pub five_point_oh: bool,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armctl").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content),
            Err(e) => {
                tracing::warn!("Could not read {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parse a config document, falling back to defaults when it is invalid
    pub fn from_json(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid config file: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective subscription (CLI > config > environment > Azure CLI default)
    pub fn effective_subscription(&self, cli: Option<&str>) -> Result<String> {
        let chosen = cli
            .map(str::to_string)
            .or_else(|| self.subscription_id.clone())
            .or_else(auth::get_default_subscription);

        match chosen {
            Some(id) if auth::validate_subscription_id(&id) => Ok(id),
            Some(id) => bail!("subscription ID {:?} is not a GUID", id),
            None => bail!(
                "no subscription selected. Pass --subscription, set ARM_SUBSCRIPTION_ID, or run 'az account set'"
            ),
        }
    }

    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn effective_authority_host(&self) -> String {
        self.authority_host
            .clone()
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Set subscription and save
    pub fn set_subscription(&mut self, subscription_id: &str) -> Result<()> {
        if !auth::validate_subscription_id(subscription_id) {
            bail!("subscription ID {:?} is not a GUID", subscription_id);
        }
        self.subscription_id = Some(subscription_id.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUB: &str = "11111111-2222-3333-4444-555555555555";

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.effective_authority_host(), DEFAULT_AUTHORITY_HOST);
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert!(!config.five_point_oh);
    }

    #[test]
    fn test_from_json() {
        let config = Config::from_json(
            r#"{"subscription_id": "11111111-2222-3333-4444-555555555555", "five_point_oh": true, "poll_interval_secs": 2}"#,
        );
        assert_eq!(config.subscription_id.as_deref(), Some(SUB));
        assert!(config.five_point_oh);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));

        assert_eq!(Config::from_json("not json"), Config::default());
    }

    #[test]
    fn test_cli_subscription_wins() {
        let config = Config {
            subscription_id: Some("99999999-2222-3333-4444-555555555555".to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_subscription(Some(SUB)).unwrap(), SUB);
    }

    #[test]
    fn test_invalid_subscription_rejected() {
        let config = Config::default();
        let err = config.effective_subscription(Some("prod")).unwrap_err();
        assert!(err.to_string().contains("not a GUID"));
    }
}
