//! App Service plan lookups
//!
//! Resolves the OS type and plan SKU behind an app or deployment slot by
//! following its `serverFarmId`.

use crate::azure::ArmClient;
use crate::resource::{AppServiceId, AppServicePlanId, AppServiceSlotId, PlanCatalog};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const API_VERSION: &str = "2023-12-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Linux,
    Windows,
}

impl OsType {
    /// OS of a plan from its `kind`, e.g. "functionapp,linux"
    pub fn from_kind(kind: &str) -> Self {
        if kind.to_lowercase().contains("linux") {
            Self::Linux
        } else {
            Self::Windows
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS type and SKU of the plan hosting an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePlanInfo {
    pub os_type: OsType,
    /// Empty when the plan reports no SKU
    pub sku: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteProperties {
    server_farm_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Site {
    properties: Option<SiteProperties>,
}

#[derive(Debug, Default, Deserialize)]
struct PlanSku {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Plan {
    kind: Option<String>,
    sku: Option<PlanSku>,
}

/// Plan info for the app behind `id`
pub async fn service_plan_info_for_app(
    client: &ArmClient,
    id: &AppServiceId,
) -> Result<ServicePlanInfo> {
    plan_info(client, &id.id(), &id.to_string()).await
}

/// Plan info for the deployment slot behind `id`
pub async fn service_plan_info_for_app_slot(
    client: &ArmClient,
    id: &AppServiceSlotId,
) -> Result<ServicePlanInfo> {
    plan_info(client, &id.id(), &id.to_string()).await
}

async fn plan_info(client: &ArmClient, site_id: &str, label: &str) -> Result<ServicePlanInfo> {
    let site: Site = client
        .get_resource(site_id, API_VERSION)
        .await
        .with_context(|| format!("retrieving {}", label))?;

    let Some(properties) = site.properties else {
        bail!("retrieving {}: the response had no properties", label);
    };
    let server_farm_id = properties
        .server_farm_id
        .ok_or_else(|| anyhow!("determining Service Plan ID for {}", label))?;
    let plan_id = AppServicePlanId::parse(&server_farm_id)?;
    tracing::debug!("{} is hosted on {}", label, plan_id);

    let plan: Plan = client
        .get_resource(&plan_id.id(), API_VERSION)
        .await
        .with_context(|| format!("retrieving Service Plan for {}", label))?;
    let kind = plan
        .kind
        .ok_or_else(|| anyhow!("retrieving Service Plan for {}: the plan has no kind", label))?;

    Ok(ServicePlanInfo {
        os_type: OsType::from_kind(&kind),
        sku: plan.sku.and_then(|s| s.name).unwrap_or_default(),
    })
}

/// Reject plan codes the catalog does not know
pub fn validate_plan_sku(catalog: &PlanCatalog, code: &str) -> Result<()> {
    if !catalog.is_known(code) {
        bail!(
            "expected a Service Plan SKU to be one of [{}], got {:?}",
            catalog.all_known_skus().join(", "),
            code
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_type_from_kind() {
        assert_eq!(OsType::from_kind("functionapp,linux"), OsType::Linux);
        assert_eq!(OsType::from_kind("Linux"), OsType::Linux);
        assert_eq!(OsType::from_kind("app"), OsType::Windows);
        assert_eq!(OsType::from_kind(""), OsType::Windows);
        assert_eq!(OsType::Linux.to_string(), "linux");
    }

    #[test]
    fn test_validate_plan_sku() {
        let catalog = PlanCatalog::builtin();
        assert!(validate_plan_sku(catalog, "P1v3").is_ok());
        assert!(validate_plan_sku(catalog, "y1").is_ok());
        let err = validate_plan_sku(catalog, "Z9").unwrap_err();
        assert!(err.to_string().contains("got \"Z9\""));
    }

    #[test]
    fn test_plan_sku_defaults_to_empty() {
        let plan: Plan = serde_json::from_str(r#"{"kind": "app"}"#).unwrap();
        assert_eq!(plan.sku.and_then(|s| s.name).unwrap_or_default(), "");
    }
}
