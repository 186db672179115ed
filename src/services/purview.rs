//! Purview Account resource

use super::{with_timeout, Timeouts};
use crate::azure::poller::wait_for_completion;
use crate::azure::ArmClient;
use crate::resource::PurviewAccountId;
use crate::state::ResourceData;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const API_VERSION: &str = "2020-12-01-preview";

pub const TIMEOUTS: Timeouts = Timeouts::minutes(30, 5, 30, 30);

pub const SKU_NAMES: [&str; 2] = ["Standard_4", "Standard_16"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<AccountSku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<AccountProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSku {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "type", default)]
    pub identity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_network_access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Endpoints>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Endpoints {
    pub catalog: Option<String>,
    pub guardian: Option<String>,
    pub scan: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeys {
    pub atlas_kafka_primary_endpoint: Option<String>,
    pub atlas_kafka_secondary_endpoint: Option<String>,
}

// =============================================================================
// Validation and flattening
// =============================================================================

/// Validate a Purview account name
pub fn validate_account_name(name: &str) -> Result<()> {
    let edges_alnum = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_chars = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if name.len() < 3 || name.len() > 63 || !edges_alnum || !valid_chars {
        bail!(
            "account name {:?} must be 3-63 characters of letters, digits and hyphens, starting and ending with a letter or digit",
            name
        );
    }
    Ok(())
}

pub fn validate_sku_name(sku_name: &str) -> Result<()> {
    if !SKU_NAMES.contains(&sku_name) {
        bail!(
            "expected `sku_name` to be one of [{}], got {:?}",
            SKU_NAMES.join(", "),
            sku_name
        );
    }
    Ok(())
}

/// Split `Standard_4` into name and capacity; `None` for an empty or unsplittable code
pub fn expand_sku(sku_name: &str) -> Option<AccountSku> {
    let (name, capacity) = sku_name.rsplit_once('_')?;
    let capacity = capacity.parse().ok()?;
    Some(AccountSku {
        name: name.to_string(),
        capacity: Some(capacity),
    })
}

pub fn flatten_sku(sku: Option<&AccountSku>) -> String {
    match sku {
        Some(AccountSku {
            name,
            capacity: Some(capacity),
        }) => format!("{}_{}", name, capacity),
        _ => String::new(),
    }
}

pub fn flatten_identity(identity: Option<&Identity>) -> Vec<Value> {
    match identity {
        Some(identity) if identity.identity_type != "None" => vec![json!({
            "type": identity.identity_type,
            "principal_id": identity.principal_id.clone().unwrap_or_default(),
            "tenant_id": identity.tenant_id.clone().unwrap_or_default(),
        })],
        _ => Vec::new(),
    }
}

/// Location in ARM's short form, e.g. "West Europe" -> "westeurope"
pub fn normalize_location(location: &str) -> String {
    location.replace(' ', "").to_lowercase()
}

/// Reject a location change on an account that already exists
pub fn check_location_unchanged(stored: &ResourceData, location: &str) -> Result<()> {
    let current = stored.get_str("location");
    if stored.id().is_empty() || current.is_empty() {
        return Ok(());
    }
    if normalize_location(current) != normalize_location(location) {
        bail!(
            "{} is in {:?} and cannot be moved to {:?} - delete it and create the new account instead",
            stored.id(),
            current,
            location
        );
    }
    Ok(())
}

/// Validate an ID given to import and build the record to read into
pub fn import(id: &str) -> Result<ResourceData> {
    let id = PurviewAccountId::parse(id)?;
    Ok(ResourceData::with_id(id.id()))
}

fn account_body(data: &ResourceData) -> Account {
    let public_network_access = if data.get_bool_or("public_network_enabled", true) {
        "Enabled"
    } else {
        "Disabled"
    };

    Account {
        location: Some(normalize_location(data.get_str("location"))),
        sku: expand_sku(data.get_str("sku_name")),
        identity: Some(Identity {
            identity_type: "SystemAssigned".to_string(),
            ..Identity::default()
        }),
        properties: Some(AccountProperties {
            public_network_access: Some(public_network_access.to_string()),
            endpoints: None,
        }),
        tags: Some(data.get_string_map("tags")),
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Create or update the account described by `data`, then read it back
pub async fn create_update(client: &ArmClient, data: &mut ResourceData) -> Result<()> {
    let limit = if data.is_new_resource() {
        TIMEOUTS.create
    } else {
        TIMEOUTS.update
    };
    with_timeout(limit, create_update_inner(client, data)).await
}

async fn create_update_inner(client: &ArmClient, data: &mut ResourceData) -> Result<()> {
    let name = data.get_str("name").to_string();
    validate_account_name(&name)?;
    validate_sku_name(data.get_str("sku_name"))?;

    let id = PurviewAccountId::new(
        client.subscription_id.clone(),
        data.get_str("resource_group_name"),
        [name],
    )?;
    let url = client.resource_url(&id.id(), API_VERSION)?;

    // name and resource_group_name force a new account
    if !data.is_new_resource() {
        let current = PurviewAccountId::parse(data.id())?;
        if current != id {
            bail!(
                "{} cannot be renamed or moved to {} - delete it and create the new account instead",
                current,
                id
            );
        }
    }

    if data.is_new_resource() {
        match client.get(&url).await {
            Ok(_) => bail!(
                "a resource with the ID {:?} already exists - to be managed it needs to be imported",
                id.id()
            ),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("checking for presence of existing {}", id)))
            }
        }
    }

    let body = serde_json::to_value(account_body(data))?;
    let response = client
        .put(&url, &body)
        .await
        .with_context(|| format!("creating/updating {}", id))?;
    wait_for_completion(client, response)
        .await
        .with_context(|| format!("waiting for create/update of {}", id))?;

    tracing::info!("created/updated {}", id);
    data.set_id(id.id());
    read_inner(client, data).await
}

/// Refresh `data` from the remote account
///
/// A missing account clears the ID rather than failing.
pub async fn read(client: &ArmClient, data: &mut ResourceData) -> Result<()> {
    with_timeout(TIMEOUTS.read, read_inner(client, data)).await
}

async fn read_inner(client: &ArmClient, data: &mut ResourceData) -> Result<()> {
    let id = PurviewAccountId::parse(data.id())?;

    let account: Account = match client.get_resource(&id.id(), API_VERSION).await {
        Ok(account) => account,
        Err(e) if e.is_not_found() => {
            tracing::warn!("{} was not found, removing from state", id);
            data.clear_id();
            return Ok(());
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("retrieving {}", id))),
    };

    data.set("name", id.name())?;
    data.set("resource_group_name", id.resource_group_name())?;
    data.set(
        "location",
        account.location.as_deref().map(normalize_location),
    )?;
    data.set("sku_name", flatten_sku(account.sku.as_ref()))?;
    data.set("identity", flatten_identity(account.identity.as_ref()))
        .context("flattening `identity`")?;

    if let Some(props) = &account.properties {
        data.set(
            "public_network_enabled",
            props.public_network_access.as_deref() == Some("Enabled"),
        )?;
        if let Some(endpoints) = &props.endpoints {
            data.set("catalog_endpoint", &endpoints.catalog)?;
            data.set("guardian_endpoint", &endpoints.guardian)?;
            data.set("scan_endpoint", &endpoints.scan)?;
        }
    }

    let keys_url = client.action_url(&id.id(), "listkeys", API_VERSION)?;
    let keys = client
        .post(&keys_url, None)
        .await
        .map_err(anyhow::Error::new)
        .and_then(|r| serde_json::from_value::<AccessKeys>(r.body).map_err(anyhow::Error::new))
        .with_context(|| format!("retrieving Keys for {}", id))?;
    data.set(
        "atlas_kafka_endpoint_primary_connection_string",
        &keys.atlas_kafka_primary_endpoint,
    )?;
    data.set(
        "atlas_kafka_endpoint_secondary_connection_string",
        &keys.atlas_kafka_secondary_endpoint,
    )?;

    data.set("tags", account.tags.unwrap_or_default())?;
    Ok(())
}

/// Delete the account and wait for the deletion to finish
pub async fn delete(client: &ArmClient, data: &ResourceData) -> Result<()> {
    with_timeout(TIMEOUTS.delete, delete_inner(client, data)).await
}

async fn delete_inner(client: &ArmClient, data: &ResourceData) -> Result<()> {
    let id = PurviewAccountId::parse(data.id())?;
    let url = client.resource_url(&id.id(), API_VERSION)?;

    let response = client
        .delete(&url)
        .await
        .with_context(|| format!("deleting {}", id))?;
    wait_for_completion(client, response)
        .await
        .with_context(|| format!("waiting for deletion of {}", id))?;

    tracing::info!("deleted {}", id);
    Ok(())
}
