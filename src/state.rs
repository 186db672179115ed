//! Local State
//!
//! The key-value record adapters read their inputs from and write their
//! results to, plus the JSON file the CLI keeps those records in.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STATE_VERSION: u32 = 1;

/// Attribute values of a single resource
///
/// Getters return the zero value for missing or mistyped attributes. An empty
/// ID means the resource does not exist remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(skip)]
    is_new: bool,
}

impl ResourceData {
    /// A record for a resource that is about to be created
    pub fn new_resource() -> Self {
        Self {
            is_new: true,
            ..Self::default()
        }
    }

    /// A record for an existing resource
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.is_new = false;
    }

    /// Mark the resource as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_new_resource(&self) -> bool {
        self.is_new
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> &str {
        self.get(key).and_then(|v| v.as_str()).unwrap_or_default()
    }

    /// String value, `None` when missing or empty
    pub fn get_opt_str(&self, key: &str) -> Option<String> {
        Some(self.get_str(key))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.as_i64()).unwrap_or(0)
    }

    /// String map value (e.g. tags); non-string entries are skipped
    pub fn get_string_map(&self, key: &str) -> BTreeMap<String, String> {
        self.get(key)
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set an attribute; `None` values are stored as null
    pub fn set(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("setting `{}`", key))?;
        self.attributes.insert(key.to_string(), value);
        Ok(())
    }
}

/// On-disk collection of resource records, keyed by address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceData>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Default location of the state file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("armctl").join("state.json"))
            .unwrap_or_else(|| PathBuf::from("armctl-state.json"))
    }

    /// Load from disk, returning an empty state if the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading state file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&ResourceData> {
        self.resources.get(address)
    }

    /// Store a record, dropping it when its ID has been cleared
    pub fn put(&mut self, address: &str, data: ResourceData) {
        if data.id().is_empty() {
            self.resources.remove(address);
        } else {
            self.resources.insert(address.to_string(), data);
        }
        self.updated_at = Utc::now();
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceData> {
        let removed = self.resources.remove(address);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }
}
