//! armctl
//!
//! Azure Resource Manager helpers: a typed resource ID codec, the App Service
//! plan SKU catalog, and adapters for Service Bus, Purview and App Service.

pub mod azure;
pub mod config;
pub mod resource;
pub mod services;
pub mod state;

/// Version injected at compile time via ARMCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ARMCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};
