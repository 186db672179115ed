//! Azure Resource Manager interaction module
//!
//! This module provides the core functionality for talking to the ARM
//! control plane, including authentication, HTTP handling, and polling of
//! long-running operations.
//!
//! # Module Structure
//!
//! - [`auth`] - Token acquisition and caching (static token, client secret, Azure CLI)
//! - [`client`] - Main ARM client: URL building and authenticated requests
//! - [`error`] - Typed ARM errors
//! - [`http`] - HTTP utilities for REST calls
//! - [`poller`] - Long-running operation polling
//!
//! # Example
//!
//! ```ignore
//! use armctl::azure::{auth::ArmCredentials, client::{ArmClient, DEFAULT_ENDPOINT}};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let credentials = ArmCredentials::from_env(None, None, DEFAULT_AUTHORITY_HOST, DEFAULT_ENDPOINT);
//!     let client = ArmClient::new("00000000-0000-0000-0000-000000000000", DEFAULT_ENDPOINT, credentials)?;
//!     let url = client.resource_url("/subscriptions/.../accounts/a", "2020-12-01-preview")?;
//!     let account = client.get(&url).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod poller;

pub use client::ArmClient;
pub use error::{was_not_found, ArmError};
