//! Resource identity and classification
//!
//! Pure building blocks shared by every adapter. Nothing in this module
//! performs I/O.
//!
//! # Architecture
//!
//! - [`id`] - Parses and formats ARM resource IDs for each supported shape
//! - [`compat`] - Chooses between a composite ID and deprecated discrete fields
//! - [`sku`] - Classifies App Service plan SKUs from embedded JSON tables
//!
//! # Example
//!
//! ```ignore
//! use armctl::resource::{PlanCatalog, TopicId};
//!
//! let topic: TopicId = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ServiceBus/namespaces/ns/topics/t".parse()?;
//! let category = PlanCatalog::builtin().classify("EP1");
//! ```

pub mod compat;
pub mod id;
pub mod sku;

pub use compat::{resolve_id, DiscreteFields, IdSource};
pub use id::*;
pub use sku::{supports_scale_out, PlanCapabilities, PlanCatalog, PlanCategory, SkuRule};
