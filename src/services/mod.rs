//! Service adapters
//!
//! Each adapter maps a [`ResourceData`](crate::state::ResourceData) record
//! onto ARM calls for one Azure resource type.
//!
//! - [`appservice`] - OS type and plan SKU lookup for apps and slots
//! - [`policy`] - Policy enumerations
//! - [`purview`] - Purview account resource (create/read/update/delete)
//! - [`servicebus`] - Service Bus subscription data source

pub mod appservice;
pub mod policy;
pub mod purview;
pub mod servicebus;

use crate::azure::ArmError;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Per-operation time limits of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const fn minutes(create: u64, read: u64, update: u64, delete: u64) -> Self {
        Self {
            create: Duration::from_secs(create * 60),
            read: Duration::from_secs(read * 60),
            update: Duration::from_secs(update * 60),
            delete: Duration::from_secs(delete * 60),
        }
    }

    /// The same limit for every operation
    pub const fn uniform(limit: Duration) -> Self {
        Self {
            create: limit,
            read: limit,
            update: limit,
            delete: limit,
        }
    }
}

/// Run an adapter operation under a time limit
pub async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(ArmError::Timeout(limit).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout(Duration::from_secs(1), async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let err = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArmError>(),
            Some(ArmError::Timeout(_))
        ));
    }

    #[test]
    fn test_timeouts_minutes() {
        let t = Timeouts::minutes(30, 5, 30, 30);
        assert_eq!(t.read, Duration::from_secs(300));
        assert_eq!(t.create, Duration::from_secs(1800));
    }
}
