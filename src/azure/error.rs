//! ARM error types

use crate::resource::MalformedIdentifierError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to Azure Resource Manager
#[derive(Error, Debug)]
pub enum ArmError {
    #[error("API request failed: {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse response JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("long-running operation finished with status {status:?}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    MalformedId(#[from] MalformedIdentifierError),
}

impl ArmError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Whether an error chain bottoms out in an ARM 404
pub fn was_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|e| e.downcast_ref::<ArmError>())
        .any(ArmError::is_not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn api(status: u16) -> ArmError {
        ArmError::Api {
            status,
            code: "ResourceNotFound".to_string(),
            message: "gone".to_string(),
        }
    }

    #[test]
    fn test_not_found_detection() {
        assert!(api(404).is_not_found());
        assert!(!api(409).is_not_found());
        assert!(!ArmError::Timeout(Duration::from_secs(1)).is_not_found());
    }

    #[test]
    fn test_not_found_through_context() {
        let err = Err::<(), _>(api(404))
            .context("retrieving account")
            .unwrap_err();
        assert!(was_not_found(&err));

        let err = Err::<(), _>(api(500)).context("retrieving").unwrap_err();
        assert!(!was_not_found(&err));
    }
}
