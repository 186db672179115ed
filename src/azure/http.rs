//! HTTP utilities for ARM REST calls

use super::error::ArmError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A decoded ARM response
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: u16,
    pub body: Value,
    /// `Azure-AsyncOperation` header of a long-running operation
    pub async_operation: Option<String>,
    /// `Location` header of a long-running operation
    pub location: Option<String>,
    pub retry_after: Option<Duration>,
}

impl ArmResponse {
    fn from_parts(status: u16, headers: &HeaderMap, body: Value) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };

        Self {
            status,
            body,
            async_operation: header(ASYNC_OPERATION_HEADER),
            location: header("location"),
            retry_after: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        }
    }

    /// Whether the server accepted the request as a long-running operation
    pub fn is_long_running(&self) -> bool {
        matches!(self.status, 201 | 202)
            && (self.async_operation.is_some() || self.location.is_some())
    }
}

/// Pull `{ "error": { "code", "message" } }` out of an ARM error body
fn parse_error_envelope(body: &str) -> (String, String) {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let field = |name: &str| {
        error
            .and_then(|e| e.get(name))
            .and_then(|v| v.as_str())
            .unwrap_or("-")
            .to_string()
    };
    (field("code"), field("message"))
}

/// HTTP client wrapper for ARM calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    pub fn new() -> Result<Self, ArmError> {
        let client = Client::builder()
            .user_agent(format!("armctl/{}", crate::VERSION))
            .build()?;

        Ok(Self { client })
    }

    /// Send a request and decode the JSON response
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<ArmResponse, ArmError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("{} {} [{}]", method, url, request_id);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID_HEADER, &request_id);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            let (code, message) = parse_error_envelope(&text);
            return Err(ArmError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        // Handle empty response
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(ArmResponse::from_parts(status.as_u16(), &headers, body))
    }

    pub async fn get(&self, url: &str, token: &str) -> Result<ArmResponse, ArmError> {
        self.send(Method::GET, url, token, None).await
    }

    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<ArmResponse, ArmError> {
        self.send(Method::PUT, url, token, Some(body)).await
    }

    pub async fn post(
        &self,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<ArmResponse, ArmError> {
        self.send(Method::POST, url, token, body).await
    }

    pub async fn delete(&self, url: &str, token: &str) -> Result<ArmResponse, ArmError> {
        self.send(Method::DELETE, url, token, None).await
    }
}

/// Format an ARM error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_arm_error(error: &anyhow::Error) -> String {
    let arm = error.chain().find_map(|e| e.downcast_ref::<ArmError>());

    match arm.and_then(ArmError::status) {
        Some(401) => {
            return "Authentication failed. Run 'az login' or set ARM_CLIENT_SECRET.".to_string()
        }
        Some(403) => return "Permission denied. Check your Azure RBAC role assignments.".to_string(),
        Some(404) => return "Resource not found.".to_string(),
        Some(409) => {
            return "Resource conflict. The resource may already exist or be in use.".to_string()
        }
        Some(429) => return "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => return "Invalid request. Check your parameters.".to_string(),
        Some(500) | Some(502) | Some(503) => {
            return "Azure service temporarily unavailable. Please try again.".to_string()
        }
        _ => {}
    }

    // Truncate long error messages and remove potential sensitive data
    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(160)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
