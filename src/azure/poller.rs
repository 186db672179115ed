//! Long-running operation polling
//!
//! ARM answers slow PUT/DELETE calls with 201/202 and either an
//! `Azure-AsyncOperation` status URL or a `Location` URL. Both are polled
//! until they reach a terminal state.

use super::client::ArmClient;
use super::error::ArmError;
use super::http::ArmResponse;
use std::time::Duration;

fn delay(client: &ArmClient, response: &ArmResponse) -> Duration {
    response.retry_after.unwrap_or_else(|| client.poll_interval())
}

/// Wait until the operation behind `response` completes
///
/// Responses that are not long-running are returned as-is. Callers bound the
/// overall wait with their operation timeout.
pub async fn wait_for_completion(
    client: &ArmClient,
    response: ArmResponse,
) -> Result<ArmResponse, ArmError> {
    if !response.is_long_running() {
        return Ok(response);
    }

    if let Some(operation_url) = response.async_operation.clone() {
        let mut wait = delay(client, &response);
        loop {
            tokio::time::sleep(wait).await;
            let status = client.get(&operation_url).await?;
            let state = status
                .body
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("InProgress")
                .to_string();
            tracing::debug!("operation {} is {}", operation_url, state);

            match state.as_str() {
                "Succeeded" => return Ok(status),
                "Failed" | "Canceled" => {
                    let message = status
                        .body
                        .get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("-")
                        .to_string();
                    return Err(ArmError::OperationFailed {
                        status: state,
                        message,
                    });
                }
                _ => wait = delay(client, &status),
            }
        }
    }

    let Some(location) = response.location.clone() else {
        return Ok(response);
    };

    let mut wait = delay(client, &response);
    loop {
        tokio::time::sleep(wait).await;
        let status = client.get(&location).await?;
        tracing::debug!("operation {} returned {}", location, status.status);
        if status.status != 202 {
            return Ok(status);
        }
        wait = delay(client, &status);
    }
}
