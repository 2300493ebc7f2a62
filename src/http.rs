//! Shared HTTP plumbing for the backend and gateway clients.

use crate::error::{ProvisionError, ProvisionResult};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Builds the HTTP client shared by every outbound call in a process.
pub fn http_client(timeout: Duration) -> ProvisionResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProvisionError::Network(format!("failed to create HTTP client: {e}")))
}

/// Joins a base URL and an API path with exactly one `/`.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Reads the body of `response`, failing on any non-2xx status.
pub(crate) async fn read_success(response: Response, verbose: bool) -> ProvisionResult<String> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| ProvisionError::Network(format!("failed to read body from {url}: {e}")))?;

    if verbose {
        debug!("Response from {}: status={}, body={}", url, status.as_u16(), body);
    }

    if !status.is_success() {
        return Err(ProvisionError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}
