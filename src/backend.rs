//! Backend client.
//!
//! Talks to an OpenAI-compatible inference server: `GET /models` for the
//! inventory and `POST /chat/completions` for capability probes.

use crate::error::{ProvisionError, ProvisionResult};
use crate::http::{join_url, read_success};
use crate::secrets::redact;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// 1x1 transparent PNG used by the vision probe.
const PROBE_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z/C/HgAGgwJ/lK3Q6wAAAABJRU5ErkJggg==";

/// Operations the provisioner needs from an inference backend.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Lists the model ids the backend serves.
    async fn list_models(&self, base_url: &str, api_key: &str) -> ProvisionResult<Vec<String>>;

    /// Returns true if the model answers a tool-eliciting prompt with a tool call.
    /// Any failure is reported as `false`.
    async fn supports_tool_use(&self, base_url: &str, api_key: &str, model_id: &str) -> bool;

    /// Returns true if the model accepts an inline image.
    /// Any failure is reported as `false`.
    async fn supports_vision(&self, base_url: &str, api_key: &str, model_id: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelListEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelListEntry {
    id: String,
}

/// reqwest-backed [`BackendApi`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    verbose: bool,
}

impl BackendClient {
    pub fn new(client: Client, verbose: bool) -> Self {
        Self { client, verbose }
    }

    async fn post_completion(
        &self,
        base_url: &str,
        api_key: &str,
        payload: &Value,
    ) -> ProvisionResult<String> {
        let url = join_url(base_url, "chat/completions");
        if self.verbose {
            debug!(
                "Probing: URL={}, Method=POST, Authorization=Bearer {}, Payload={}",
                url,
                redact(api_key),
                payload
            );
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await?;

        read_success(response, self.verbose).await
    }
}

/// Returns true if the first choice of a completion carries tool calls.
fn has_tool_calls(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    match value.pointer("/choices/0/message/tool_calls") {
        None | Some(Value::Null) => false,
        Some(Value::Array(calls)) => !calls.is_empty(),
        Some(_) => true,
    }
}

fn tool_use_probe(model_id: &str) -> Value {
    json!({
        "model": model_id,
        "messages": [
            {"role": "user", "content": "What is the weather?"}
        ],
        "tools": [{
            "type": "function",
            "function": {
                "name": "get_weather",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "location": {"type": "string"}
                    }
                }
            }
        }]
    })
}

fn vision_probe(model_id: &str) -> Value {
    json!({
        "model": model_id,
        "messages": [{
            "role": "user",
            "content": [
                {"type": "text", "text": "Describe this image"},
                {"type": "image_url", "image_url": {"url": PROBE_IMAGE}}
            ]
        }]
    })
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn list_models(&self, base_url: &str, api_key: &str) -> ProvisionResult<Vec<String>> {
        let url = join_url(base_url, "models");
        if self.verbose {
            debug!(
                "Fetching models: URL={}, Method=GET, Authorization=Bearer {}",
                url,
                redact(api_key)
            );
        }

        let response = self.client.get(&url).bearer_auth(api_key).send().await?;
        let body = read_success(response, self.verbose).await?;

        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| ProvisionError::Decode(format!("model list from {url}: {e}")))?;
        let models: Vec<String> = list.data.into_iter().map(|m| m.id).collect();

        debug!("Fetched {} models from {}", models.len(), base_url);
        Ok(models)
    }

    async fn supports_tool_use(&self, base_url: &str, api_key: &str, model_id: &str) -> bool {
        match self
            .post_completion(base_url, api_key, &tool_use_probe(model_id))
            .await
        {
            Ok(body) => has_tool_calls(&body),
            Err(e) => {
                debug!("Tool-use probe for {} failed: {}", model_id, e);
                false
            }
        }
    }

    async fn supports_vision(&self, base_url: &str, api_key: &str, model_id: &str) -> bool {
        match self
            .post_completion(base_url, api_key, &vision_probe(model_id))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("Vision probe for {} failed: {}", model_id, e);
                false
            }
        }
    }
}
