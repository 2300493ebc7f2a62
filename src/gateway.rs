//! Gateway management client.
//!
//! Wraps the three LiteLLM management endpoints the provisioner uses:
//! `GET /model/info`, `POST /model/new` and `POST /model/delete`.

use crate::capabilities::CapabilityMap;
use crate::error::{ProvisionError, ProvisionResult};
use crate::http::{join_url, read_success};
use crate::secrets::redact;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix that routes a registered model through the gateway's
/// OpenAI-compatible provider.
pub const PROVIDER_PREFIX: &str = "openai/";

/// Unique identity of a model registration: `(model name, owning URL)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelKey {
    pub model_name: String,
    pub api_base: String,
}

impl ModelKey {
    pub fn new(model_name: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            api_base: api_base.into(),
        }
    }
}

impl std::fmt::Display for ModelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} from {}", self.model_name, self.api_base)
    }
}

/// Provider parameters sent when registering a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewModelParams {
    pub model: String,
    pub api_base: String,
    pub api_key: String,
}

/// Body of `POST /model/new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewModel {
    pub model_name: String,
    pub litellm_params: NewModelParams,
    pub model_info: CapabilityMap,
}

/// Provider parameters as reported by `GET /model/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredParams {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Gateway-side metadata of a registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredInfo {
    #[serde(default)]
    pub id: Option<String>,
    /// Everything else the gateway reports, including capabilities.
    #[serde(flatten)]
    pub capabilities: CapabilityMap,
}

/// One entry of `GET /model/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub model_name: String,
    #[serde(default)]
    pub litellm_params: RegisteredParams,
    #[serde(default)]
    pub model_info: Option<RegisteredInfo>,
}

impl RegisteredModel {
    /// Owning backend URL, if the gateway recorded one.
    pub fn api_base(&self) -> Option<&str> {
        self.litellm_params.api_base.as_deref()
    }

    /// Gateway-assigned identifier.
    pub fn id(&self) -> Option<&str> {
        self.model_info.as_ref().and_then(|info| info.id.as_deref())
    }

    /// Identity key; `None` for entries without an owning URL.
    pub fn key(&self) -> Option<ModelKey> {
        self.api_base()
            .map(|base| ModelKey::new(self.model_name.clone(), base))
    }
}

#[derive(Debug, Deserialize)]
struct ModelInfoResponse {
    #[serde(default)]
    data: Vec<RegisteredModel>,
}

#[derive(Debug, Serialize)]
struct DeleteModel<'a> {
    id: &'a str,
}

/// Operations the provisioner needs from the gateway.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Lists every registration the gateway knows about.
    async fn list_models(&self) -> ProvisionResult<Vec<RegisteredModel>>;

    /// Registers a model.
    async fn add_model(&self, model: &NewModel) -> ProvisionResult<()>;

    /// Deletes a registration by its gateway-assigned id.
    async fn delete_model(&self, id: &str) -> ProvisionResult<()>;
}

/// reqwest-backed [`GatewayApi`] bound to one gateway URL and key.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    api_key: String,
    verbose: bool,
}

impl GatewayClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        verbose: bool,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            verbose,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: Serialize + Sync>(&self, path: &str, payload: &T) -> ProvisionResult<String> {
        let url = join_url(&self.base_url, path);
        if self.verbose {
            debug!(
                "Calling gateway: URL={}, Method=POST, Authorization=Bearer {}, Payload={}",
                url,
                redact(&self.api_key),
                redacted_payload(payload)
            );
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        read_success(response, self.verbose).await
    }
}

/// Serializes a payload for logging with any `api_key` field masked.
fn redacted_payload<T: Serialize>(payload: &T) -> String {
    let mut value = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(e) => return format!("<unserializable: {e}>"),
    };
    if let Some(key) = value.pointer_mut("/litellm_params/api_key") {
        if let Some(masked) = key.as_str().map(redact) {
            *key = serde_json::Value::String(masked);
        }
    }
    value.to_string()
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn list_models(&self) -> ProvisionResult<Vec<RegisteredModel>> {
        let url = join_url(&self.base_url, "model/info");
        if self.verbose {
            debug!(
                "Fetching current models: URL={}, Method=GET, Authorization=Bearer {}",
                url,
                redact(&self.api_key)
            );
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = read_success(response, self.verbose).await?;

        let info: ModelInfoResponse = serde_json::from_str(&body)
            .map_err(|e| ProvisionError::Decode(format!("model info from {url}: {e}")))?;

        for model in &info.data {
            debug!(
                "Current model: {} from {}",
                model.model_name,
                model.api_base().unwrap_or("<none>")
            );
        }
        Ok(info.data)
    }

    async fn add_model(&self, model: &NewModel) -> ProvisionResult<()> {
        self.post_json("model/new", model).await?;
        debug!("Gateway accepted model {}", model.model_name);
        Ok(())
    }

    async fn delete_model(&self, id: &str) -> ProvisionResult<()> {
        self.post_json("model/delete", &DeleteModel { id }).await?;
        debug!("Gateway removed model with ID {}", id);
        Ok(())
    }
}
