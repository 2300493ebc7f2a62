//! Shared test helpers: in-memory gateway and backends.

#![allow(dead_code)]

use async_trait::async_trait;
use model_provisioner::gateway::{RegisteredInfo, RegisteredParams};
use model_provisioner::{
    BackendApi, BackendConfig, GatewayApi, NewModel, ProvisionError, ProvisionResult,
    RegisteredModel,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const URL_X: &str = "http://backend-x:8000/v1";
pub const URL_Y: &str = "http://backend-y:8000/v1";

/// Builds a gateway registration.
pub fn registered(model: &str, api_base: &str, id: &str) -> RegisteredModel {
    RegisteredModel {
        model_name: model.to_string(),
        litellm_params: RegisteredParams {
            model: Some(format!("openai/{model}")),
            api_base: Some(api_base.to_string()),
        },
        model_info: Some(RegisteredInfo {
            id: Some(id.to_string()),
            capabilities: Default::default(),
        }),
    }
}

/// Builds a backend configuration with no filter or overrides.
pub fn backend(name: &str, url: &str) -> BackendConfig {
    BackendConfig {
        name: name.to_string(),
        url: url.to_string(),
        ..Default::default()
    }
}

/// In-memory gateway. Additions become registrations with fresh ids.
#[derive(Default)]
pub struct FakeGateway {
    pub models: Mutex<Vec<RegisteredModel>>,
    pub added: Mutex<Vec<NewModel>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_adds: HashSet<String>,
    pub fail_deletes: HashSet<String>,
    pub fail_list: bool,
    pub next_id: AtomicUsize,
}

impl FakeGateway {
    pub fn with_models(models: Vec<RegisteredModel>) -> Self {
        Self {
            models: Mutex::new(models),
            next_id: AtomicUsize::new(1000),
            ..Default::default()
        }
    }

    pub fn added_names(&self) -> Vec<String> {
        self.added
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.model_name.clone())
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.added.lock().unwrap().clear();
        self.deleted.lock().unwrap().clear();
    }
}

#[async_trait]
impl GatewayApi for FakeGateway {
    async fn list_models(&self) -> ProvisionResult<Vec<RegisteredModel>> {
        if self.fail_list {
            return Err(ProvisionError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.models.lock().unwrap().clone())
    }

    async fn add_model(&self, model: &NewModel) -> ProvisionResult<()> {
        self.added.lock().unwrap().push(model.clone());
        if self.fail_adds.contains(&model.model_name) {
            return Err(ProvisionError::Status {
                status: 500,
                body: "add failed".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.models.lock().unwrap().push(RegisteredModel {
            model_name: model.model_name.clone(),
            litellm_params: RegisteredParams {
                model: Some(model.litellm_params.model.clone()),
                api_base: Some(model.litellm_params.api_base.clone()),
            },
            model_info: Some(RegisteredInfo {
                id: Some(id),
                capabilities: model.model_info.clone(),
            }),
        });
        Ok(())
    }

    async fn delete_model(&self, id: &str) -> ProvisionResult<()> {
        self.deleted.lock().unwrap().push(id.to_string());
        if self.fail_deletes.contains(id) {
            return Err(ProvisionError::Network("connection reset".to_string()));
        }
        self.models.lock().unwrap().retain(|m| m.id() != Some(id));
        Ok(())
    }
}

/// In-memory backends keyed by URL. URLs without an inventory fail.
#[derive(Default)]
pub struct FakeBackends {
    pub inventories: HashMap<String, Vec<String>>,
    pub tool_use: HashSet<String>,
    pub vision: HashSet<String>,
    pub keys_seen: Mutex<Vec<(String, String)>>,
    pub tool_probes: AtomicUsize,
    pub vision_probes: AtomicUsize,
}

impl FakeBackends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serving(mut self, url: &str, models: &[&str]) -> Self {
        self.inventories
            .insert(url.to_string(), models.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn probes(&self) -> usize {
        self.tool_probes.load(Ordering::SeqCst) + self.vision_probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendApi for FakeBackends {
    async fn list_models(&self, base_url: &str, api_key: &str) -> ProvisionResult<Vec<String>> {
        self.keys_seen
            .lock()
            .unwrap()
            .push((base_url.to_string(), api_key.to_string()));
        self.inventories
            .get(base_url)
            .cloned()
            .ok_or_else(|| ProvisionError::Network(format!("connection refused: {base_url}")))
    }

    async fn supports_tool_use(&self, _base_url: &str, _api_key: &str, model_id: &str) -> bool {
        self.tool_probes.fetch_add(1, Ordering::SeqCst);
        self.tool_use.contains(model_id)
    }

    async fn supports_vision(&self, _base_url: &str, _api_key: &str, model_id: &str) -> bool {
        self.vision_probes.fetch_add(1, Ordering::SeqCst);
        self.vision.contains(model_id)
    }
}
