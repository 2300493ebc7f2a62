//! Inventory collection.
//!
//! Turns the configured backends into candidate registrations and records
//! which backend URLs the reconciler may compare against the gateway.
//!
//! A backend whose patterns fail to compile or whose inventory cannot be
//! fetched is *suspended* for the cycle: it contributes no candidates and
//! its existing registrations are hidden from the diff.

use crate::backend::BackendApi;
use crate::capabilities::CapabilityMap;
use crate::config::BackendConfig;
use crate::gateway::{ModelKey, NewModel, NewModelParams, PROVIDER_PREFIX};
use crate::secrets::SecretStore;
use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// A model registration that should exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub model_name: String,
    /// Owning backend URL, verbatim from configuration.
    pub api_base: String,
    pub api_key: String,
    pub capabilities: CapabilityMap,
    /// Whether the owning backend has discovery enabled.
    pub discovery: bool,
}

impl Candidate {
    pub fn key(&self) -> ModelKey {
        ModelKey::new(self.model_name.clone(), self.api_base.clone())
    }

    /// Builds the gateway payload for this candidate.
    pub fn to_new_model(&self) -> NewModel {
        NewModel {
            model_name: self.model_name.clone(),
            litellm_params: NewModelParams {
                model: format!("{PROVIDER_PREFIX}{}", self.model_name),
                api_base: self.api_base.clone(),
                api_key: self.api_key.clone(),
            },
            model_info: self.capabilities.clone(),
        }
    }
}

/// Backend URLs the reconciler is allowed to touch this cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    configured: BTreeSet<String>,
    suspended: BTreeSet<String>,
}

impl Scope {
    /// Marks a URL as configured.
    pub fn configure(&mut self, url: impl Into<String>) {
        self.configured.insert(url.into());
    }

    /// Hides a configured URL from this cycle's diff.
    pub fn suspend(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.configured.insert(url.clone());
        self.suspended.insert(url);
    }

    /// Returns true if the URL belongs to a configured backend.
    pub fn is_configured(&self, url: &str) -> bool {
        self.configured.contains(url)
    }

    /// Returns true if the URL is configured and not suspended.
    pub fn is_comparable(&self, url: &str) -> bool {
        self.is_configured(url) && !self.suspended.contains(url)
    }

    /// Suspended URLs.
    pub fn suspended(&self) -> impl Iterator<Item = &str> {
        self.suspended.iter().map(String::as_str)
    }
}

/// The desired state computed from all backends.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub candidates: Vec<Candidate>,
    pub scope: Scope,
}

enum BackendOutcome {
    Collected(Vec<Candidate>),
    Suspended,
}

/// Collects candidates from every configured backend.
pub struct InventoryCollector<'a, B: BackendApi + ?Sized> {
    api: &'a B,
    secrets: &'a SecretStore,
}

impl<'a, B: BackendApi + ?Sized> InventoryCollector<'a, B> {
    pub fn new(api: &'a B, secrets: &'a SecretStore) -> Self {
        Self { api, secrets }
    }

    /// Fetches every backend concurrently. One backend failing never
    /// affects the others.
    pub async fn collect(&self, backends: &[BackendConfig]) -> Inventory {
        let outcomes = join_all(backends.iter().map(|b| self.collect_backend(b))).await;

        let mut inventory = Inventory::default();
        for (backend, outcome) in backends.iter().zip(outcomes) {
            match outcome {
                BackendOutcome::Collected(candidates) => {
                    inventory.scope.configure(backend.url.clone());
                    inventory.candidates.extend(candidates);
                }
                BackendOutcome::Suspended => inventory.scope.suspend(backend.url.clone()),
            }
        }
        inventory
    }

    async fn collect_backend(&self, config: &BackendConfig) -> BackendOutcome {
        let backend = match config.compile() {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Skipping backend {}: {}", config.name, e);
                return BackendOutcome::Suspended;
            }
        };

        let api_key = self.secrets.backend_key(&backend.name);

        let models = match self.api.list_models(&backend.url, &api_key).await {
            Ok(models) => models,
            Err(e) => {
                warn!("Error getting models from {}: {}", backend.name, e);
                return BackendOutcome::Suspended;
            }
        };

        let total = models.len();
        let candidates: Vec<Candidate> = models
            .into_iter()
            .filter(|model| backend.accepts(model))
            .map(|model| Candidate {
                capabilities: backend.policy.resolve_static(&model),
                model_name: model,
                api_base: backend.url.clone(),
                api_key: api_key.clone(),
                discovery: backend.policy.discovery,
            })
            .collect();

        debug!(
            "Backend {}: {} of {} models selected",
            backend.name,
            candidates.len(),
            total
        );
        BackendOutcome::Collected(candidates)
    }
}
