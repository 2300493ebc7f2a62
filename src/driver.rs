//! Cycle driver: one reconciliation pass, and the loop around it.
//!
//! Each cycle reloads configuration and credentials, fetches the gateway's
//! registrations, collects backend inventories, then applies the diff.
//! Failing to load configuration, the gateway credential or the gateway's
//! registrations abandons the cycle; everything later degrades per backend
//! or per entry. No state survives between cycles.

use crate::backend::{BackendApi, BackendClient};
use crate::config::{ProvisionerConfig, Settings};
use crate::error::ProvisionResult;
use crate::gateway::{GatewayApi, GatewayClient};
use crate::http::http_client;
use crate::inventory::InventoryCollector;
use crate::reconciler::{apply, plan, ApplyReport};
use crate::secrets::SecretStore;
use reqwest::Client;
use tracing::{debug, error, info};

/// Summary of one completed cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Candidates collected from all backends.
    pub candidates: usize,
    /// Registrations reported by the gateway, in scope or not.
    pub registered: usize,
    /// Backend URLs hidden from this cycle's diff.
    pub suspended: Vec<String>,
    pub apply: ApplyReport,
}

/// Runs one reconciliation pass against already-loaded collaborators.
pub async fn run_once<G, B>(
    config: &ProvisionerConfig,
    secrets: &SecretStore,
    gateway: &G,
    backends: &B,
) -> ProvisionResult<CycleReport>
where
    G: GatewayApi + ?Sized,
    B: BackendApi + ?Sized,
{
    let registered = gateway
        .list_models()
        .await
        .inspect_err(|e| error!("Error getting current models from gateway: {}", e))?;

    let inventory = InventoryCollector::new(backends, secrets)
        .collect(&config.backends)
        .await;

    let changes = plan(&inventory, &registered);
    debug!(
        "Plan: {} additions, {} removals",
        changes.additions.len(),
        changes.removals.len()
    );

    let report = CycleReport {
        candidates: inventory.candidates.len(),
        registered: registered.len(),
        suspended: inventory.scope.suspended().map(str::to_string).collect(),
        apply: apply(changes, gateway, backends).await,
    };
    Ok(report)
}

/// Drives reconciliation cycles for the lifetime of the process.
pub struct CycleDriver {
    settings: Settings,
    http: Client,
    secrets: SecretStore,
    backends: BackendClient,
}

impl CycleDriver {
    pub fn new(settings: Settings) -> ProvisionResult<Self> {
        let http = http_client(settings.call_timeout())?;
        Ok(Self {
            secrets: SecretStore::new(settings.secrets_dir.clone()),
            backends: BackendClient::new(http.clone(), settings.verbose),
            http,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs a single cycle from a fresh configuration load.
    pub async fn run_cycle(&self) -> ProvisionResult<CycleReport> {
        let path = &self.settings.config_path;
        let config = ProvisionerConfig::load(path)
            .inspect_err(|e| error!("Error reading config {}: {}", path.display(), e))?;

        let gateway_key = self
            .secrets
            .gateway_key()
            .inspect_err(|e| error!("Error reading gateway API key: {}", e))?;

        let gateway = GatewayClient::new(
            self.http.clone(),
            config.gateway.url.clone(),
            gateway_key,
            self.settings.verbose,
        );

        run_once(&config, &self.secrets, &gateway, &self.backends).await
    }

    /// Runs cycles forever, sleeping the configured interval between them.
    pub async fn run(&self) {
        let interval = self.settings.interval();
        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    "Cycle complete: {} candidates, {} added, {} removed, {} failed, {} suspended backends",
                    report.candidates,
                    report.apply.added.len(),
                    report.apply.removed.len(),
                    report.apply.failures.len(),
                    report.suspended.len()
                ),
                Err(e) => error!("Cycle abandoned ({}), retrying in {}s", e, interval.as_secs()),
            }
            tokio::time::sleep(interval).await;
        }
    }
}
