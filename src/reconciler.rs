//! Reconciler: diffs desired against registered models and applies the
//! difference through the gateway.
//!
//! The diff is a pure function over two sets keyed by [`ModelKey`].
//! Registrations under a URL that is not comparable this cycle (not
//! configured, or its backend was suspended) never enter the current set,
//! so they can be neither added nor removed.

use crate::backend::BackendApi;
use crate::capabilities::discover;
use crate::gateway::{GatewayApi, ModelKey, RegisteredModel};
use crate::inventory::{Candidate, Inventory};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Changes needed to bring the gateway in line with the backends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub additions: Vec<Candidate>,
    pub removals: Vec<RegisteredModel>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// Computes additions and removals. Output is ordered by key.
pub fn plan(inventory: &Inventory, registered: &[RegisteredModel]) -> ReconcilePlan {
    let scope = &inventory.scope;

    let mut current: BTreeMap<ModelKey, &RegisteredModel> = BTreeMap::new();
    for entry in registered {
        let Some(key) = entry.key() else { continue };
        if scope.is_comparable(&key.api_base) {
            current.entry(key).or_insert(entry);
        }
    }

    let mut desired: BTreeMap<ModelKey, &Candidate> = BTreeMap::new();
    for candidate in &inventory.candidates {
        if scope.is_comparable(&candidate.api_base) {
            desired.entry(candidate.key()).or_insert(candidate);
        }
    }

    let additions = desired
        .iter()
        .filter(|(key, _)| !current.contains_key(*key))
        .map(|(_, candidate)| (*candidate).clone())
        .collect();

    let removals = current
        .iter()
        .filter(|(key, _)| !desired.contains_key(*key))
        .map(|(_, entry)| (*entry).clone())
        .collect();

    ReconcilePlan { additions, removals }
}

/// Which kind of change failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Remove,
}

/// A change the gateway did not accept this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFailure {
    pub key: ModelKey,
    pub kind: ChangeKind,
    pub reason: String,
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub added: Vec<ModelKey>,
    pub removed: Vec<ModelKey>,
    pub failures: Vec<ChangeFailure>,
    /// Capability probes issued against backends.
    pub probes: usize,
}

/// Applies every change in `plan` once. A failing change is logged and
/// recorded; the remaining changes are still attempted.
pub async fn apply<G, B>(plan: ReconcilePlan, gateway: &G, backends: &B) -> ApplyReport
where
    G: GatewayApi + ?Sized,
    B: BackendApi + ?Sized,
{
    let mut report = ApplyReport::default();

    for mut candidate in plan.additions {
        if candidate.discovery {
            report.probes += discover(
                backends,
                &candidate.api_base,
                &candidate.api_key,
                &candidate.model_name,
                &mut candidate.capabilities,
            )
            .await;
        }

        info!("Adding model {} from {}", candidate.model_name, candidate.api_base);
        let key = candidate.key();
        match gateway.add_model(&candidate.to_new_model()).await {
            Ok(()) => report.added.push(key),
            Err(e) => {
                warn!("Error adding model {}: {}", key, e);
                report.failures.push(ChangeFailure {
                    key,
                    kind: ChangeKind::Add,
                    reason: e.to_string(),
                });
            }
        }
    }

    for entry in plan.removals {
        let Some(key) = entry.key() else { continue };
        let Some(id) = entry.id() else {
            warn!("Cannot remove model {}: gateway reported no ID", key);
            report.failures.push(ChangeFailure {
                key,
                kind: ChangeKind::Remove,
                reason: "missing gateway id".to_string(),
            });
            continue;
        };

        info!("Removing model {} with ID {}", key, id);
        match gateway.delete_model(id).await {
            Ok(()) => report.removed.push(key),
            Err(e) => {
                warn!("Error removing model {} with ID {}: {}", key, id, e);
                report.failures.push(ChangeFailure {
                    key,
                    kind: ChangeKind::Remove,
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}
