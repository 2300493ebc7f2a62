//! Capability resolution.
//!
//! A model's capability map starts from the backend's defaults. The first
//! override whose pattern matches the model id replaces that map entirely.
//! When discovery is enabled, models that are being added this cycle are
//! probed live for any of [`PROBED_KEYS`] still unset after static
//! resolution. Models that are already registered are never probed.

use crate::backend::BackendApi;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Open capability map, sent to the gateway as `model_info`.
pub type CapabilityMap = serde_json::Map<String, Value>;

/// Capability key for tool/function calling.
pub const SUPPORTS_FUNCTION_CALLING: &str = "supports_function_calling";
/// Capability key for image input.
pub const SUPPORTS_VISION: &str = "supports_vision";

/// Keys discovery is able to fill in.
pub const PROBED_KEYS: [&str; 2] = [SUPPORTS_FUNCTION_CALLING, SUPPORTS_VISION];

/// A compiled override rule.
#[derive(Debug, Clone)]
pub struct OverrideRule {
    pub pattern: Regex,
    pub capabilities: CapabilityMap,
}

/// Per-backend capability policy.
#[derive(Debug, Clone, Default)]
pub struct CapabilityPolicy {
    pub defaults: CapabilityMap,
    /// Evaluated in order; first match wins.
    pub overrides: Vec<OverrideRule>,
    pub discovery: bool,
}

impl CapabilityPolicy {
    /// Resolves the capability map from defaults and overrides only.
    pub fn resolve_static(&self, model_id: &str) -> CapabilityMap {
        match self.overrides.iter().find(|rule| rule.pattern.is_match(model_id)) {
            Some(rule) => {
                debug!("Override '{}' applies to {}", rule.pattern.as_str(), model_id);
                rule.capabilities.clone()
            }
            None => self.defaults.clone(),
        }
    }
}

/// Returns the probe-able keys not yet present in `capabilities`.
pub fn missing_probes(capabilities: &CapabilityMap) -> Vec<&'static str> {
    PROBED_KEYS
        .into_iter()
        .filter(|key| !capabilities.contains_key(*key))
        .collect()
}

/// Probes the backend for every capability missing from `capabilities`
/// and records the outcome as a boolean. A failed probe records `false`.
///
/// Returns the number of probes issued.
pub async fn discover<B: BackendApi + ?Sized>(
    api: &B,
    base_url: &str,
    api_key: &str,
    model_id: &str,
    capabilities: &mut CapabilityMap,
) -> usize {
    let missing = missing_probes(capabilities);
    for key in &missing {
        let supported = match *key {
            SUPPORTS_FUNCTION_CALLING => api.supports_tool_use(base_url, api_key, model_id).await,
            _ => api.supports_vision(base_url, api_key, model_id).await,
        };
        debug!("Discovered {}={} for {} on {}", key, supported, model_id, base_url);
        capabilities.insert((*key).to_string(), Value::Bool(supported));
    }
    missing.len()
}
