//! Configuration: the backend/gateway document and process settings.
//!
//! The document is re-read at the start of every cycle, so edits to the
//! mounted file take effect without a restart. Process settings come from
//! the environment (or the equivalent flags) and are fixed for the
//! lifetime of the process.

use crate::capabilities::{CapabilityMap, CapabilityPolicy, OverrideRule};
use crate::error::{ProvisionError, ProvisionResult};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/config/config.yaml";
/// Default directory holding one credential file per backend.
pub const DEFAULT_SECRETS_DIR: &str = "/etc/secrets";

/// Gateway section of the configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway management API.
    pub url: String,
}

/// A single `(pattern, capabilities)` override as written in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideConfig {
    pub regex: String,
    #[serde(default)]
    pub capabilities: CapabilityMap,
}

/// One inference backend as written in the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name, also used to locate the backend's credential file.
    pub name: String,
    /// Base URL, recorded verbatim as the owning URL of every model.
    pub url: String,
    /// Probe newly added models for tool-use and vision support.
    #[serde(default)]
    pub discovery: bool,
    /// Only model ids matching this pattern are registered.
    #[serde(default)]
    pub filter_regex: Option<String>,
    /// Ordered overrides; the first match wins.
    #[serde(default)]
    pub overrides: Vec<OverrideConfig>,
    /// Capabilities applied to every model unless an override matches.
    #[serde(default)]
    pub model_info_defaults: CapabilityMap,
}

impl BackendConfig {
    /// Compiles the filter and override patterns.
    ///
    /// An empty filter pattern means "no filter".
    pub fn compile(&self) -> ProvisionResult<Backend> {
        let filter = match self.filter_regex.as_deref() {
            Some(pattern) if !pattern.is_empty() => Some(compile_pattern(pattern)?),
            _ => None,
        };

        let overrides = self
            .overrides
            .iter()
            .map(|o| {
                Ok(OverrideRule {
                    pattern: compile_pattern(&o.regex)?,
                    capabilities: o.capabilities.clone(),
                })
            })
            .collect::<ProvisionResult<Vec<_>>>()?;

        Ok(Backend {
            name: self.name.clone(),
            url: self.url.clone(),
            filter,
            policy: CapabilityPolicy {
                defaults: self.model_info_defaults.clone(),
                overrides,
                discovery: self.discovery,
            },
        })
    }
}

fn compile_pattern(pattern: &str) -> ProvisionResult<Regex> {
    Regex::new(pattern).map_err(|e| ProvisionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// A backend with its patterns compiled, ready for one cycle.
#[derive(Debug, Clone)]
pub struct Backend {
    pub name: String,
    pub url: String,
    pub filter: Option<Regex>,
    pub policy: CapabilityPolicy,
}

impl Backend {
    /// Returns true if the model id passes the backend's inclusion filter.
    pub fn accepts(&self, model_id: &str) -> bool {
        self.filter.as_ref().map_or(true, |re| re.is_match(model_id))
    }
}

/// The configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    #[serde(rename = "litellm", alias = "gateway")]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

impl ProvisionerConfig {
    /// Reads and validates the document at `path`.
    pub fn load(path: &Path) -> ProvisionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(content: &str) -> ProvisionResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ProvisionResult<()> {
        if self.gateway.url.trim().is_empty() {
            return Err(ProvisionError::Config("gateway url is empty".to_string()));
        }
        for (i, backend) in self.backends.iter().enumerate() {
            if backend.name.trim().is_empty() {
                return Err(ProvisionError::Config(format!("backend #{i} has no name")));
            }
            if backend.url.trim().is_empty() {
                return Err(ProvisionError::Config(format!(
                    "backend '{}' has no url",
                    backend.name
                )));
            }
        }
        Ok(())
    }
}

/// Process settings, read from the environment or flags.
#[derive(Parser, Debug, Clone)]
#[command(name = "model-provisioner")]
#[command(about = "Keeps a LiteLLM gateway's registered models in sync with inference backends")]
pub struct Settings {
    /// Seconds to sleep between reconciliation cycles
    #[arg(long, env = "SLEEP_INTERVAL", default_value = "60")]
    pub sleep_interval: u64,

    /// Enable verbose debug logging
    #[arg(short, long, env = "DEBUG", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    pub verbose: bool,

    /// Path to the configuration document
    #[arg(long, env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: PathBuf,

    /// Directory holding credential files
    #[arg(long, env = "SECRETS_DIR", default_value = DEFAULT_SECRETS_DIR)]
    pub secrets_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "10")]
    pub request_timeout: u64,
}

impl Settings {
    /// Sleep between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sleep_interval)
    }

    /// Timeout applied to every outbound call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sleep_interval: 60,
            verbose: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
            request_timeout: 10,
        }
    }
}
