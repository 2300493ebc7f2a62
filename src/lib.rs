//! Model provisioner for a LiteLLM gateway.
//!
//! Periodically reconciles the gateway's registered models with what the
//! configured OpenAI-compatible backends actually serve.
//!
//! # Cycle
//!
//! 1. **Load**: configuration document and gateway credential
//! 2. **Current state**: registrations reported by the gateway
//! 3. **Collect**: each backend's inventory, filtered, with capabilities
//!    resolved from defaults and overrides
//! 4. **Plan**: diff keyed by `(model name, backend URL)`, restricted to
//!    configured, reachable backends
//! 5. **Apply**: probe new models when discovery is on, then add and remove
//!
//! The process keeps no state between cycles.
//!
//! # Example
//!
//! ```
//! use model_provisioner::ProvisionerConfig;
//!
//! let config = ProvisionerConfig::from_yaml(
//!     "litellm:\n  url: http://litellm:4000\nbackends:\n  - name: vllm\n    url: http://vllm:8000/v1\n",
//! )
//! .unwrap();
//! assert_eq!(config.backends[0].name, "vllm");
//! ```

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod driver;
mod error;
pub mod gateway;
pub mod http;
pub mod inventory;
pub mod reconciler;
pub mod secrets;

pub use backend::{BackendApi, BackendClient};
pub use capabilities::{CapabilityMap, CapabilityPolicy, OverrideRule};
pub use config::{Backend, BackendConfig, ProvisionerConfig, Settings};
pub use driver::{run_once, CycleDriver, CycleReport};
pub use error::{ProvisionError, ProvisionResult};
pub use gateway::{GatewayApi, GatewayClient, ModelKey, NewModel, RegisteredModel};
pub use inventory::{Candidate, Inventory, InventoryCollector, Scope};
pub use reconciler::{apply, plan, ApplyReport, ChangeFailure, ChangeKind, ReconcilePlan};
pub use secrets::SecretStore;
