//! Credential files.
//!
//! Each backend's API key lives in `<dir>/<backend name>`; the gateway's
//! master key lives in `<dir>/litellm`. Files are re-read every cycle so a
//! rotated secret is picked up without a restart.

use crate::error::{ProvisionError, ProvisionResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the gateway credential.
pub const GATEWAY_SECRET_NAME: &str = "litellm";

/// Credential substituted for a backend without a secret file.
pub const BLANK_CREDENTIAL: &str = "BLANK";

/// Reads credentials from a directory of one-value files.
#[derive(Debug, Clone)]
pub struct SecretStore {
    dir: PathBuf,
}

impl SecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads the secret `name`, trimmed. An empty file counts as missing.
    pub fn read(&self, name: &str) -> ProvisionResult<String> {
        let path = self.dir.join(name);
        let raw = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProvisionError::MissingCredential(name.to_string()),
            _ => ProvisionError::Io(e),
        })?;

        let value = raw.trim();
        if value.is_empty() {
            return Err(ProvisionError::MissingCredential(name.to_string()));
        }
        Ok(value.to_string())
    }

    /// Reads the gateway credential. Absence is fatal to the cycle.
    pub fn gateway_key(&self) -> ProvisionResult<String> {
        self.read(GATEWAY_SECRET_NAME)
    }

    /// Reads a backend credential, falling back to [`BLANK_CREDENTIAL`].
    pub fn backend_key(&self, backend_name: &str) -> String {
        match self.read(backend_name) {
            Ok(key) => key,
            Err(e) => {
                debug!("No API key for backend {} ({}), using {}", backend_name, e, BLANK_CREDENTIAL);
                BLANK_CREDENTIAL.to_string()
            }
        }
    }
}

/// Masks a credential for logging: first four and last two characters.
pub fn redact(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 6 {
        return "REDACTED".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}..REDACTED..{tail}")
}
