//! Required environment configuration
//!
//! Release versioning and code-signing parameters come from the process
//! environment. Every required key is checked up front and all missing keys
//! are reported together, so a CI job fails once with the full list instead
//! of once per variable.
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::ReleaseVersion;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let version = ReleaseVersion::from_env()?;
//! println!("Tag: {}", version.tag());
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use std::collections::HashMap;

pub const VERSION_ENV_KEYS: [&str; 4] =
    ["VERSION_MAJOR", "VERSION_MINOR", "VERSION_PATCH", "BUILD_NUMBER"];

pub const SIGNING_ENV_KEYS: [&str; 5] = [
    "ZD_CODE_SIGN_AZURE_KEY_VAULT_URL",
    "ZD_CODE_SIGN_AZURE_KEY_VAULT_CLIENT_ID",
    "ZD_CODE_SIGN_AZURE_KEY_VAULT_CLIENT_SECRET",
    "ZD_CODE_SIGN_AZURE_TENANT_ID",
    "ZD_CODE_SIGN_AZURE_KEY_VAULT_CERT_NAME",
];

/// Collect every key from `lookup`, failing with all absent keys at once
///
/// Empty values count as absent.
pub fn collect_required<F>(keys: &[&str], lookup: F) -> Result<HashMap<String, String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = HashMap::new();
    let mut missing = Vec::new();

    for &key in keys {
        match lookup(key).filter(|v| !v.is_empty()) {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => missing.push(key.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(values)
    } else {
        Err(Error::MissingConfig(missing))
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Engine release version, e.g. `1.3.0.b42`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    pub major: String,
    pub minor: String,
    pub patch: String,
    pub build_number: String,
}

impl ReleaseVersion {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let mut values = collect_required(&VERSION_ENV_KEYS, lookup)?;
        let mut take = |key: &str| values.remove(key).unwrap_or_default();
        Ok(Self {
            major: take("VERSION_MAJOR"),
            minor: take("VERSION_MINOR"),
            patch: take("VERSION_PATCH"),
            build_number: take("BUILD_NUMBER"),
        })
    }

    /// `{major}.{minor}.{patch}`
    pub fn semver(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// `{major}.{minor}.{patch}.b{build}`
    pub fn version(&self) -> String {
        format!("{}.b{}", self.semver(), self.build_number)
    }

    /// Git tag used for the release
    pub fn tag(&self) -> String {
        format!("v{}", self.version())
    }

    pub fn sdk_archive_name(&self) -> String {
        format!("Nodos-SDK-{}.zip", self.version())
    }

    /// Distribution archive name; bundled distributions carry their key
    pub fn dist_archive_name(&self, bundled_dist_key: Option<&str>) -> String {
        match bundled_dist_key {
            Some(key) => format!("Nodos-{}-bundle-{}.zip", self.version(), key),
            None => format!("Nodos-{}.zip", self.version()),
        }
    }
}

/// Code-signing credentials
#[derive(Debug, Clone)]
pub struct SigningConfig {
    pub key_vault_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub cert_name: String,
}

impl SigningConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let mut values = collect_required(&SIGNING_ENV_KEYS, lookup)?;
        let mut take = |key: &str| values.remove(key).unwrap_or_default();
        Ok(Self {
            key_vault_url: take(SIGNING_ENV_KEYS[0]),
            client_id: take(SIGNING_ENV_KEYS[1]),
            client_secret: take(SIGNING_ENV_KEYS[2]),
            tenant_id: take(SIGNING_ENV_KEYS[3]),
            cert_name: take(SIGNING_ENV_KEYS[4]),
        })
    }
}
