//! Distribution manifest parsing
//!
//! A distribution manifest (`bundle.json`) is a JSON array of named bundling
//! configurations. Each one lists the modules it ships and may pull in the
//! bundled modules of other distributions through `includes`.
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::DistributionManifest;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = DistributionManifest::load("bundle.json")?;
//! let dist = manifest.find("studio")?;
//! for module in manifest.effective_bundled_modules(dist) {
//!     println!("{}", module);
//! }
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest filename
pub const MANIFEST_NAME: &str = "bundle.json";

/// One named distribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionConfig {
    pub key: String,

    #[serde(default)]
    pub bundled_modules: BTreeSet<String>,

    /// Keys of other distributions whose own `bundled_modules` are added.
    /// Expanded one level only.
    #[serde(default)]
    pub includes: Vec<String>,

    pub module_index_url: String,

    /// Directory of pre-downloaded module archives, checked before the network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_modules_folder: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_index_url: Option<String>,
}

impl DistributionConfig {
    /// Whether packaging bundles modules into this distribution
    ///
    /// Decided by the distribution's own `bundled_modules`; a distribution
    /// that only includes others ships no modules.
    pub fn is_bundled(&self) -> bool {
        !self.bundled_modules.is_empty()
    }

    /// Local module cache with `~` and environment variables expanded
    pub fn local_modules_dir(&self) -> Option<PathBuf> {
        self.local_modules_folder.as_ref().map(|folder| {
            let raw = folder.to_string_lossy();
            match shellexpand::full(&raw) {
                Ok(expanded) => PathBuf::from(expanded.into_owned()),
                Err(_) => folder.clone(),
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributionManifest {
    pub distributions: Vec<DistributionConfig>,
}

impl DistributionManifest {
    pub fn new(distributions: Vec<DistributionConfig>) -> Self {
        Self { distributions }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Other(format!(
                "Failed to read distribution manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let distributions: Vec<DistributionConfig> = serde_json::from_str(contents)?;
        Ok(Self { distributions })
    }

    /// Look up a distribution by key
    pub fn find(&self, key: &str) -> Result<&DistributionConfig> {
        self.distributions
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| Error::Config(key.to_string()))
    }

    /// The distribution's own modules plus the own modules of every
    /// distribution it directly includes
    ///
    /// Includes of included distributions are not followed.
    pub fn effective_bundled_modules(&self, dist: &DistributionConfig) -> BTreeSet<String> {
        let mut modules = dist.bundled_modules.clone();

        for include in &dist.includes {
            let Some(other) = self.distributions.iter().find(|d| &d.key == include) else {
                warn!(
                    "Distribution '{}' includes unknown distribution '{}', ignoring",
                    dist.key, include
                );
                continue;
            };

            debug!(
                "Adding modules from {}: {}",
                other.key,
                other
                    .bundled_modules
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            if !other.includes.is_empty() {
                warn!(
                    "Distribution '{}' has its own includes ({}); nested includes are not expanded",
                    other.key,
                    other.includes.join(", ")
                );
            }
            modules.extend(other.bundled_modules.iter().cloned());
        }

        modules
    }
}
