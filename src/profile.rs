//! Engine profile (`Profile.json`) updates
//!
//! The profile records which modules were bundled into a distribution. Runs
//! add to it rather than rewrite it: by default new entries are appended and
//! existing entries, including duplicates from earlier runs, are kept. Keys
//! other than `loaded_modules` are preserved as-is, and so are existing
//! entries: they are carried through as raw JSON, whatever fields they hold.
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::{append_to_profile, ResolvedModule};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! append_to_profile("Config/Profile.json", &[ResolvedModule::new("m1", "2.0.0")])?;
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// A module and the version that was bundled for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedModule {
    pub name: String,
    pub version: String,
}

impl ResolvedModule {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    fn to_entry(&self) -> Value {
        json!({ "name": self.name, "version": self.version })
    }
}

/// How new entries are merged into `loaded_modules`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileMergeMode {
    /// Append everything; repeated runs accumulate duplicates
    #[default]
    Append,
    /// Drop existing entries with the same module name, then append
    ReplaceByName,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub loaded_modules: Vec<Value>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl Profile {
    /// Load a profile, or an empty one if the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::Other(format!("Failed to parse profile {}: {}", path.display(), e))
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn merge(&mut self, modules: &[ResolvedModule], mode: ProfileMergeMode) {
        if mode == ProfileMergeMode::ReplaceByName {
            // Entries without a string name never match and are kept
            self.loaded_modules.retain(|existing| {
                let name = existing.get("name").and_then(Value::as_str);
                !modules.iter().any(|m| Some(m.name.as_str()) == name)
            });
        }
        self.loaded_modules
            .extend(modules.iter().map(ResolvedModule::to_entry));
    }
}

/// Append resolved modules to the profile at `path`
pub fn append_to_profile<P: AsRef<Path>>(path: P, modules: &[ResolvedModule]) -> Result<Profile> {
    merge_into_profile(path, modules, ProfileMergeMode::Append)
}

/// Read-modify-write the profile at `path` with the given merge mode
pub fn merge_into_profile<P: AsRef<Path>>(
    path: P,
    modules: &[ResolvedModule],
    mode: ProfileMergeMode,
) -> Result<Profile> {
    let path = path.as_ref();
    let mut profile = Profile::load_or_default(path)?;
    profile.merge(modules, mode);
    profile.save(path)?;
    Ok(profile)
}
