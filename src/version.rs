//! Engine API versions and the header parser that extracts them
//!
//! The engine SDK declares its plugin and subsystem interface versions as
//! preprocessor defines:
//!
//! ```text
//! #define NOS_PLUGIN_API_VERSION_MAJOR 2
//! #define NOS_PLUGIN_API_VERSION_MINOR 1
//! #define NOS_PLUGIN_API_VERSION_PATCH 0
//! ```
//!
//! A missing component is always an error. Defaulting it to zero would make
//! every release with major 0 look compatible.
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::{ApiVersions, EngineHeaders};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let versions = ApiVersions::from_engine("./Engine", &EngineHeaders::default())?;
//! println!("Plugin API: {}", versions.plugin);
//! # Ok(())
//! # }
//! ```

use crate::{Error, ModuleType, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A (major, minor, patch) interface version
///
/// Only the major component takes part in compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    #[serde(alias = "MAJOR", alias = "Major")]
    pub major: u32,
    #[serde(default, alias = "MINOR", alias = "Minor")]
    pub minor: u32,
    #[serde(default, alias = "PATCH", alias = "Patch")]
    pub patch: u32,
}

impl ApiVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Two versions are compatible iff their major components are equal
    pub fn is_compatible_with(&self, other: &ApiVersion) -> bool {
        self.major == other.major
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse `#define <PREFIX>_VERSION_{MAJOR,MINOR,PATCH} <n>` lines from header text
///
/// `path` is only used for error reporting.
pub fn parse_version_defines(contents: &str, prefix: &str, path: &Path) -> Result<ApiVersion> {
    let pattern = format!(
        r"^\s*#define\s+{}_VERSION_(MAJOR|MINOR|PATCH)\s+(\d+)\b",
        regex::escape(prefix)
    );
    let re = Regex::new(&pattern)
        .map_err(|e| Error::Other(format!("Invalid version prefix '{}': {}", prefix, e)))?;

    let mut major = None;
    let mut minor = None;
    let mut patch = None;

    for line in contents.lines() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let value = caps[2].parse::<u32>().ok();
        match &caps[1] {
            "MAJOR" => major = value,
            "MINOR" => minor = value,
            _ => patch = value,
        }
    }

    match (major, minor, patch) {
        (Some(major), Some(minor), Some(patch)) => Ok(ApiVersion::new(major, minor, patch)),
        _ => {
            let missing = [("MAJOR", major), ("MINOR", minor), ("PATCH", patch)]
                .iter()
                .filter(|(_, v)| v.is_none())
                .map(|(name, _)| format!("{}_VERSION_{}", prefix, name))
                .collect();
            Err(Error::VersionParse {
                path: path.to_path_buf(),
                prefix: prefix.to_string(),
                missing,
            })
        }
    }
}

/// Read and parse a version header file
pub fn parse_version_header<P: AsRef<Path>>(path: P, prefix: &str) -> Result<ApiVersion> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| Error::VersionParse {
        path: path.to_path_buf(),
        prefix: prefix.to_string(),
        missing: vec![format!("readable header ({})", e)],
    })?;
    parse_version_defines(&contents, prefix, path)
}

/// Location of a single version header inside the engine folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHeader {
    /// Path relative to the engine folder
    pub relative_path: PathBuf,
    /// Define prefix, e.g. `NOS_PLUGIN_API`
    pub prefix: String,
}

/// Where the plugin and subsystem API headers live in an engine build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineHeaders {
    pub plugin: VersionHeader,
    pub subsystem: VersionHeader,
}

impl Default for EngineHeaders {
    fn default() -> Self {
        let include_dir = Path::new("SDK").join("include").join("Nodos");
        Self {
            plugin: VersionHeader {
                relative_path: include_dir.join("PluginAPI.h"),
                prefix: "NOS_PLUGIN_API".to_string(),
            },
            subsystem: VersionHeader {
                relative_path: include_dir.join("SubsystemAPI.h"),
                prefix: "NOS_SUBSYSTEM_API".to_string(),
            },
        }
    }
}

/// Current engine API versions, one per module type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersions {
    pub plugin: ApiVersion,
    pub subsystem: ApiVersion,
}

impl ApiVersions {
    /// Read both API headers from an engine folder
    ///
    /// Fails on the first header that cannot be parsed; no resolution should
    /// start with partial version data.
    pub fn from_engine<P: AsRef<Path>>(engine_folder: P, headers: &EngineHeaders) -> Result<Self> {
        let engine_folder = engine_folder.as_ref();
        let subsystem = parse_version_header(
            engine_folder.join(&headers.subsystem.relative_path),
            &headers.subsystem.prefix,
        )?;
        let plugin = parse_version_header(
            engine_folder.join(&headers.plugin.relative_path),
            &headers.plugin.prefix,
        )?;
        Ok(Self { plugin, subsystem })
    }

    pub fn for_type(&self, module_type: ModuleType) -> ApiVersion {
        match module_type {
            ModuleType::Plugin => self.plugin,
            ModuleType::Subsystem => self.subsystem,
        }
    }
}
