//! Module index client and descriptor types
//!
//! The module index is a remote JSON array of [`ModuleDescriptor`]s. Each
//! descriptor's `url` points to that module's release list, a document of the
//! form `{"releases": [...]}` ordered newest-first. That ordering belongs to
//! the index and is never recomputed here.
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::{HttpModuleIndex, ModuleSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = HttpModuleIndex::new();
//! for module in index.fetch_index("https://example.com/modules/index.json")? {
//!     let releases = index.fetch_releases(&module.url)?;
//!     println!("{} ({} releases)", module.name, releases.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::{ApiVersion, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Upper bound on the buffer reserved up front from `Content-Length`
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Progress callback for archive downloads
///
/// Called with a message, bytes received so far and the total size
/// (0 when the server does not report one).
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleType {
    Plugin,
    Subsystem,
}

impl ModuleType {
    /// Parse an index `type` value, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("plugin") {
            Some(ModuleType::Plugin)
        } else if value.eq_ignore_ascii_case("subsystem") {
            Some(ModuleType::Subsystem)
        } else {
            None
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleType::Plugin => write!(f, "plugin"),
            ModuleType::Subsystem => write!(f, "subsystem"),
        }
    }
}

/// One entry of the top-level module index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleDescriptor {
    pub name: String,

    /// Raw `type` value; decoded on demand by [`ModuleDescriptor::kind`] so
    /// entries the distribution never bundles cannot break the index
    #[serde(rename = "type")]
    pub module_type: String,

    /// Location of this module's release list
    pub url: String,

    /// Operator-pinned version, preferred over the latest compatible release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_version: Option<String>,
}

impl ModuleDescriptor {
    /// Decoded module type, `None` when the index uses an unknown value
    pub fn kind(&self) -> Option<ModuleType> {
        ModuleType::parse(&self.module_type)
    }
}

/// A published release of a module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    pub version: String,

    /// Archive location
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_api_version: Option<ApiVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsystem_api_version: Option<ApiVersion>,
}

impl Release {
    /// Declared API version for the given module type, if any
    pub fn api_version_for(&self, module_type: ModuleType) -> Option<&ApiVersion> {
        match module_type {
            ModuleType::Plugin => self.plugin_api_version.as_ref(),
            ModuleType::Subsystem => self.subsystem_api_version.as_ref(),
        }
    }

    /// A release without a declared API version is compatible with anything
    pub fn supports(&self, module_type: ModuleType, current: &ApiVersion) -> bool {
        self.api_version_for(module_type)
            .map_or(true, |declared| declared.is_compatible_with(current))
    }

    /// File name of the release archive (last segment of its URL)
    pub fn archive_file_name(&self) -> String {
        if let Ok(parsed) = url::Url::parse(&self.url) {
            if let Some(last) = parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
            {
                return last.to_string();
            }
        }
        self.url
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.url)
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseList {
    pub releases: Vec<Release>,
}

/// Where module metadata and archives come from
///
/// The HTTP implementation is the production source; tests substitute their
/// own to count or forbid network access.
pub trait ModuleSource {
    /// Fetch the top-level module index
    fn fetch_index(&self, index_url: &str) -> Result<Vec<ModuleDescriptor>>;

    /// Fetch a module's releases, newest first
    fn fetch_releases(&self, module_url: &str) -> Result<Vec<Release>>;

    /// Download a release archive into memory
    fn download_archive(&self, archive_url: &str) -> Result<Vec<u8>>;
}

pub struct HttpModuleIndex {
    client: reqwest::blocking::Client,
    progress: Option<ProgressCallback>,
}

impl HttpModuleIndex {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_connect() {
                Error::index_fetch(url, "cannot connect to server")
            } else {
                Error::index_fetch(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::index_fetch(url, format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .map_err(|e| Error::index_fetch(url, format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::index_fetch(url, format!("failed to parse response: {}", e)))
    }
}

impl Default for HttpModuleIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleSource for HttpModuleIndex {
    fn fetch_index(&self, index_url: &str) -> Result<Vec<ModuleDescriptor>> {
        self.get_json(index_url)
    }

    fn fetch_releases(&self, module_url: &str) -> Result<Vec<Release>> {
        let list: ReleaseList = self.get_json(module_url)?;
        Ok(list.releases)
    }

    fn download_archive(&self, archive_url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .get(archive_url)
            .send()
            .map_err(|e| Error::Other(format!("Failed to download {}: {}", archive_url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Other(format!(
                "Download of {} failed: HTTP {}",
                archive_url,
                response.status().as_u16()
            )));
        }

        let total = response.content_length().unwrap_or(0);
        let mut bytes = Vec::with_capacity(total.min(MAX_PREALLOCATION) as usize);
        let mut buffer = vec![0; 8192];

        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|e| Error::Other(format!("Failed to download {}: {}", archive_url, e)))?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&buffer[..read]);
            if let Some(ref cb) = self.progress {
                cb("Downloading", bytes.len() as u64, total);
            }
        }

        Ok(bytes)
    }
}
