//! enginedist - Release packaging helper for engine distributions
//!
//! enginedist decides which published module releases ship inside an engine
//! distribution and puts them on disk. For each module a distribution bundles
//! it:
//!
//! - Reads the engine's current plugin and subsystem API versions from the SDK headers
//! - Fetches the module index and each module's newest-first release list
//! - Picks the pinned production version when compatible, else the latest compatible release
//! - Extracts the archive from a local module folder or a download
//! - Appends the resolved modules to the engine profile
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::{
//!     bundle_modules, ApiVersions, BundleRequest, DistributionManifest, EngineHeaders,
//!     HttpModuleIndex,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = DistributionManifest::load("bundle.json")?;
//! let api_versions = ApiVersions::from_engine("./Engine", &EngineHeaders::default())?;
//! let request = BundleRequest::new("studio", api_versions, "Module", "Config/Profile.json");
//!
//! let report = bundle_modules(&manifest, &request, &HttpModuleIndex::new())?;
//! println!("Bundled {} modules", report.resolved.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`distribution`] - Distribution manifest and effective module sets
//! - [`version`] - Engine API versions and header parsing
//! - [`index`] - Module index client and release descriptors
//! - [`resolver`] - Release selection against API versions
//! - [`installer`] - Archive acquisition and extraction
//! - [`profile`] - Engine profile updates
//! - [`bundle`] - End-to-end bundling of a distribution's modules
//! - [`settings`] - Engine settings patching
//! - [`config`] - Required environment configuration
//! - [`error`] - Error types and result handling

pub mod bundle;
pub mod config;
pub mod distribution;
pub mod error;
pub mod index;
pub mod installer;
pub mod profile;
pub mod resolver;
pub mod settings;
pub mod version;

pub use bundle::{bundle_modules, BundleReport, BundleRequest, BundledModule, SkippedModule};
pub use config::{collect_required, ReleaseVersion, SigningConfig};
pub use distribution::{DistributionConfig, DistributionManifest, MANIFEST_NAME};
pub use error::{Error, Result};
pub use index::{
    HttpModuleIndex, ModuleDescriptor, ModuleSource, ModuleType, ProgressCallback, Release,
    ReleaseList,
};
pub use installer::{acquire, extract_archive, find_cached_archive, module_install_dir};
pub use profile::{
    append_to_profile, merge_into_profile, Profile, ProfileMergeMode, ResolvedModule,
};
pub use resolver::{resolve, resolve_with_report, Resolution, ResolveWarning};
pub use settings::{apply_distribution, update_engine_settings};
pub use version::{
    parse_version_defines, parse_version_header, ApiVersion, ApiVersions, EngineHeaders,
    VersionHeader,
};
