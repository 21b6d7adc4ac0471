//! Release selection against the engine's current API versions
//!
//! Selection is two-tiered:
//!
//! 1. A module's `production_version`, if present in the release list and
//!    compatible, wins regardless of its position.
//! 2. Otherwise the first compatible release in the index's newest-first
//!    order is taken.
//!
//! A release is compatible when it declares no API version for the module's
//! type, or when the declared major equals the engine's. Minor and patch are
//! informational only. Releases are never re-sorted here.
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::{resolve, ApiVersion, HttpModuleIndex, ModuleSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = HttpModuleIndex::new();
//! let modules = index.fetch_index("https://example.com/modules/index.json")?;
//! let releases = index.fetch_releases(&modules[0].url)?;
//! if let Some(release) = resolve(&modules[0], &releases, &ApiVersion::new(2, 0, 0)) {
//!     println!("{} -> {}", modules[0].name, release.version);
//! }
//! # Ok(())
//! # }
//! ```

use crate::{ApiVersion, ModuleDescriptor, Release};
use log::{debug, warn};
use std::fmt;

/// Non-fatal observations made while resolving one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// The pinned version is not in the release list
    PinNotFound { version: String },
    /// The pinned version exists but its API major differs from the engine's
    PinIncompatible { version: String, required_major: u32 },
    /// No release supports the engine's API major; the module is skipped
    NoCompatibleRelease { required_major: u32 },
    /// The index lists the module with a `type` that is neither plugin nor subsystem
    UnknownModuleType { module_type: String },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::PinNotFound { version } => {
                write!(f, "production version {} not found in releases", version)
            }
            ResolveWarning::PinIncompatible {
                version,
                required_major,
            } => write!(
                f,
                "production version {} does not support API version {}",
                version, required_major
            ),
            ResolveWarning::NoCompatibleRelease { required_major } => {
                write!(f, "no release supports API version {}", required_major)
            }
            ResolveWarning::UnknownModuleType { module_type } => {
                write!(f, "unknown module type '{}'", module_type)
            }
        }
    }
}

/// Outcome of resolving one module
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub release: Option<&'a Release>,
    pub warnings: Vec<ResolveWarning>,
}

impl Resolution<'_> {
    /// True when the production pin was taken as-is
    pub fn used_pin(&self, module: &ModuleDescriptor) -> bool {
        match (self.release, module.production_version.as_deref()) {
            (Some(release), Some(pin)) => release.version == pin,
            _ => false,
        }
    }
}

/// Choose a release for `module`, logging and recording every fallback
pub fn resolve_with_report<'a>(
    module: &ModuleDescriptor,
    releases: &'a [Release],
    current: &ApiVersion,
) -> Resolution<'a> {
    let mut warnings = Vec::new();
    let Some(module_type) = module.kind() else {
        warn!(
            "Module {} has unknown type '{}', skipping",
            module.name, module.module_type
        );
        warnings.push(ResolveWarning::UnknownModuleType {
            module_type: module.module_type.clone(),
        });
        return Resolution {
            release: None,
            warnings,
        };
    };

    if let Some(pin) = module.production_version.as_deref() {
        debug!(
            "Production version specified for {} {}, looking for release {}",
            module_type, module.name, pin
        );
        match releases.iter().find(|r| r.version == pin) {
            Some(release) if release.supports(module_type, current) => {
                return Resolution {
                    release: Some(release),
                    warnings,
                };
            }
            Some(_) => {
                warn!(
                    "Production version {} of {} {} does not support {} API version {}, \
                     will use latest release that supports it",
                    pin, module_type, module.name, module_type, current.major
                );
                warnings.push(ResolveWarning::PinIncompatible {
                    version: pin.to_string(),
                    required_major: current.major,
                });
            }
            None => {
                warn!(
                    "Production version {} of {} {} not found, \
                     will use latest release that supports {} API version {}",
                    pin, module_type, module.name, module_type, current.major
                );
                warnings.push(ResolveWarning::PinNotFound {
                    version: pin.to_string(),
                });
            }
        }
    }

    debug!(
        "Using latest release of {} that supports {} API version {}",
        module.name, module_type, current.major
    );
    let release = releases.iter().find(|r| r.supports(module_type, current));

    if release.is_none() {
        warn!(
            "{} {} does not support {} API version {}, skipping",
            module_type, module.name, module_type, current.major
        );
        warnings.push(ResolveWarning::NoCompatibleRelease {
            required_major: current.major,
        });
    }

    Resolution { release, warnings }
}

/// Choose a release for `module`, or `None` when nothing is compatible
pub fn resolve<'a>(
    module: &ModuleDescriptor,
    releases: &'a [Release],
    current: &ApiVersion,
) -> Option<&'a Release> {
    resolve_with_report(module, releases, current).release
}
