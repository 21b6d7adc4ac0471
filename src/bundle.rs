//! Module bundling for a distribution
//!
//! Ties the pieces together: the distribution's effective module set is
//! matched against the module index, each module is resolved against the
//! engine's API versions and extracted, and the resolved list is appended to
//! the engine profile.
//!
//! Modules are handled one at a time in index order. A module without a
//! compatible release is skipped; index and acquisition failures abort the
//! whole run without cleaning up what was already extracted.
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
//! let request = BundleRequest::new(
//!     "studio",
//!     api_versions,
//!     "Artifacts/__staging__/Module",
//!     "Artifacts/__staging__/Engine/Config/Profile.json",
//! );
//! let report = bundle_modules(&manifest, &request, &HttpModuleIndex::new())?;
//! println!("Bundled {} modules", report.resolved.len());
//! # Ok(())
//! # }
//! ```

use crate::{
    acquire, merge_into_profile, resolve_with_report, ApiVersions, DistributionManifest,
    ModuleSource, ProfileMergeMode, ResolveWarning, ResolvedModule, Result,
};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

/// Inputs of one bundling run
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub dist_key: String,
    pub api_versions: ApiVersions,
    /// Modules are extracted to `<target_dir>/<name>/<version>/`
    pub target_dir: PathBuf,
    pub profile_path: PathBuf,
    pub merge_mode: ProfileMergeMode,
    /// Resolve only; nothing is downloaded, extracted or written
    pub dry_run: bool,
}

impl BundleRequest {
    pub fn new(
        dist_key: impl Into<String>,
        api_versions: ApiVersions,
        target_dir: impl Into<PathBuf>,
        profile_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dist_key: dist_key.into(),
            api_versions,
            target_dir: target_dir.into(),
            profile_path: profile_path.into(),
            merge_mode: ProfileMergeMode::default(),
            dry_run: false,
        }
    }
}

/// A module that was resolved, with the warnings raised on the way
#[derive(Debug, Clone, PartialEq)]
pub struct BundledModule {
    pub module: ResolvedModule,
    /// Extraction root; `None` on dry runs
    pub path: Option<PathBuf>,
    pub warnings: Vec<ResolveWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedModule {
    pub name: String,
    pub warnings: Vec<ResolveWarning>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleReport {
    /// False when the distribution has no `bundled_modules` of its own
    pub bundled: bool,
    pub effective_modules: BTreeSet<String>,
    pub resolved: Vec<BundledModule>,
    pub skipped: Vec<SkippedModule>,
    /// Effective modules that the index does not list
    pub not_in_index: Vec<String>,
}

impl BundleReport {
    pub fn resolved_modules(&self) -> Vec<ResolvedModule> {
        self.resolved.iter().map(|b| b.module.clone()).collect()
    }
}

/// Resolve, acquire and record the bundled modules of a distribution
pub fn bundle_modules(
    manifest: &DistributionManifest,
    request: &BundleRequest,
    source: &dyn ModuleSource,
) -> Result<BundleReport> {
    let dist = manifest.find(&request.dist_key)?;
    let effective = manifest.effective_bundled_modules(dist);

    let mut report = BundleReport {
        bundled: dist.is_bundled(),
        effective_modules: effective.clone(),
        ..Default::default()
    };

    if !report.bundled {
        info!("Distribution '{}' bundles no modules", dist.key);
        return Ok(report);
    }

    info!(
        "Downloading modules: {}",
        effective.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    info!(
        "Current plugin API version: {}",
        request.api_versions.plugin
    );
    info!(
        "Current subsystem API version: {}",
        request.api_versions.subsystem
    );

    if !request.dry_run {
        fs::create_dir_all(&request.target_dir)?;
    }

    info!("Downloading module directory from {}", dist.module_index_url);
    let index = source.fetch_index(&dist.module_index_url)?;
    let local_modules_dir = dist.local_modules_dir();
    let mut seen = BTreeSet::new();

    for module in &index {
        if !effective.contains(&module.name) {
            debug!(
                "Skipping module {}, since it is not in distribution config '{}'",
                module.name, dist.key
            );
            continue;
        }
        if !seen.insert(module.name.clone()) {
            debug!("Module {} listed twice in index, ignoring repeat", module.name);
            continue;
        }

        let Some(module_type) = module.kind() else {
            warn!(
                "Module {} has unknown type '{}', skipping",
                module.name, module.module_type
            );
            report.skipped.push(SkippedModule {
                name: module.name.clone(),
                warnings: vec![ResolveWarning::UnknownModuleType {
                    module_type: module.module_type.clone(),
                }],
            });
            continue;
        };

        let releases = source.fetch_releases(&module.url)?;
        let current = request.api_versions.for_type(module_type);
        let resolution = resolve_with_report(module, &releases, &current);

        let Some(release) = resolution.release else {
            report.skipped.push(SkippedModule {
                name: module.name.clone(),
                warnings: resolution.warnings,
            });
            continue;
        };

        let path = if request.dry_run {
            info!(
                "Would bundle {} {}:{}",
                module_type, module.name, release.version
            );
            None
        } else {
            Some(acquire(
                &module.name,
                release,
                local_modules_dir.as_deref(),
                &request.target_dir,
                source,
            )?)
        };

        report.resolved.push(BundledModule {
            module: ResolvedModule::new(&module.name, &release.version),
            path,
            warnings: resolution.warnings,
        });
    }

    report.not_in_index = effective
        .iter()
        .filter(|name| !seen.contains(*name))
        .cloned()
        .collect();
    for name in &report.not_in_index {
        warn!("Module {} is not listed in {}", name, dist.module_index_url);
    }

    if !request.dry_run {
        merge_into_profile(
            &request.profile_path,
            &report.resolved_modules(),
            request.merge_mode,
        )?;
        info!(
            "Recorded {} modules in {}",
            report.resolved.len(),
            request.profile_path.display()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiVersion, Error, ModuleDescriptor, Profile, Release};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn make_zip(file_name: &str) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            zip.start_file(file_name, SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"contents").unwrap();
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    /// In-memory module source that records every call
    #[derive(Default)]
    struct FakeIndex {
        index: Vec<ModuleDescriptor>,
        releases: HashMap<String, Vec<Release>>,
        calls: RefCell<Vec<String>>,
        fail_downloads: bool,
    }

    impl ModuleSource for FakeIndex {
        fn fetch_index(&self, index_url: &str) -> Result<Vec<ModuleDescriptor>> {
            self.calls.borrow_mut().push(format!("index {}", index_url));
            Ok(self.index.clone())
        }

        fn fetch_releases(&self, module_url: &str) -> Result<Vec<Release>> {
            self.calls.borrow_mut().push(format!("releases {}", module_url));
            self.releases
                .get(module_url)
                .cloned()
                .ok_or_else(|| Error::index_fetch(module_url, "HTTP 404"))
        }

        fn download_archive(&self, archive_url: &str) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(format!("download {}", archive_url));
            if self.fail_downloads {
                return Err(Error::Other("connection reset".to_string()));
            }
            Ok(make_zip("module.noscfg"))
        }
    }

    fn plugin(name: &str, url: &str, pin: Option<&str>) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.to_string(),
            module_type: "plugin".to_string(),
            url: url.to_string(),
            production_version: pin.map(String::from),
        }
    }

    fn release(name: &str, version: &str, major: u32) -> Release {
        Release {
            version: version.to_string(),
            url: format!("https://host/{}-{}.zip", name, version),
            plugin_api_version: Some(ApiVersion::new(major, 0, 0)),
            subsystem_api_version: None,
        }
    }

    fn api(plugin_major: u32) -> ApiVersions {
        ApiVersions {
            plugin: ApiVersion::new(plugin_major, 0, 0),
            subsystem: ApiVersion::new(1, 0, 0),
        }
    }

    fn manifest(json: &str) -> DistributionManifest {
        DistributionManifest::from_json(json).unwrap()
    }

    fn scenario_index(pin: Option<&str>) -> FakeIndex {
        let mut releases = HashMap::new();
        releases.insert(
            "r1".to_string(),
            vec![release("m1", "2.0", 2), release("m1", "1.0", 1)],
        );
        FakeIndex {
            index: vec![plugin("m1", "r1", pin)],
            releases,
            ..Default::default()
        }
    }

    const SCENARIO: &str =
        r#"[{"key": "A", "bundled_modules": ["m1"], "module_index_url": "u"}]"#;

    #[test]
    fn test_bundle_latest_compatible() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("Profile.json");
        let request = BundleRequest::new("A", api(2), temp.path().join("Module"), &profile);

        let report = bundle_modules(&manifest(SCENARIO), &request, &scenario_index(None)).unwrap();

        assert_eq!(report.resolved_modules(), vec![ResolvedModule::new("m1", "2.0")]);
        assert!(temp.path().join("Module/m1/2.0/module.noscfg").exists());
        let saved = Profile::load_or_default(&profile).unwrap();
        assert_eq!(
            saved.loaded_modules,
            vec![serde_json::json!({"name": "m1", "version": "2.0"})]
        );
    }

    #[test]
    fn test_bundle_older_api_major() {
        let temp = TempDir::new().unwrap();
        let request = BundleRequest::new(
            "A",
            api(1),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        let report = bundle_modules(&manifest(SCENARIO), &request, &scenario_index(None)).unwrap();
        assert_eq!(report.resolved_modules(), vec![ResolvedModule::new("m1", "1.0")]);
    }

    #[test]
    fn test_bundle_incompatible_pin_warns_and_falls_back() {
        let temp = TempDir::new().unwrap();
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        let report =
            bundle_modules(&manifest(SCENARIO), &request, &scenario_index(Some("1.0"))).unwrap();

        assert_eq!(report.resolved[0].module.version, "2.0");
        assert_eq!(
            report.resolved[0].warnings,
            vec![ResolveWarning::PinIncompatible {
                version: "1.0".to_string(),
                required_major: 2
            }]
        );
    }

    #[test]
    fn test_unknown_dist_key_does_nothing() {
        let temp = TempDir::new().unwrap();
        let index = scenario_index(None);
        let request = BundleRequest::new(
            "missing",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );

        let err = bundle_modules(&manifest(SCENARIO), &request, &index).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(index.calls.borrow().is_empty());
        assert!(!temp.path().join("Module").exists());
    }

    #[test]
    fn test_incompatible_module_skipped_others_continue() {
        let temp = TempDir::new().unwrap();
        let mut index = scenario_index(None);
        index.index.insert(0, plugin("old", "r0", None));
        index
            .releases
            .insert("r0".to_string(), vec![release("old", "0.1", 0)]);
        let dist = r#"[{"key": "A", "bundled_modules": ["m1", "old"], "module_index_url": "u"}]"#;
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );

        let report = bundle_modules(&manifest(dist), &request, &index).unwrap();
        assert_eq!(report.resolved_modules(), vec![ResolvedModule::new("m1", "2.0")]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "old");
    }

    #[test]
    fn test_modules_outside_distribution_not_fetched() {
        let temp = TempDir::new().unwrap();
        let mut index = scenario_index(None);
        index.index.push(plugin("other", "r9", None));
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );

        bundle_modules(&manifest(SCENARIO), &request, &index).unwrap();
        assert!(!index.calls.borrow().iter().any(|c| c.contains("r9")));
    }

    #[test]
    fn test_included_distribution_modules_bundled() {
        let temp = TempDir::new().unwrap();
        let mut index = scenario_index(None);
        index.index.push(plugin("cam", "rc", None));
        index
            .releases
            .insert("rc".to_string(), vec![release("cam", "1.2", 2)]);
        let dist = r#"[
            {"key": "base", "bundled_modules": ["m1"], "module_index_url": "u"},
            {"key": "A", "bundled_modules": ["cam"], "includes": ["base"], "module_index_url": "u"}
        ]"#;
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        let report = bundle_modules(&manifest(dist), &request, &index).unwrap();
        assert_eq!(
            report.resolved_modules(),
            vec![
                ResolvedModule::new("m1", "2.0"),
                ResolvedModule::new("cam", "1.2")
            ]
        );
    }

    #[test]
    fn test_includes_only_distribution_is_not_bundled() {
        let temp = TempDir::new().unwrap();
        let index = scenario_index(None);
        let dist = r#"[
            {"key": "base", "bundled_modules": ["m1"], "module_index_url": "u"},
            {"key": "A", "includes": ["base"], "module_index_url": "u"}
        ]"#;
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        let report = bundle_modules(&manifest(dist), &request, &index).unwrap();
        assert!(report.resolved.is_empty());
        assert!(index.calls.borrow().is_empty());
        assert!(!temp.path().join("Profile.json").exists());
    }

    #[test]
    fn test_unknown_module_type_skipped_without_fetching() {
        let temp = TempDir::new().unwrap();
        let mut index = scenario_index(None);
        let mut tool = plugin("tool", "rt", None);
        tool.module_type = "editor-extension".to_string();
        index.index.insert(0, tool);
        let dist = r#"[{"key": "A", "bundled_modules": ["m1", "tool"], "module_index_url": "u"}]"#;
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );

        let report = bundle_modules(&manifest(dist), &request, &index).unwrap();
        assert_eq!(report.resolved_modules(), vec![ResolvedModule::new("m1", "2.0")]);
        assert_eq!(report.skipped[0].name, "tool");
        assert!(!index.calls.borrow().iter().any(|c| c.contains("rt")));
    }

    #[test]
    fn test_local_cache_avoids_download() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("m1-2.0.zip"), make_zip("cached.noscfg")).unwrap();
        let dist = format!(
            r#"[{{"key": "A", "bundled_modules": ["m1"], "module_index_url": "u",
                 "local_modules_folder": "{}"}}]"#,
            cache.display().to_string().replace('\\', "/")
        );
        let index = scenario_index(None);
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );

        bundle_modules(&manifest(&dist), &request, &index).unwrap();

        assert!(temp.path().join("Module/m1/2.0/cached.noscfg").exists());
        assert!(!index.calls.borrow().iter().any(|c| c.starts_with("download")));
    }

    #[test]
    fn test_download_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut index = scenario_index(None);
        index.fail_downloads = true;
        let profile = temp.path().join("Profile.json");
        let request = BundleRequest::new("A", api(2), temp.path().join("Module"), &profile);

        let err = bundle_modules(&manifest(SCENARIO), &request, &index).unwrap_err();
        assert!(matches!(err, Error::Acquisition { .. }));
        assert!(!profile.exists());
    }

    #[test]
    fn test_release_fetch_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut index = scenario_index(None);
        index.releases.clear();
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        let err = bundle_modules(&manifest(SCENARIO), &request, &index).unwrap_err();
        assert!(matches!(err, Error::IndexFetch { .. }));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let index = scenario_index(None);
        let mut request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        request.dry_run = true;

        let report = bundle_modules(&manifest(SCENARIO), &request, &index).unwrap();
        assert_eq!(report.resolved[0].path, None);
        assert!(!temp.path().join("Module").exists());
        assert!(!temp.path().join("Profile.json").exists());
        assert!(!index.calls.borrow().iter().any(|c| c.starts_with("download")));
    }

    #[test]
    fn test_empty_distribution_skips_network() {
        let temp = TempDir::new().unwrap();
        let index = scenario_index(None);
        let request = BundleRequest::new(
            "E",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        let report = bundle_modules(
            &manifest(r#"[{"key": "E", "module_index_url": "u"}]"#),
            &request,
            &index,
        )
        .unwrap();
        assert!(report.resolved.is_empty());
        assert!(index.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_from_index_reported() {
        let temp = TempDir::new().unwrap();
        let dist = r#"[{"key": "A", "bundled_modules": ["m1", "ghost"], "module_index_url": "u"}]"#;
        let request = BundleRequest::new(
            "A",
            api(2),
            temp.path().join("Module"),
            temp.path().join("Profile.json"),
        );
        let report = bundle_modules(&manifest(dist), &request, &scenario_index(None)).unwrap();
        assert_eq!(report.not_in_index, vec!["ghost".to_string()]);
    }
}
