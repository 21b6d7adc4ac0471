//! Module archive acquisition and extraction
//!
//! A resolved release is materialized at `<target_dir>/<module>/<version>/`.
//! Archives are taken from the distribution's local module folder when a
//! file with the same name exists there; only otherwise is the network used.
//!
//! Extraction overwrites whatever is already at the target path and is not
//! rolled back on failure.
//!
//! # Examples
//!
//! ```no_run
//! use enginedist::{acquire, HttpModuleIndex, Release};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let release = Release {
//!     version: "1.0.0".into(),
//!     url: "https://example.com/m1-1.0.0.zip".into(),
//!     plugin_api_version: None,
//!     subsystem_api_version: None,
//! };
//! let path = acquire("m1", &release, None, Path::new("Module"), &HttpModuleIndex::new())?;
//! println!("Extracted to: {:?}", path);
//! # Ok(())
//! # }
//! ```

use crate::{Error, ModuleSource, Release, Result};
use log::info;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Deterministic extraction directory for a module release
pub fn module_install_dir(target_dir: &Path, module_name: &str, version: &str) -> PathBuf {
    target_dir.join(module_name).join(version)
}

/// Path of a cached archive for `release`, if the local folder has one
pub fn find_cached_archive(local_modules_folder: &Path, release: &Release) -> Option<PathBuf> {
    let candidate = local_modules_folder.join(release.archive_file_name());
    candidate.is_file().then_some(candidate)
}

/// Obtain and extract a resolved release
///
/// The local folder is consulted before any network access. Any failure is
/// reported as [`Error::Acquisition`].
pub fn acquire(
    module_name: &str,
    release: &Release,
    local_modules_folder: Option<&Path>,
    target_dir: &Path,
    source: &dyn ModuleSource,
) -> Result<PathBuf> {
    let dest = module_install_dir(target_dir, module_name, &release.version);
    let fail = |e: Error| Error::acquisition(module_name, &release.version, e);

    if let Some(cached) = local_modules_folder.and_then(|dir| find_cached_archive(dir, release)) {
        info!(
            "Found {}-{} in {}",
            module_name,
            release.version,
            cached.parent().unwrap_or(cached.as_path()).display()
        );
        let file = File::open(&cached).map_err(|e| fail(e.into()))?;
        extract_archive(file, &dest).map_err(fail)?;
        return Ok(dest);
    }

    info!(
        "Downloading {}:{} from {}",
        module_name, release.version, release.url
    );
    let bytes = source.download_archive(&release.url).map_err(fail)?;
    extract_archive(Cursor::new(bytes), &dest).map_err(fail)?;

    Ok(dest)
}

/// Extract every entry of a zip archive below `dest`
///
/// Entries whose paths would escape `dest` are rejected.
pub fn extract_archive<R: Read + Seek>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(reader)?;
    fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry.enclosed_name().ok_or_else(|| {
            Error::Other(format!("Archive entry '{}' has an unsafe path", entry.name()))
        })?;
        let outpath = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;
    }

    Ok(())
}
