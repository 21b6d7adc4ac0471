use anyhow::Result;
use enginedist::{update_engine_settings, DistributionManifest};
use std::path::Path;

pub fn run(dist_key: &str, settings_path: &Path, manifest_path: &Path) -> Result<()> {
    let manifest = DistributionManifest::load(manifest_path)?;
    let dist = manifest.find(dist_key)?;

    update_engine_settings(settings_path, dist)?;

    println!("Updated {}", settings_path.display());
    println!("  Module index: {}", dist.module_index_url);
    if let Some(engine_index_url) = &dist.engine_index_url {
        println!("  Engine index: {}", engine_index_url);
    }

    Ok(())
}
