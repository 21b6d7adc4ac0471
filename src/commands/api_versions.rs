use anyhow::Result;
use enginedist::{ApiVersions, EngineHeaders};
use std::path::Path;

pub fn run(engine_folder: &Path) -> Result<()> {
    let versions = ApiVersions::from_engine(engine_folder, &EngineHeaders::default())?;

    println!("Plugin API:    {}", versions.plugin);
    println!("Subsystem API: {}", versions.subsystem);

    Ok(())
}
