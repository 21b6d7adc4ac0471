use anyhow::Result;
use enginedist::DistributionManifest;
use std::path::Path;

pub fn run(dist_key: &str, manifest_path: &Path) -> Result<()> {
    let manifest = DistributionManifest::load(manifest_path)?;
    let dist = manifest.find(dist_key)?;
    let modules = manifest.effective_bundled_modules(dist);

    if modules.is_empty() {
        println!("Distribution '{}' bundles no modules.", dist_key);
        return Ok(());
    }

    println!("Modules bundled by '{}':", dist_key);
    for name in &modules {
        let origin = if dist.bundled_modules.contains(name) {
            String::new()
        } else {
            let from: Vec<&str> = dist
                .includes
                .iter()
                .filter(|key| {
                    manifest
                        .find(key)
                        .map(|other| other.bundled_modules.contains(name))
                        .unwrap_or(false)
                })
                .map(String::as_str)
                .collect();
            format!(" (from {})", from.join(", "))
        };
        println!("  {}{}", name, origin);
    }
    println!();
    println!(
        "Total: {} module{}",
        modules.len(),
        if modules.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
