use anyhow::Result;
use enginedist::{DistributionManifest, Error, ReleaseVersion, SigningConfig};
use std::path::Path;

pub fn run(dist_key: Option<&str>, manifest_path: &Path, require_signing: bool) -> Result<()> {
    let version = ReleaseVersion::from_env();
    let signing = require_signing.then(SigningConfig::from_env).transpose();

    // Report every missing variable in one error
    let (version, signing) = match (version, signing) {
        (Ok(version), Ok(signing)) => (version, signing),
        (Err(Error::MissingConfig(mut missing)), Err(Error::MissingConfig(more))) => {
            missing.extend(more);
            return Err(Error::MissingConfig(missing).into());
        }
        (Err(e), _) | (_, Err(e)) => return Err(e.into()),
    };

    let bundled_key = match dist_key {
        Some(key) => {
            let manifest = DistributionManifest::load(manifest_path)?;
            let dist = manifest.find(key)?;
            dist.is_bundled().then_some(key)
        }
        None => None,
    };

    println!("Tag:          {}", version.tag());
    println!("Version:      {}", version.version());
    println!("SDK archive:  {}", version.sdk_archive_name());
    println!("Dist archive: {}", version.dist_archive_name(bundled_key));
    if let Some(signing) = signing {
        println!(
            "Signing:      {} ({})",
            signing.cert_name, signing.key_vault_url
        );
    }

    Ok(())
}
