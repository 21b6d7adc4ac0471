//! Engine settings (`EngineSettings.json`) patching
//!
//! Points a packaged engine at the distribution's module index and, when the
//! distribution declares one, its engine index. Unrelated keys are kept.

use crate::{DistributionConfig, Error, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Apply the distribution's index URLs to a settings document
pub fn apply_distribution(settings: &mut Value, dist: &DistributionConfig) -> Result<()> {
    let object = settings
        .as_object_mut()
        .ok_or_else(|| Error::Other("Engine settings must be a JSON object".to_string()))?;

    object.insert(
        "remote_modules".to_string(),
        json!([{ "url": dist.module_index_url }]),
    );
    if let Some(engine_index_url) = &dist.engine_index_url {
        object.insert("engine_index_url".to_string(), json!(engine_index_url));
    }
    Ok(())
}

/// Read-modify-write the engine settings file at `path`
pub fn update_engine_settings<P: AsRef<Path>>(path: P, dist: &DistributionConfig) -> Result<Value> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::Other(format!(
            "Failed to read engine settings {}: {}",
            path.display(),
            e
        ))
    })?;
    let mut settings: Value = serde_json::from_str(&contents)?;
    apply_distribution(&mut settings, dist)?;
    fs::write(path, serde_json::to_string_pretty(&settings)?)?;
    Ok(settings)
}
