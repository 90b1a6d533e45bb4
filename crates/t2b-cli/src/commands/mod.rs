pub mod files;
pub mod resolve;
pub mod transform;

use std::path::PathBuf;
use t2b_metadata::config::CONFIG_PATH_PROPERTY;
use t2b_metadata::SystemProperties;

/// Build system properties from `-D` assignments plus an explicit config path
pub fn system_properties(define: Vec<String>, config: Option<PathBuf>) -> anyhow::Result<SystemProperties> {
    let mut properties = SystemProperties::from_assignments(define)?;
    if let Some(config) = config {
        properties.set(CONFIG_PATH_PROPERTY, config.to_string_lossy());
    }
    Ok(properties)
}
