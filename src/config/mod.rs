// Configuration module for sensor-recorder
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
///
/// A missing file yields the built-in defaults when `required` is false.
pub fn load_config_with_env<P: AsRef<Path>>(path: P, required: bool) -> Result<RecorderConfig> {
    let mut config = if required || path.as_ref().exists() {
        load_config(path)?
    } else {
        RecorderConfig::default()
    };

    // Allow environment variables to override config values
    if let Ok(data_dir) = std::env::var("SENSOR_RECORDER_DATA_DIR") {
        config.storage.filesystem.base_path = data_dir;
    }

    if let Ok(level) = std::env::var("SENSOR_RECORDER_LOG_LEVEL") {
        config.logging.level = level;
    }

    ConfigLoader::validate(&config)?;

    Ok(config)
}

/// Point the filesystem store at `data_dir`, re-validating the result
pub fn override_data_dir(config: &mut RecorderConfig, data_dir: String) -> Result<()> {
    config.storage.filesystem.base_path = data_dir;
    ConfigLoader::validate(config).context("Invalid --data-dir")
}
