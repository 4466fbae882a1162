// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];
const MIN_FRAME_BYTES: usize = 16;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        Self::parse(&content)
    }

    /// Parse YAML text, substituting environment variables and validating
    pub fn parse(content: &str) -> Result<RecorderConfig> {
        let content = Self::substitute_env_vars(content)?;

        // An empty document means "all defaults"
        let config: RecorderConfig = if content.trim().is_empty() {
            RecorderConfig::default()
        } else {
            serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?
        };

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${DATA_DIR:-/var/lib/sensors} -> /var/lib/sensors (if DATA_DIR not set)
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}")
            .context("Invalid env substitution pattern")?;

        Ok(re
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                let default_value = caps.get(2).map(|m| m.as_str());

                match std::env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => match default_value {
                        Some(default) => default.to_string(),
                        // Keep original if no default and var not found
                        None => format!("${{{}}}", var_name),
                    },
                }
            })
            .to_string())
    }

    /// Validate configuration
    pub(crate) fn validate(config: &RecorderConfig) -> Result<()> {
        config.server.socket_addr(0)?;

        if config.server.max_frame_bytes < MIN_FRAME_BYTES {
            bail!("server.max_frame_bytes must be >= {}", MIN_FRAME_BYTES);
        }

        match config.storage.backend.as_str() {
            "filesystem" => {
                let fs = &config.storage.filesystem;
                if fs.base_path.is_empty() {
                    bail!("storage.filesystem.base_path cannot be empty");
                }
                if fs.file_extension.is_empty()
                    || fs.file_extension.contains(&['.', '/', '\\'][..])
                {
                    bail!(
                        "storage.filesystem.file_extension '{}' must be a bare extension",
                        fs.file_extension
                    );
                }
            }
            "memory" => {}
            unknown => bail!("Unknown backend: '{}'. Supported: filesystem, memory", unknown),
        }

        if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
            bail!(
                "logging.level '{}' must be one of {:?}",
                config.logging.level,
                LOG_LEVELS
            );
        }

        if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
            bail!(
                "logging.format '{}' must be one of {:?}",
                config.logging.format,
                LOG_FORMATS
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::TimestampZone;

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SR_TEST_VAR", "test_value");

        let input = "base_path: ${SR_TEST_VAR}";
        let output = ConfigLoader::substitute_env_vars(input).unwrap();
        assert_eq!(output, "base_path: test_value");

        std::env::remove_var("SR_TEST_VAR");
    }

    #[test]
    fn test_env_var_with_default() {
        std::env::remove_var("SR_TEST_VAR2");

        let input = "base_path: ${SR_TEST_VAR2:-/tmp/sensors}";
        let output = ConfigLoader::substitute_env_vars(input).unwrap();
        assert_eq!(output, "base_path: /tmp/sensors");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config.server.max_frame_bytes, 1024);
        assert_eq!(config.storage.backend, "filesystem");
        assert_eq!(config.protocol.timezone, TimestampZone::Utc);
        assert_eq!(config.protocol.registration, RegistrationPolicy::Eager);
    }

    #[test]
    fn test_validation_small_frame_limit() {
        let mut config = RecorderConfig::default();
        config.server.max_frame_bytes = 4;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_frame_bytes"));
    }

    #[test]
    fn test_validation_bind_address_must_be_ip() {
        let mut config = RecorderConfig::default();
        config.server.bind_address = "localhost".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.unwrap_err().to_string().contains("bind_address"));
    }

    #[test]
    fn test_validation_bad_extension() {
        let mut config = RecorderConfig::default();
        config.storage.filesystem.file_extension = ".dat".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.unwrap_err().to_string().contains("file_extension"));
    }

    #[test]
    fn test_validation_unknown_log_format() {
        let mut config = RecorderConfig::default();
        config.logging.format = "xml".to_string();

        assert!(ConfigLoader::validate(&config).is_err());
    }
}
