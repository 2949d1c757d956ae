//! Configuration management for chardev.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values
//!
//! The buffer capacity is a compile-time constant and is deliberately
//! not configurable.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::Args;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device configuration.
    pub device: DeviceSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Device configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Name of the device; the node is exposed at `/dev/<name>`.
    pub name: String,
    /// Name of the device class.
    pub class: String,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            name: "chardev".to_string(),
            class: "char_class".to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("CHARDEV_DEVICE_NAME") {
            if !name.is_empty() {
                self.device.name = name;
            }
        }

        if let Ok(class) = std::env::var("CHARDEV_CLASS_NAME") {
            if !class.is_empty() {
                self.device.class = class;
            }
        }

        if let Ok(level) = std::env::var("CHARDEV_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref name) = args.device_name {
            self.device.name = name.clone();
        }

        if let Some(ref class) = args.class_name {
            self.device.class = class.clone();
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env();

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        config.validate()?;
        Ok(config)
    }

    /// Check that the configured names can form a node path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [&self.device.name, &self.device.class] {
            if name.is_empty() || name.contains('/') || name.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidName(name.clone()));
            }
        }
        Ok(())
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Device or class name unusable in a node path.
    InvalidName(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidName(name) => write!(f, "invalid device or class name: '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.name, "chardev");
        assert_eq!(config.device.class, "char_class");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "device": {
                "name": "mydev",
                "class": "my_class"
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.device.name, "mydev");
        assert_eq!(config.device.class, "my_class");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{
            "device": {
                "name": "mydev"
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.device.name, "mydev");
        assert_eq!(config.device.class, "char_class"); // Default
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            device_name: Some("ttyfoo".to_string()),
            log_level: Some("trace".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.device.name, "ttyfoo");
        assert_eq!(config.device.class, "char_class");
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let mut config = Config::default();
        config.device.name = "bad/name".to_string();
        assert!(config.validate().is_err());

        config.device.name = "".to_string();
        assert!(config.validate().is_err());

        config.device.name = "has space".to_string();
        assert!(config.validate().is_err());

        config.device.name = "fine-name".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"name\""));
        assert!(json.contains("\"class\""));
    }
}
