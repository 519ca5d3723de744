//! Configuration Storage
//!
//! This module handles persistent storage of configuration data
//! including API keys and model settings.

use crate::error::{RecordForgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Persistent configuration data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API keys for LLM providers
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Model configurations for each provider
    #[serde(default = "Config::default_models")]
    pub models: HashMap<String, String>,
    /// Current selected provider
    pub current_provider: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: HashMap::new(),
            models: Self::default_models(),
            current_provider: None,
        }
    }
}

impl Config {
    /// Get default models for each provider
    pub fn default_models() -> HashMap<String, String> {
        let mut models = HashMap::new();
        models.insert("openai".to_string(), "gpt-4o".to_string());
        models
    }

    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the configuration directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                RecordForgeError::Config("Could not find configuration directory".to_string())
            })?
            .join("record-forge");

        fs::create_dir_all(&config_dir).map_err(|e| {
            RecordForgeError::Config(format!("Failed to create config directory: {}", e))
        })?;

        Ok(config_dir)
    }

    /// Get the configuration file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    /// Load configuration from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| RecordForgeError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RecordForgeError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = Config::new();
        assert_eq!(config.models.get("openai").map(String::as_str), Some("gpt-4o"));
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_model_override_serializes() {
        let mut config = Config::new();
        config
            .models
            .insert("openai".to_string(), "gpt-4o-mini".to_string());

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.models.get("openai").map(String::as_str), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "record-forge-config-{}.toml",
            std::process::id()
        ));

        let mut config = Config::new();
        config
            .api_keys
            .insert("openai".to_string(), "sk-test".to_string());
        config.current_provider = Some("openai".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("record-forge-does-not-exist.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::new());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("current_provider = \"openai\"").unwrap();
        assert_eq!(config.models.get("openai").map(String::as_str), Some("gpt-4o"));
        assert!(config.api_keys.is_empty());
    }
}
