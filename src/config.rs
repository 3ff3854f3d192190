//! Configuration file support for drama-tracker.
//!
//! This module provides functionality for loading and saving user preferences
//! from a TOML configuration file.

use crate::types::Weekday;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// User configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Weekday preselected in the add-show form
    #[serde(default = "default_weekday")]
    pub default_weekday: Weekday,

    /// Broadcast time preselected in the add-show form
    #[serde(default = "default_time")]
    pub default_time: String,

    /// Key the show list is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory for stored data (overrides platform default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Sign-in settings
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Authentication settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Firebase Web API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// E-mail addresses allowed to use the tracker
    #[serde(default)]
    pub allowed_emails: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_weekday() -> Weekday {
    Weekday::Mon
}

fn default_time() -> String {
    "21:00".to_string()
}

fn default_storage_key() -> String {
    "dramas".to_string()
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            default_weekday: default_weekday(),
            default_time: default_time(),
            storage_key: default_storage_key(),
            data_dir: None,
            auth: AuthConfig::default(),
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/drama-tracker/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("drama-tracker");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> crate::error::Result<Self> {
        let path = Self::get_config_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path`, falling back to defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to `path`.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Create a default config file if one doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn create_default_if_missing() -> crate::error::Result<PathBuf> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            Self::new().save_to(&path)?;
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_defaults() {
        let config = Config::new();
        assert_eq!(config.default_weekday, Weekday::Mon);
        assert_eq!(config.default_time, "21:00");
        assert_eq!(config.storage_key, "dramas");
        assert!(config.data_dir.is_none());
        assert!(config.auth.api_key.is_none());
        assert!(config.auth.allowed_emails.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::new();
        config.default_weekday = Weekday::Fri;
        config.auth.allowed_emails = vec!["me@example.com".to_string()];

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("default_weekday"));
        assert!(toml_str.contains("storage_key = \"dramas\""));
        assert!(toml_str.contains("[auth]"));
        assert!(toml_str.contains("me@example.com"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_weekday, Weekday::Fri);
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            default_weekday = "水"
            default_time = "22:00"
            data_dir = "/tmp/dramas"

            [auth]
            api_key = "abc"
            allowed_emails = ["a@example.com", "b@example.com"]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_weekday, Weekday::Wed);
        assert_eq!(config.default_time, "22:00");
        assert_eq!(config.data_dir.as_deref(), Some("/tmp/dramas"));
        assert_eq!(config.auth.api_key.as_deref(), Some("abc"));
        assert_eq!(config.auth.allowed_emails.len(), 2);
    }

    #[test]
    fn test_config_partial_deserialization() {
        // Only specify some fields, rest should use defaults
        let toml_str = r#"
            default_time = "23:15"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_time, "23:15");
        assert_eq!(config.default_weekday, Weekday::Mon); // default
        assert_eq!(config.storage_key, "dramas"); // default
    }

    #[test]
    fn test_load_from_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("drama-tracker-no-such-dir/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage_key, "dramas");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("drama-tracker-cfg-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let mut config = Config::new();
        config.default_time = "20:45".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_time, "20:45");

        fs::remove_dir_all(dir).unwrap();
    }
}
