//! Driver configuration loaded from TOML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use x50q_keyboard::DeviceConfig;

/// Contents of `config.toml`
///
/// ```toml
/// log_level = "info"
///
/// [device]
/// read_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    /// Used when neither RUST_LOG nor --log-level is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("write {}", path.display()))
    }
}

/// Path to the default configuration file.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn config_dir() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config).join("x50q")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config/x50q")
    } else {
        PathBuf::from("/tmp/x50q")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_device_section() {
        let config = AppConfig::from_toml(
            "log_level = \"debug\"\n[device]\nread_timeout_ms = 500\n",
        )
        .unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.device.read_timeout_ms, Some(500));
        assert_eq!(config.device.vendor_id, 0x24F0);
        assert_eq!(config.device.output_interface, 2);
    }

    #[test]
    fn test_wrong_value_type_is_error() {
        assert!(AppConfig::from_toml("[device]\nvendor_id = \"abc\"\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("x50q-config-{}", std::process::id()));
        let path = dir.join("nested/config.toml");
        let config = AppConfig {
            device: DeviceConfig {
                read_timeout_ms: Some(1500),
                ..DeviceConfig::default()
            },
            log_level: Some("info".into()),
        };

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("x50q-does-not-exist/config.toml");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }
}
