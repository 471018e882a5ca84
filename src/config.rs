//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use anyhow::Context as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings key the bitrate list is stored under unless configured otherwise.
pub const DEFAULT_SETTINGS_KEY: &str = "baikalos_sbc_bitrate";

/// sbc-rates configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory path.
    pub data_dir: PathBuf,

    /// Settings key holding the serialized bitrate list.
    pub settings_key: String,
}

/// On-disk TOML shape. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlConfig {
    data_dir: Option<PathBuf>,
    settings_key: Option<String>,
}

impl Config {
    /// Default data directory (`<platform data dir>/sbc-rates`).
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("sbc-rates"))
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    /// Load configuration from environment.
    pub fn load() -> Result<Self> {
        let data_dir = std::env::var_os("SBC_RATES_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);
        let settings_key = std::env::var("SBC_RATES_SETTINGS_KEY")
            .unwrap_or_else(|_| DEFAULT_SETTINGS_KEY.into());

        Self::build(data_dir, settings_key)
    }

    /// Load from a specific TOML config file. Missing fields fall back to defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Load {
            path: path.display().to_string(),
            source: Arc::new(error),
        })?;
        let parsed: TomlConfig = toml::from_str(&content)
            .map_err(|error| ConfigError::Invalid(format!("{}: {error}", path.display())))?;

        Self::build(
            parsed.data_dir.unwrap_or_else(Self::default_data_dir),
            parsed
                .settings_key
                .unwrap_or_else(|| DEFAULT_SETTINGS_KEY.into()),
        )
    }

    fn build(data_dir: PathBuf, settings_key: String) -> Result<Self> {
        if settings_key.trim().is_empty() {
            return Err(ConfigError::Invalid("settings_key must not be empty".into()).into());
        }

        // Ensure data directory exists
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

        Ok(Self {
            data_dir,
            settings_key,
        })
    }

    /// Get the redb settings path.
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.redb")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use indoc::formatdoc;

    #[test]
    fn loads_toml_and_creates_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let data_dir = dir.path().join("state");
        let config_path = dir.path().join("sbc-rates.toml");
        std::fs::write(
            &config_path,
            formatdoc! {r#"
                data_dir = "{}"
                settings_key = "custom_sbc_key"
            "#, data_dir.display()},
        )
        .expect("config file should be written");

        let config = Config::load_from_path(&config_path).expect("config should load");

        assert_eq!(config.settings_key, "custom_sbc_key");
        assert!(data_dir.is_dir());
        assert_eq!(config.settings_path(), data_dir.join("settings.redb"));
    }

    #[test]
    fn missing_key_uses_default() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config_path = dir.path().join("sbc-rates.toml");
        std::fs::write(
            &config_path,
            format!("data_dir = \"{}\"\n", dir.path().display()),
        )
        .expect("config file should be written");

        let config = Config::load_from_path(&config_path).expect("config should load");
        assert_eq!(config.settings_key, DEFAULT_SETTINGS_KEY);
    }

    #[test]
    fn rejects_empty_key_and_unknown_fields() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config_path = dir.path().join("sbc-rates.toml");

        std::fs::write(
            &config_path,
            format!("data_dir = \"{}\"\nsettings_key = \" \"\n", dir.path().display()),
        )
        .expect("config file should be written");
        let error = Config::load_from_path(&config_path).expect_err("empty key must fail");
        assert!(matches!(error, Error::Config(ConfigError::Invalid(_))));

        std::fs::write(&config_path, "bitrate = 328\n").expect("config file should be written");
        let error = Config::load_from_path(&config_path).expect_err("unknown field must fail");
        assert!(matches!(error, Error::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let error = Config::load_from_path(&dir.path().join("absent.toml"))
            .expect_err("missing file must fail");

        assert!(matches!(error, Error::Config(ConfigError::Load { .. })));
    }
}
