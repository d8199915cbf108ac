//! Configuration management for nw-miner

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT: &str = "out";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker pool cap
    pub jobs: Option<usize>,
    /// Default output directory
    pub output: Option<PathBuf>,
    /// Extensions extracted wholesale during the datasheet phase
    pub bulk_extensions: Vec<String>,
    pub keep_datasheets: bool,
    pub oodle: OodleConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OodleConfig {
    /// Helper command for the exec backend
    pub exec: Option<String>,
    /// Path to the Oodle DLL for the native backend
    pub dll: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: None,
            output: None,
            bulk_extensions: vec!["datasheet".to_string(), "xml".to_string()],
            keep_datasheets: false,
            oodle: OodleConfig::default(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("nw-miner");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if there is no file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Output directory: explicit value, then config, then `./out`
    pub fn output_dir(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| self.output.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    /// Worker count: explicit value, then config, then available parallelism
    pub fn jobs(&self, explicit: Option<usize>) -> usize {
        explicit
            .or(self.jobs)
            .filter(|&n| n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, |n| n.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bulk_extensions, vec!["datasheet", "xml"]);
        assert!(!config.keep_datasheets);
        assert_eq!(config.output_dir(None), PathBuf::from("out"));
        assert!(config.jobs(None) >= 1);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.jobs = Some(8);
        config.output = Some(PathBuf::from("/data/nw"));
        config.oodle.exec = Some("wine oodle_helper.exe".to_string());
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "keep_datasheets = true\n[oodle]\ndll = \"oo2core_8_win64.dll\"\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.keep_datasheets);
        assert_eq!(config.bulk_extensions, vec!["datasheet", "xml"]);
        assert_eq!(config.oodle.dll, Some(PathBuf::from("oo2core_8_win64.dll")));
        assert_eq!(config.oodle.exec, None);
    }

    #[test]
    fn test_explicit_values_win() {
        let mut config = Config::default();
        config.jobs = Some(3);
        config.output = Some(PathBuf::from("configured"));

        assert_eq!(config.jobs(None), 3);
        assert_eq!(config.jobs(Some(5)), 5);
        assert_eq!(config.output_dir(Some(PathBuf::from("cli"))), PathBuf::from("cli"));
        assert_eq!(config.output_dir(None), PathBuf::from("configured"));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "jobs = \"many\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
