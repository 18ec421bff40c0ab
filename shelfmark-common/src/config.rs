//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Settings read from the optional TOML config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub data_dir: Option<String>,
    pub bind: Option<String>,
    pub storage_base_url: Option<String>,
    pub recognition_base_url: Option<String>,
    pub recognition_api_key: Option<String>,
    pub identity_base_url: Option<String>,
}

impl TomlConfig {
    /// Load from the platform config path; a missing file yields defaults
    pub fn load() -> Self {
        match config_file_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to load config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Default configuration file path: `<config dir>/shelfmark/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shelfmark").join("config.toml"))
}

/// Resolve the data folder following the priority order:
/// 1. Command-line argument (highest priority)
/// 2. `SHELFMARK_DATA` environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("SHELFMARK_DATA") {
        return PathBuf::from(path);
    }

    if let Some(path) = &toml_config.data_dir {
        return PathBuf::from(path);
    }

    default_data_dir()
}

/// OS-dependent default data folder
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shelfmark"))
        .unwrap_or_else(|| PathBuf::from("./shelfmark_data"))
}

/// Database file path inside the data folder
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("shelfmark.db")
}

/// Create the data folder if missing
pub fn ensure_data_dir(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
    }
    Ok(())
}

/// Resolve a single string setting with ENV -> TOML -> default priority.
///
/// Warns when the setting appears in more than one source (potential
/// misconfiguration); the environment variable wins.
pub fn resolve_setting(env_var: &str, toml_value: Option<&str>, default: &str) -> String {
    let env_value = std::env::var(env_var).ok().filter(|v| !v.trim().is_empty());
    let toml_value = toml_value.filter(|v| !v.trim().is_empty());

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} set in both environment and TOML config; using environment value",
            env_var
        );
    }

    if let Some(value) = env_value {
        return value;
    }
    if let Some(value) = toml_value {
        return value.to_string();
    }
    default.to_string()
}
