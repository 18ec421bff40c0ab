//! Service configuration
//!
//! Assembled from CLI arguments, environment variables, the TOML config
//! file, and compiled defaults, in that priority order.

use clap::Parser;
use shelfmark_common::config::{resolve_data_dir, resolve_setting, TomlConfig};
use std::path::PathBuf;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:5810";

const DEFAULT_STORAGE_URL: &str = "http://127.0.0.1:9000";
const DEFAULT_RECOGNITION_URL: &str = "http://127.0.0.1:9010";
const DEFAULT_IDENTITY_URL: &str = "http://127.0.0.1:9020";

/// Command-line arguments
#[derive(Debug, Default, Parser)]
#[command(name = "shelfmark-web", about = "Shelfmark book-tracking service")]
pub struct Cli {
    /// Data folder (database location)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Bind address, host:port
    #[arg(long, env = "SHELFMARK_BIND")]
    pub bind: Option<String>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub bind: String,
    pub storage_base_url: String,
    pub recognition_base_url: String,
    pub recognition_api_key: Option<String>,
    pub identity_base_url: String,
}

impl ServiceConfig {
    /// Load configuration using the platform TOML file
    pub fn load(cli: &Cli) -> Self {
        let toml_config = TomlConfig::load();
        Self::from_sources(cli, &toml_config)
    }

    /// Assemble configuration from explicit sources
    pub fn from_sources(cli: &Cli, toml_config: &TomlConfig) -> Self {
        let data_dir = resolve_data_dir(cli.data_dir.as_deref(), toml_config);

        let bind = cli
            .bind
            .clone()
            .or_else(|| toml_config.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let storage_base_url = resolve_setting(
            "SHELFMARK_STORAGE_URL",
            toml_config.storage_base_url.as_deref(),
            DEFAULT_STORAGE_URL,
        );
        let recognition_base_url = resolve_setting(
            "SHELFMARK_RECOGNITION_URL",
            toml_config.recognition_base_url.as_deref(),
            DEFAULT_RECOGNITION_URL,
        );
        let identity_base_url = resolve_setting(
            "SHELFMARK_IDENTITY_URL",
            toml_config.identity_base_url.as_deref(),
            DEFAULT_IDENTITY_URL,
        );

        // Optional; recognition requests go out without a key when unset
        let recognition_api_key = std::env::var("SHELFMARK_RECOGNITION_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| toml_config.recognition_api_key.clone());

        Self {
            data_dir,
            bind,
            storage_base_url,
            recognition_base_url,
            recognition_api_key,
            identity_base_url,
        }
    }
}
