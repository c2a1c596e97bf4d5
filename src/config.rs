use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::MarkerError;
use crate::phylopic::{DEFAULT_API_BASE_URL, DEFAULT_IMAGE_BASE_URL};

pub const DEFAULT_CONFIG_FILE: &str = "species-marker.json";
pub const DEFAULT_OUTPUT_DIR: &str = "files";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub image_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: Utf8PathBuf,
    pub api_base_url: String,
    pub image_base_url: String,
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads settings from `path`, or from `species-marker.json` in the
    /// current directory when no path is given. The default file is optional.
    pub fn resolve(path: Option<&str>) -> Result<Settings, MarkerError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MarkerError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| MarkerError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> Settings {
        Settings {
            output_dir: Utf8PathBuf::from(
                config
                    .output_dir
                    .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            api_base_url: config
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            image_base_url: config
                .image_base_url
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
            timeout_secs: config.timeout_secs,
            user_agent: config.user_agent.unwrap_or_else(default_user_agent),
        }
    }
}

pub fn default_user_agent() -> String {
    format!("species-marker/{}", env!("CARGO_PKG_VERSION"))
}
