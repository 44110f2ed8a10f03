use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_search_url() -> String {
    "https://images-api.nasa.gov/search".to_string()
}

fn default_media_type() -> String {
    "image".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            search_url: default_search_url(),
            media_type: default_media_type(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 1000,
            height: 900,
            min_width: 500,
            min_height: 500,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            return Config::default();
        }

        match Self::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}. Using defaults.", e);
                Config::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Error parsing {}", path.display()))
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/nasa-viewer")
        } else {
            PathBuf::from(".")
        }
    }
}
