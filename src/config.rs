use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::render::Provider;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings read from `config.toml`. Every key is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where `contracts.json` and its backups live
    pub data_dir: PathBuf,
    /// Signable URLs are `<signing_base_url>/<contract id>`
    pub signing_base_url: String,
    /// Copied on every signing notification
    pub owner_email: String,
    pub provider_name: String,
    pub provider_location: String,
    /// Delay before a notification is dispatched
    pub notification_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let provider = Provider::default();
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ctr"),
            signing_base_url: "https://contracts.elgatoai.com/sign".to_string(),
            owner_email: provider.email,
            provider_name: provider.name,
            provider_location: provider.location,
            notification_delay_ms: 1000,
        }
    }
}

impl Config {
    /// `CTR_CONFIG` overrides the file location and `CTR_DATA_DIR` the data
    /// directory. A missing or empty file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("CTR_CONFIG")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join("ctr").join("config.toml")));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(data_dir) = std::env::var_os("CTR_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(content)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("contracts.json")
    }

    pub fn provider(&self) -> Provider {
        Provider {
            name: self.provider_name.clone(),
            location: self.provider_location.clone(),
            email: self.owner_email.clone(),
        }
    }
}
